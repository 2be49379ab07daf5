//! Tradelens Connect - broker providers and sync orchestration.
//!
//! This crate resolves a connection's provider from the registry, pulls its
//! trades and merges them into the trade store by external id.

#[cfg(feature = "broker")]
pub mod broker;

// Re-export commonly used types
#[cfg(feature = "broker")]
pub use broker::{
    provider_factory, AccountInfo, BrokerCredentials, BrokerProvider, CredentialField, FieldType,
    NormalizedTrade, Platform, ProviderDescriptor, ProviderFactory, ProviderRegistry, SyncConfig,
    SyncService, SyncServiceTrait,
};
