//! Broker module - provider integrations and trade sync orchestration.

pub mod mapping;
mod models;
pub mod providers;
mod registry;
mod service;
mod traits;


pub use models::*;
pub use providers::{
    FintokeiProvider, FtmoProvider, LucidTradingProvider, TopstepProvider, TradeifyProvider,
};
pub use registry::{provider_factory, ProviderFactory, ProviderRegistry};
pub use service::{SyncConfig, SyncService};
pub use traits::*;
