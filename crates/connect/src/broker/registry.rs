//! Lookup table from provider kind to provider constructor.

use std::collections::HashMap;
use std::sync::Arc;

use super::models::{BrokerCredentials, ProviderDescriptor};
use super::providers::{
    FintokeiProvider, FtmoProvider, LucidTradingProvider, TopstepProvider, TradeifyProvider,
};
use super::traits::BrokerProvider;
use tradelens_core::connections::ProviderKind;
use tradelens_core::errors::{Error, Result};

/// Builds a provider bound to one connection's credentials.
pub type ProviderFactory = Arc<dyn Fn(BrokerCredentials) -> Arc<dyn BrokerProvider> + Send + Sync>;

/// Wraps a provider constructor into a [`ProviderFactory`].
pub fn provider_factory<P, F>(build: F) -> ProviderFactory
where
    P: BrokerProvider + 'static,
    F: Fn(BrokerCredentials) -> P + Send + Sync + 'static,
{
    Arc::new(move |credentials: BrokerCredentials| -> Arc<dyn BrokerProvider> {
        Arc::new(build(credentials))
    })
}

struct RegisteredProvider {
    descriptor: ProviderDescriptor,
    factory: ProviderFactory,
}

#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, RegisteredProvider>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the five built-in brokers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            FtmoProvider::descriptor(),
            provider_factory(FtmoProvider::new),
        );
        registry.register(
            FintokeiProvider::descriptor(),
            provider_factory(FintokeiProvider::new),
        );
        registry.register(
            TopstepProvider::descriptor(),
            provider_factory(TopstepProvider::new),
        );
        registry.register(
            TradeifyProvider::descriptor(),
            provider_factory(TradeifyProvider::new),
        );
        registry.register(
            LucidTradingProvider::descriptor(),
            provider_factory(LucidTradingProvider::new),
        );
        registry
    }

    /// Adds or replaces the provider for `descriptor.provider`.
    pub fn register(&mut self, descriptor: ProviderDescriptor, factory: ProviderFactory) {
        self.providers.insert(
            descriptor.provider,
            RegisteredProvider {
                descriptor,
                factory,
            },
        );
    }

    pub fn resolve(
        &self,
        kind: ProviderKind,
        credentials: BrokerCredentials,
    ) -> Result<Arc<dyn BrokerProvider>> {
        self.providers
            .get(&kind)
            .map(|entry| (entry.factory)(credentials))
            .ok_or_else(|| Error::ProviderUnsupported(kind.to_string()))
    }

    pub fn descriptor(&self, kind: ProviderKind) -> Result<ProviderDescriptor> {
        self.providers
            .get(&kind)
            .map(|entry| entry.descriptor.clone())
            .ok_or_else(|| Error::ProviderUnsupported(kind.to_string()))
    }

    /// Descriptors of every registered provider, in [`ProviderKind::ALL`] order.
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        ProviderKind::ALL
            .iter()
            .filter_map(|kind| self.providers.get(kind))
            .map(|entry| entry.descriptor.clone())
            .collect()
    }
}
