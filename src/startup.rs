//! Startup and shutdown of the secrets subsystem.
//!
//! [`SecretsContext`] is built once when the process starts and handed to
//! every consumer. It owns the cache registry, so [`SecretsContext::shutdown`]
//! is the single place caches are released.

use crate::cache::CacheRegistry;
use crate::config::{ConfigLookup, SecretStoreConfig, Settings};
use crate::errors::Result;
use crate::secrets::{CredentialExchange, SecretService};
use std::sync::Arc;
use tracing::info;

/// Process-wide handle to the cache registry and the secret service.
#[derive(Debug)]
pub struct SecretsContext {
    settings: Arc<Settings>,
    registry: CacheRegistry,
    secrets: Arc<SecretService>,
}

impl SecretsContext {
    /// Validate `store_config` and build the caches and the secret service.
    pub fn initialize(settings: Settings, store_config: SecretStoreConfig) -> Result<Self> {
        let settings = Arc::new(settings);
        let registry = CacheRegistry::new();
        let lookup: Arc<dyn ConfigLookup> = settings.clone();
        let secrets = Arc::new(SecretService::new(lookup, store_config, &registry)?);

        info!(env = %settings.env(), caches = registry.len(), "Secrets subsystem initialized");

        Ok(Self { settings, registry, secrets })
    }

    /// Same as [`initialize`](Self::initialize) with a caller-supplied token source.
    pub fn initialize_with_exchange(
        settings: Settings,
        store_config: SecretStoreConfig,
        exchange: Arc<dyn CredentialExchange>,
    ) -> Result<Self> {
        let settings = Arc::new(settings);
        let registry = CacheRegistry::new();
        let lookup: Arc<dyn ConfigLookup> = settings.clone();
        let secrets =
            Arc::new(SecretService::with_exchange(lookup, store_config, &registry, exchange)?);

        Ok(Self { settings, registry, secrets })
    }

    pub fn secrets(&self) -> Arc<SecretService> {
        self.secrets.clone()
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings.clone()
    }

    /// Close every cache. Later calls do nothing.
    pub fn shutdown(&self) {
        if self.registry.is_closed() {
            return;
        }
        self.registry.close_all();
        info!("Secrets subsystem shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.registry.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings::from_pairs([("env", "test")]).unwrap()
    }

    #[test]
    fn test_initialize_creates_both_caches() {
        let context = SecretsContext::initialize(settings(), SecretStoreConfig::default()).unwrap();

        assert_eq!(context.registry.len(), 2);
        assert_eq!(context.settings().env(), "test");
        assert!(!context.is_shut_down());
    }

    #[test]
    fn test_initialize_rejects_invalid_config() {
        let store = SecretStoreConfig { token_ttl_seconds: 0, ..Default::default() };
        assert!(SecretsContext::initialize(settings(), store).is_err());
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let context = SecretsContext::initialize(settings(), SecretStoreConfig::default()).unwrap();

        context.shutdown();
        context.shutdown();

        assert!(context.is_shut_down());
    }

    #[test]
    fn test_secrets_handles_share_one_service() {
        let context = SecretsContext::initialize(settings(), SecretStoreConfig::default()).unwrap();
        assert!(Arc::ptr_eq(&context.secrets(), &context.secrets()));
    }
}
