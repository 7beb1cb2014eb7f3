//! Secret fetching for sfk services.
//!
//! Secrets live in a remote secret store that accepts OAuth2 bearer tokens.
//! The subsystem has three parts:
//! - [`CredentialExchange`]: trades client credentials for a bearer token
//! - [`SecretService`]: resolves, creates and deletes named secrets
//! - two caches owned by the service, one for the token and one for values
//!
//! # Lookup Flow
//!
//! `value_of(config_key)` reads the secret name from configuration, answers
//! from the value cache when it can, and otherwise fetches the token (cached
//! for slightly less than its real lifetime) and reads the secret. `create`
//! writes through to the value cache; `delete` evicts from it.
//!
//! # Errors
//!
//! Every failure is logged where it happens and returned as
//! [`SecretsError::Internal`], whose message is safe to show to end users.
//! Nothing is retried.
//!
//! # Example
//!
//! ```rust,ignore
//! use sfk::cache::CacheRegistry;
//! use sfk::config::{SecretStoreConfig, Settings};
//! use sfk::secrets::SecretService;
//! use std::sync::Arc;
//!
//! let registry = CacheRegistry::new();
//! let settings = Arc::new(Settings::load(None)?);
//! let secrets = SecretService::new(settings, SecretStoreConfig::from_env(), &registry)?;
//!
//! let pprof_token = secrets.value_of("pprofSecret").await?;
//! let generated = secrets.create("webhook-signing-key", None).await?;
//! secrets.delete("webhook-signing-key").await?;
//!
//! registry.close_all();
//! ```

pub mod credentials;
pub mod error;
pub mod generate;
pub mod service;
pub mod types;

pub use credentials::{ClientCredentialsExchange, CredentialExchange};
pub use error::{ErrorBody, Result, SecretsError, INTERNAL_ERROR_MESSAGE};
pub use generate::{generate_secret_value, GENERATED_SECRET_LENGTH};
pub use service::{SecretService, TOKEN_CACHE_KEY};
pub use types::SecretString;
