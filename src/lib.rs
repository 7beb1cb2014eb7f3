//! # sfk
//!
//! Secret fetching for sfk HTTP services. Services resolve named secrets from
//! a remote secret store that authenticates with OAuth2 client credentials,
//! with the bearer token and the resolved values cached in memory.
//!
//! ## Architecture
//!
//! ```text
//! SecretService ──► token cache (fixed TTL)  ──► CredentialExchange ──► identity provider
//!       │
//!       └─────────► secret cache (per-entry TTL) ──► secret store API
//! ```
//!
//! ## Core Components
//!
//! - **cache**: TTL caches and the registry that closes them at shutdown
//! - **secrets**: credential exchange, secret resolution and error types
//! - **config**: layered settings and the secret store client configuration
//! - **startup**: [`SecretsContext`], built once and shut down once
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sfk::{config::{SecretStoreConfig, Settings}, Result, SecretsContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let settings = Settings::load(None)?;
//!     let context = SecretsContext::initialize(settings, SecretStoreConfig::from_env())?;
//!
//!     let value = context.secrets().value_of("pprofSecret").await?;
//!     assert!(!value.is_empty());
//!
//!     context.shutdown();
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod errors;
pub mod observability;
pub mod secrets;
pub mod startup;

pub use errors::{Error, Result};
pub use secrets::{SecretService, SecretString, SecretsError};
pub use startup::SecretsContext;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
