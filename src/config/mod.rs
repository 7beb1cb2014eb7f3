//! # Configuration Management
//!
//! Layered configuration for sfk services. [`Settings`] answers dotted-key
//! lookups through [`ConfigLookup`]; [`SecretStoreConfig`] and
//! [`LoggingConfig`] are the typed settings the secrets subsystem and the
//! logger are built from.

pub mod settings;

pub use settings::{
    ConfigLookup, LoggingConfig, SecretStoreConfig, Settings, DEFAULT_CONFIG_DIR, DEFAULT_ENV,
};
