//! # Configuration Settings
//!
//! Layered key/value configuration plus the typed settings for the secret
//! store client and logging.
//!
//! [`Settings`] merges, lowest priority first:
//! 1. `config/default.json`
//! 2. `config/{env}.json`
//! 3. `SFK__*` environment variables (`SFK__PORT`, `SFK__HASHICORP__PROJECTID`, ...)
//! 4. the environment name itself, under the key `env`
//!
//! Environment variables always produce lower-case keys, so they can only
//! override keys that are lower-case in the files.

use crate::errors::{Error, Result};
use config::{Config as RawConfig, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validator::Validate;

/// Directory holding `default.json` and the per-environment files.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment used when neither the caller nor `SFK_ENV` names one.
pub const DEFAULT_ENV: &str = "localhost";

/// String lookup by dotted key.
///
/// Missing keys come back as an empty string rather than an error; callers
/// decide whether that matters.
pub trait ConfigLookup: Send + Sync {
    fn get_string(&self, key: &str) -> String;
}

/// Merged application configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    inner: RawConfig,
    env: String,
}

impl Settings {
    /// Load configuration for `env` (or `SFK_ENV`, or `localhost`) from `./config`.
    pub fn load(env: Option<&str>) -> Result<Self> {
        Self::load_from_dir(DEFAULT_CONFIG_DIR, env)
    }

    /// Load configuration from `dir`. Both files are optional.
    pub fn load_from_dir(dir: impl AsRef<Path>, env: Option<&str>) -> Result<Self> {
        let env = resolve_env(env);
        let dir = dir.as_ref();

        let inner = RawConfig::builder()
            .add_source(File::from(dir.join("default.json")).required(false))
            .add_source(File::from(dir.join(format!("{env}.json"))).required(false))
            .add_source(Environment::with_prefix("SFK").prefix_separator("__").separator("__"))
            .set_override("env", env.as_str())?
            .build()?;

        tracing::debug!(env = %env, dir = %dir.display(), "Loaded configuration");

        Ok(Self { inner, env })
    }

    /// Build configuration from in-memory key/value pairs.
    ///
    /// Keys are dotted paths (`hashicorp.organizationId`). An `env` pair sets
    /// the environment name; it defaults to `localhost`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut builder = RawConfig::builder().set_default("env", DEFAULT_ENV)?;
        for (key, value) in pairs {
            builder = builder.set_override(key.as_ref(), value.into())?;
        }
        let inner = builder.build()?;
        let env = inner.get_string("env").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        Ok(Self { inner, env })
    }

    /// Name of the environment this configuration was loaded for.
    pub fn env(&self) -> &str {
        &self.env
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.inner.get_int(key).ok()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.inner.get_bool(key).ok()
    }
}

impl ConfigLookup for Settings {
    fn get_string(&self, key: &str) -> String {
        self.inner.get_string(key).unwrap_or_default()
    }
}

fn resolve_env(env: Option<&str>) -> String {
    env.map(str::to_string)
        .or_else(|| std::env::var("SFK_ENV").ok())
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string())
}

/// Settings for the identity provider and secret store client.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SecretStoreConfig {
    /// OAuth2 token endpoint
    #[validate(length(min = 1, message = "Token URL cannot be empty"))]
    pub token_url: String,

    /// Secret store API base, without trailing slash
    #[validate(length(min = 1, message = "API base URL cannot be empty"))]
    pub api_base_url: String,

    /// API version used for reads
    #[validate(length(min = 1, message = "Read API version cannot be empty"))]
    pub read_api_version: String,

    /// API version used for creates and deletes
    #[validate(length(min = 1, message = "Write API version cannot be empty"))]
    pub write_api_version: String,

    /// Audience sent with the client-credentials grant
    pub audience: String,

    /// Config key holding the OAuth client id
    #[validate(length(min = 1, message = "Client id key cannot be empty"))]
    pub client_id_key: String,

    /// Environment variable holding the OAuth client secret
    #[validate(length(min = 1, message = "Client secret env var cannot be empty"))]
    pub client_secret_env: String,

    /// How long a fetched token is reused; keep it under the real token lifetime
    #[validate(range(min = 1, message = "Token TTL must be at least 1 second"))]
    pub token_ttl_seconds: u64,

    /// How long a resolved secret value is served from cache
    #[validate(range(min = 1, message = "Secret TTL must be at least 1 second"))]
    pub secret_ttl_seconds: u64,

    #[validate(range(min = 1, message = "Token cache capacity must be at least 1"))]
    pub token_cache_capacity: u64,

    #[validate(range(min = 1, message = "Secret cache capacity must be at least 1"))]
    pub secret_cache_capacity: u64,

    /// Timeout for each outbound HTTP call
    #[validate(range(
        min = 1,
        max = 300,
        message = "Request timeout must be between 1 and 300 seconds"
    ))]
    pub request_timeout_seconds: u64,
}

impl Default for SecretStoreConfig {
    fn default() -> Self {
        Self {
            token_url: "https://auth.idp.hashicorp.com/oauth2/token".to_string(),
            api_base_url: "https://api.cloud.hashicorp.com".to_string(),
            read_api_version: "2023-06-13".to_string(),
            write_api_version: "2023-11-28".to_string(),
            audience: "https://api.hashicorp.cloud".to_string(),
            client_id_key: "clientIds.hashicorp".to_string(),
            client_secret_env: "hashicorpSecret".to_string(),
            token_ttl_seconds: 59 * 60,
            secret_ttl_seconds: 6 * 60 * 60,
            token_cache_capacity: 1,
            secret_cache_capacity: 20,
            request_timeout_seconds: 10,
        }
    }
}

impl SecretStoreConfig {
    /// Defaults, overridden by `SFK_SECRETS_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            token_url: env_string("SFK_SECRETS_TOKEN_URL").unwrap_or(defaults.token_url),
            api_base_url: env_string("SFK_SECRETS_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            read_api_version: env_string("SFK_SECRETS_READ_API_VERSION")
                .unwrap_or(defaults.read_api_version),
            write_api_version: env_string("SFK_SECRETS_WRITE_API_VERSION")
                .unwrap_or(defaults.write_api_version),
            audience: env_string("SFK_SECRETS_AUDIENCE").unwrap_or(defaults.audience),
            client_id_key: env_string("SFK_SECRETS_CLIENT_ID_KEY")
                .unwrap_or(defaults.client_id_key),
            client_secret_env: env_string("SFK_SECRETS_CLIENT_SECRET_ENV")
                .unwrap_or(defaults.client_secret_env),
            token_ttl_seconds: env_u64("SFK_SECRETS_TOKEN_TTL_SECONDS")
                .unwrap_or(defaults.token_ttl_seconds),
            secret_ttl_seconds: env_u64("SFK_SECRETS_SECRET_TTL_SECONDS")
                .unwrap_or(defaults.secret_ttl_seconds),
            token_cache_capacity: env_u64("SFK_SECRETS_TOKEN_CACHE_CAPACITY")
                .unwrap_or(defaults.token_cache_capacity),
            secret_cache_capacity: env_u64("SFK_SECRETS_SECRET_CACHE_CAPACITY")
                .unwrap_or(defaults.secret_cache_capacity),
            request_timeout_seconds: env_u64("SFK_SECRETS_REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
        }
    }

    /// Point both endpoints at one base URL, as when testing against a mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        self.token_url = format!("{base_url}/oauth2/token");
        self.api_base_url = base_url.to_string();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_seconds)
    }

    pub fn secret_ttl(&self) -> Duration {
        Duration::from_secs(self.secret_ttl_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    pub json_logging: bool,

    /// Environment name attached to every log line
    pub env: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false, env: DEFAULT_ENV.to_string() }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    pub fn from_env(env: &str) -> Self {
        let log_level = env_string("SFK_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let json_logging = std::env::var("SFK_LOG_JSON")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Self { log_level, json_logging, env: env.to_string() }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn env_u64(name: &str) -> Option<u64> {
    env_string(name).and_then(|value| value.parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_from_pairs_lookup() {
        let settings = Settings::from_pairs([
            ("hashicorp.organizationId", "org-1"),
            ("pprofSecret", "prod-pprof-token"),
        ])
        .unwrap();

        assert_eq!(settings.get_string("hashicorp.organizationId"), "org-1");
        assert_eq!(settings.get_string("pprofSecret"), "prod-pprof-token");
        assert_eq!(settings.env(), DEFAULT_ENV);
    }

    #[test]
    fn test_missing_key_is_empty() {
        let settings = Settings::from_pairs([("env", "prod")]).unwrap();

        assert_eq!(settings.get_string("no.such.key"), "");
        assert_eq!(settings.env(), "prod");
        assert_eq!(settings.get_string("env"), "prod");
    }

    #[test]
    fn test_load_merges_default_and_env_files() {
        let dir = tempfile::tempdir().unwrap();

        let mut default = std::fs::File::create(dir.path().join("default.json")).unwrap();
        writeln!(
            default,
            r#"{{"port": 8080, "hashicorp": {{"organizationId": "org-default", "projectId": "proj"}}}}"#
        )
        .unwrap();

        let mut sandbox = std::fs::File::create(dir.path().join("sandbox.json")).unwrap();
        writeln!(sandbox, r#"{{"hashicorp": {{"organizationId": "org-sandbox"}}}}"#).unwrap();

        let settings = Settings::load_from_dir(dir.path(), Some("sandbox")).unwrap();

        assert_eq!(settings.env(), "sandbox");
        assert_eq!(settings.get_string("env"), "sandbox");
        assert_eq!(settings.get_string("hashicorp.organizationId"), "org-sandbox");
        assert_eq!(settings.get_string("hashicorp.projectId"), "proj");
        assert_eq!(settings.get_int("port"), Some(8080));
    }

    #[test]
    fn test_load_without_files() {
        let dir = tempfile::tempdir().unwrap();

        let settings = Settings::load_from_dir(dir.path(), Some("prod")).unwrap();

        assert_eq!(settings.env(), "prod");
        assert_eq!(settings.get_string("hashicorp.projectId"), "");
    }

    #[test]
    fn test_secret_store_defaults() {
        let config = SecretStoreConfig::default();

        assert_eq!(config.token_ttl(), Duration::from_secs(59 * 60));
        assert_eq!(config.secret_ttl(), Duration::from_secs(6 * 3600));
        assert_eq!(config.token_cache_capacity, 1);
        assert_eq!(config.secret_cache_capacity, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_secret_store_validation() {
        let config = SecretStoreConfig { secret_cache_capacity: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(Error::Validation(_))));

        let config = SecretStoreConfig { token_url: String::new(), ..Default::default() };
        assert!(config.validate().is_err());

        let config = SecretStoreConfig { token_ttl_seconds: 0, ..Default::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_base_url() {
        let config = SecretStoreConfig::default().with_base_url("http://127.0.0.1:9999/");

        assert_eq!(config.token_url, "http://127.0.0.1:9999/oauth2/token");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9999");
    }
}
