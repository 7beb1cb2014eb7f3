//! Secret resolution against the remote secret store.
//!
//! [`SecretService`] keeps two caches: one holding the bearer token under
//! [`TOKEN_CACHE_KEY`], and one holding resolved secret values by secret name.
//! A cache hit never touches the network. Concurrent misses for the same name
//! each fetch independently; the last write wins.

use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::credentials::{ClientCredentialsExchange, CredentialExchange};
use super::error::{Result, SecretsError};
use super::generate::generate_secret_value;
use super::types::SecretString;
use crate::cache::{CacheRegistry, TtlCache, VariableTtlCache};
use crate::config::{ConfigLookup, SecretStoreConfig};

/// Key the bearer token is cached under.
pub const TOKEN_CACHE_KEY: &str = "FetchSecretToken";

const ORGANIZATION_KEY: &str = "hashicorp.organizationId";
const PROJECT_KEY: &str = "hashicorp.projectId";
const ENV_KEY: &str = "env";

#[derive(Deserialize)]
struct OpenSecretResponse {
    secret: OpenSecret,
}

#[derive(Deserialize)]
struct OpenSecret {
    version: SecretVersion,
}

#[derive(Deserialize)]
struct SecretVersion {
    value: SecretString,
}

#[derive(Serialize)]
struct CreateSecretRequest<'a> {
    name: &'a str,
    value: &'a str,
}

/// Reads, creates and deletes named secrets, caching tokens and values.
pub struct SecretService {
    client: reqwest::Client,
    config: Arc<dyn ConfigLookup>,
    exchange: Arc<dyn CredentialExchange>,
    store: SecretStoreConfig,
    token_cache: TtlCache<SecretString>,
    secret_cache: VariableTtlCache<SecretString>,
    secret_lock: Mutex<()>,
}

impl SecretService {
    /// Build a service that exchanges client credentials over HTTP.
    ///
    /// Both caches are created through `registry`, so closing the registry
    /// empties them.
    pub fn new(
        config: Arc<dyn ConfigLookup>,
        store: SecretStoreConfig,
        registry: &CacheRegistry,
    ) -> crate::errors::Result<Self> {
        store.validate()?;
        let client = build_client(&store)?;
        let exchange = Arc::new(ClientCredentialsExchange::new(client.clone(), config.clone(), &store));
        Ok(Self::assemble(client, config, store, registry, exchange))
    }

    /// Build a service around a caller-supplied token source.
    pub fn with_exchange(
        config: Arc<dyn ConfigLookup>,
        store: SecretStoreConfig,
        registry: &CacheRegistry,
        exchange: Arc<dyn CredentialExchange>,
    ) -> crate::errors::Result<Self> {
        store.validate()?;
        let client = build_client(&store)?;
        Ok(Self::assemble(client, config, store, registry, exchange))
    }

    fn assemble(
        client: reqwest::Client,
        config: Arc<dyn ConfigLookup>,
        store: SecretStoreConfig,
        registry: &CacheRegistry,
        exchange: Arc<dyn CredentialExchange>,
    ) -> Self {
        let token_cache = registry.create(store.token_cache_capacity, store.token_ttl());
        let secret_cache = registry.create_variable(store.secret_cache_capacity);

        Self {
            client,
            config,
            exchange,
            store,
            token_cache,
            secret_cache,
            secret_lock: Mutex::new(()),
        }
    }

    /// Resolve `config_key` to a secret name and return that secret's value.
    pub async fn value_of(&self, config_key: &str) -> Result<SecretString> {
        let secret_name = self.config.get_string(config_key);
        if secret_name.is_empty() {
            warn!(config_key = %config_key, "No secret name configured, querying secret store with an empty name");
        }

        if let Some(value) = self.cached_value(&secret_name).await {
            debug!(secret_name = %secret_name, "Secret served from cache");
            return Ok(value);
        }

        let token = self.token().await?;
        let url = self.app_url(&self.store.read_api_version, &format!("open/{}", secret_name));

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| {
                error!(secret_name = %secret_name, error = %e, "Secret read request failed");
                SecretsError::internal()
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(secret_name = %secret_name, status = status.as_u16(), "Secret store rejected read");
            return Err(SecretsError::internal());
        }

        let body = response.json::<OpenSecretResponse>().await.map_err(|e| {
            error!(secret_name = %secret_name, error = %e, "Secret read response has no secret.version.value");
            SecretsError::internal()
        })?;

        let value = body.secret.version.value;
        self.store_value(&secret_name, value.clone()).await;
        debug!(secret_name = %secret_name, "Secret fetched from secret store");

        Ok(value)
    }

    /// Create or overwrite `secret_name` remotely and cache the stored value.
    ///
    /// Without `value`, a random alphanumeric value is generated.
    pub async fn create(&self, secret_name: &str, value: Option<&str>) -> Result<SecretString> {
        let value = match value {
            Some(value) => SecretString::new(value),
            None => SecretString::new(generate_secret_value()),
        };

        let token = self.token().await?;
        let url = self.app_url(&self.store.write_api_version, "secret/kv");
        let body = CreateSecretRequest { name: secret_name, value: value.expose_secret() };

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .bearer_auth(token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(secret_name = %secret_name, error = %e, "Secret create request failed");
                SecretsError::internal()
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(secret_name = %secret_name, status = status.as_u16(), "Secret store rejected create");
            return Err(SecretsError::internal());
        }

        self.store_value(secret_name, value.clone()).await;
        info!(secret_name = %secret_name, "Secret created");

        Ok(value)
    }

    /// Delete `secret_name` remotely and drop it from the cache.
    pub async fn delete(&self, secret_name: &str) -> Result<()> {
        let token = self.token().await?;
        let url = self.app_url(&self.store.write_api_version, &format!("secrets/{}", secret_name));

        let response = self
            .client
            .delete(&url)
            .header(ACCEPT, "application/json")
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| {
                error!(secret_name = %secret_name, error = %e, "Secret delete request failed");
                SecretsError::internal()
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(secret_name = %secret_name, status = status.as_u16(), "Secret store rejected delete");
            return Err(SecretsError::internal());
        }

        {
            let _guard = self.secret_lock.lock().await;
            self.secret_cache.remove(secret_name).await;
        }
        info!(secret_name = %secret_name, "Secret deleted");

        Ok(())
    }

    /// Drop every cached secret value. The token is kept.
    pub async fn purge_secrets_cache(&self) {
        let _guard = self.secret_lock.lock().await;
        self.secret_cache.clear();
        info!("Secrets cache purged");
    }

    /// Cached token, or a fresh one from the exchange.
    ///
    /// A failed exchange empties the token cache.
    async fn token(&self) -> Result<SecretString> {
        if let Some(token) = self.token_cache.get(TOKEN_CACHE_KEY).await {
            return Ok(token);
        }

        match self.exchange.fetch_token().await {
            Ok(token) => {
                self.token_cache.insert(TOKEN_CACHE_KEY, token.clone()).await;
                Ok(token)
            }
            Err(e) => {
                self.token_cache.clear();
                Err(e)
            }
        }
    }

    async fn cached_value(&self, secret_name: &str) -> Option<SecretString> {
        let _guard = self.secret_lock.lock().await;
        self.secret_cache.get(secret_name).await
    }

    async fn store_value(&self, secret_name: &str, value: SecretString) {
        let _guard = self.secret_lock.lock().await;
        self.secret_cache.insert(secret_name, value, self.store.secret_ttl()).await;
    }

    fn app_url(&self, api_version: &str, suffix: &str) -> String {
        format!(
            "{}/secrets/{}/organizations/{}/projects/{}/apps/{}/{}",
            self.store.api_base_url,
            api_version,
            self.config.get_string(ORGANIZATION_KEY),
            self.config.get_string(PROJECT_KEY),
            self.config.get_string(ENV_KEY),
            suffix
        )
    }
}

impl std::fmt::Debug for SecretService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretService")
            .field("api_base_url", &self.store.api_base_url)
            .field("token_cache", &self.token_cache)
            .field("secret_cache", &self.secret_cache)
            .finish()
    }
}

fn build_client(store: &SecretStoreConfig) -> crate::errors::Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(store.request_timeout()).build()?)
}
