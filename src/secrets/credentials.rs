//! OAuth2 client-credentials exchange against the identity provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use super::error::{Result, SecretsError};
use super::types::SecretString;
use crate::config::{ConfigLookup, SecretStoreConfig};

const GRANT_TYPE: &str = "client_credentials";

/// Source of bearer tokens for the secret store.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    /// Obtain a fresh bearer token. Each call is a single attempt.
    async fn fetch_token(&self) -> Result<SecretString>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: SecretString,
}

/// Client-credentials grant over HTTP.
///
/// The client id is read from configuration; the client secret is read from
/// an environment variable on every exchange and never from configuration.
pub struct ClientCredentialsExchange {
    client: reqwest::Client,
    config: Arc<dyn ConfigLookup>,
    token_url: String,
    audience: String,
    client_id_key: String,
    client_secret_env: String,
}

impl ClientCredentialsExchange {
    pub fn new(
        client: reqwest::Client,
        config: Arc<dyn ConfigLookup>,
        store: &SecretStoreConfig,
    ) -> Self {
        Self {
            client,
            config,
            token_url: store.token_url.clone(),
            audience: store.audience.clone(),
            client_id_key: store.client_id_key.clone(),
            client_secret_env: store.client_secret_env.clone(),
        }
    }

    fn client_secret(&self) -> SecretString {
        SecretString::new(std::env::var(&self.client_secret_env).unwrap_or_default())
    }
}

impl std::fmt::Debug for ClientCredentialsExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentialsExchange")
            .field("token_url", &self.token_url)
            .field("audience", &self.audience)
            .field("client_secret_env", &self.client_secret_env)
            .finish()
    }
}

#[async_trait]
impl CredentialExchange for ClientCredentialsExchange {
    async fn fetch_token(&self) -> Result<SecretString> {
        let client_id = self.config.get_string(&self.client_id_key);
        let client_secret = self.client_secret();
        let body = TokenRequest {
            grant_type: GRANT_TYPE,
            client_id: &client_id,
            client_secret: client_secret.expose_secret(),
            audience: &self.audience,
        };

        let response = self.client.post(&self.token_url).json(&body).send().await.map_err(|e| {
            error!(error = %e, token_url = %self.token_url, "Token exchange request failed");
            SecretsError::internal()
        })?;

        let status = response.status();
        if status.as_u16() >= 300 {
            error!(status = status.as_u16(), token_url = %self.token_url, "Token exchange rejected");
            return Err(SecretsError::internal());
        }

        let token = response.json::<TokenResponse>().await.map_err(|e| {
            error!(error = %e, "Token exchange response has no access_token");
            SecretsError::internal()
        })?;

        debug!("Fetched secret store token");
        Ok(token.access_token)
    }
}
