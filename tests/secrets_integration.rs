//! Integration tests for the secrets subsystem
//!
//! These tests load configuration from files, start the subsystem through
//! `SecretsContext`, and talk to a mock identity provider and secret store.

use serde_json::json;
use sfk::config::{SecretStoreConfig, Settings};
use sfk::{SecretsContext, SecretsError};
use std::env;
use std::sync::Mutex;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const CLIENT_SECRET_ENV: &str = "SFK_IT_CLIENT_SECRET";

fn write_config(dir: &std::path::Path) {
    std::fs::write(
        dir.join("default.json"),
        json!({
            "clientIds": {"hashicorp": "client-1"},
            "hashicorp": {"organizationId": "org-1", "projectId": "proj-1"},
            "pprofSecret": "dev-pprof-token"
        })
        .to_string(),
    )
    .unwrap();
    std::fs::write(dir.join("prod.json"), json!({"pprofSecret": "prod-pprof-token"}).to_string())
        .unwrap();
}

/// Build the store config from environment variables pointing at `server`.
fn store_config(server: &MockServer) -> SecretStoreConfig {
    let _guard = ENV_MUTEX.lock().unwrap();

    env::set_var("SFK_SECRETS_TOKEN_URL", format!("{}/oauth2/token", server.uri()));
    env::set_var("SFK_SECRETS_API_BASE_URL", format!("{}/", server.uri()));
    env::set_var("SFK_SECRETS_CLIENT_SECRET_ENV", CLIENT_SECRET_ENV);
    env::set_var(CLIENT_SECRET_ENV, "client-secret");

    let config = SecretStoreConfig::from_env();

    env::remove_var("SFK_SECRETS_TOKEN_URL");
    env::remove_var("SFK_SECRETS_API_BASE_URL");
    env::remove_var("SFK_SECRETS_CLIENT_SECRET_ENV");

    config
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .and(body_json(json!({
            "grant_type": "client_credentials",
            "client_id": "client-1",
            "client_secret": "client-secret",
            "audience": "https://api.hashicorp.cloud"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok123"})))
        .expect(1)
        .mount(server)
        .await;
}

fn load_settings(dir: &std::path::Path) -> Settings {
    write_config(dir);
    Settings::load_from_dir(dir, Some("prod")).unwrap()
}

#[tokio::test]
async fn test_value_of_end_to_end() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("GET"))
        .and(path(
            "/secrets/2023-06-13/organizations/org-1/projects/proj-1/apps/prod/open/prod-pprof-token",
        ))
        .and(header("authorization", "Bearer tok123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"secret": {"version": {"value": "s3cr3t"}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let context =
        SecretsContext::initialize(load_settings(dir.path()), store_config(&server)).unwrap();
    let secrets = context.secrets();

    let value = secrets.value_of("pprofSecret").await.unwrap();
    assert_eq!(value.expose_secret(), "s3cr3t");

    let requests_after_first = server.received_requests().await.unwrap().len();
    assert_eq!(requests_after_first, 2);

    let again = secrets.value_of("pprofSecret").await.unwrap();
    assert_eq!(again.expose_secret(), "s3cr3t");
    assert_eq!(server.received_requests().await.unwrap().len(), requests_after_first);

    context.shutdown();
    assert!(context.is_shut_down());
}

#[tokio::test]
async fn test_create_then_delete() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let base = "/secrets/2023-11-28/organizations/org-1/projects/proj-1/apps/prod";
    Mock::given(method("POST"))
        .and(path(format!("{}/secret/kv", base)))
        .and(body_json(json!({"name": "prod-pprof-token", "value": "v1"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{}/secrets/prod-pprof-token", base)))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/secrets/2023-06-13/organizations/org-1/projects/proj-1/apps/prod/open/prod-pprof-token",
        ))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let context =
        SecretsContext::initialize(load_settings(dir.path()), store_config(&server)).unwrap();
    let secrets = context.secrets();

    secrets.create("prod-pprof-token", Some("v1")).await.unwrap();
    assert_eq!(secrets.value_of("pprofSecret").await.unwrap().expose_secret(), "v1");

    secrets.delete("prod-pprof-token").await.unwrap();
    assert_eq!(secrets.value_of("pprofSecret").await.unwrap_err(), SecretsError::Internal);

    context.shutdown();
}

#[tokio::test]
async fn test_identity_provider_failure_surfaces_as_internal_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let context =
        SecretsContext::initialize(load_settings(dir.path()), store_config(&server)).unwrap();
    let secrets = context.secrets();

    let err = secrets.value_of("pprofSecret").await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.to_response().message, sfk::secrets::INTERNAL_ERROR_MESSAGE);

    // nothing was cached, so the exchange is attempted again
    assert!(secrets.value_of("pprofSecret").await.is_err());
}

#[test]
fn test_store_config_from_env_overrides() {
    let _guard = ENV_MUTEX.lock().unwrap();

    env::set_var("SFK_SECRETS_SECRET_TTL_SECONDS", "5400");
    env::set_var("SFK_SECRETS_SECRET_CACHE_CAPACITY", "50");
    env::set_var("SFK_SECRETS_REQUEST_TIMEOUT_SECONDS", "not-a-number");

    let config = SecretStoreConfig::from_env();
    assert_eq!(config.secret_ttl_seconds, 5400);
    assert_eq!(config.secret_cache_capacity, 50);
    assert_eq!(config.request_timeout_seconds, 10);
    assert!(config.validate().is_ok());

    env::remove_var("SFK_SECRETS_SECRET_TTL_SECONDS");
    env::remove_var("SFK_SECRETS_SECRET_CACHE_CAPACITY");
    env::remove_var("SFK_SECRETS_REQUEST_TIMEOUT_SECONDS");
}
