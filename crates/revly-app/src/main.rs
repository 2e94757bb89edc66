//! Revly App — composition-root entry point.
//!
//! Wires the HTTP service implementations and the file-backed state
//! store into the composed application store, then runs the one-shot
//! initializer. Configuration comes from the environment:
//! `REVLY_BACKEND_URL`, `REVLY_API_KEY`, `REVLY_STATE_DIR`.

use tracing_subscriber::EnvFilter;

use revly_remote::{
    HttpIdentityService, HttpProfileService, HttpTenantService, RemoteClient, RemoteConfig,
};
use revly_store::{AppStore, FileStateStore, StoreConfig};

fn remote_config_from_env() -> RemoteConfig {
    let mut config = RemoteConfig::default();
    if let Ok(url) = std::env::var("REVLY_BACKEND_URL") {
        config.base_url = url;
    }
    if let Ok(key) = std::env::var("REVLY_API_KEY") {
        config.api_key = key;
    }
    config
}

fn state_dir() -> std::path::PathBuf {
    std::env::var("REVLY_STATE_DIR")
        .map(Into::into)
        .unwrap_or_else(|_| FileStateStore::default_dir())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("revly=info".parse().unwrap()))
        .json()
        .init();

    tracing::info!("Starting Revly client core...");

    let remote_config = remote_config_from_env();
    let client = match RemoteClient::new(&remote_config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to configure backend client");
            std::process::exit(1);
        }
    };

    let app = AppStore::new(
        HttpIdentityService::new(client.clone()),
        HttpProfileService::new(client.clone()),
        HttpTenantService::new(client),
        FileStateStore::new(state_dir()),
        StoreConfig::default(),
    );

    app.initialize().await;

    let snapshot = app.snapshot();
    tracing::info!(
        authenticated = snapshot.is_authenticated(),
        tenant_active = snapshot.is_tenant_active(),
        loading = snapshot.loading(),
        "Revly client core initialized"
    );
    if let Some(error) = snapshot.error() {
        tracing::warn!(error, "initialization finished with an error");
    }
}
