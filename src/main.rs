use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_appender::rolling;

use hr_portal::api::gateway::GatewayClient;
use hr_portal::api::memory::MemoryStore;
use hr_portal::auth::jwt;
use hr_portal::auth::store::{EphemeralSessionStore, FileSessionStore, SessionStore};
use hr_portal::model::UserId;
use hr_portal::{Backend, BackendKind, Config, Portal, PortalOptions, console, sync};

fn connect(config: &Config) -> anyhow::Result<Backend> {
    match config.backend {
        BackendKind::Gateway => {
            let client =
                GatewayClient::from_config(config).context("failed to build the gateway client")?;
            info!(base_url = client.base_url(), "using REST gateway");
            Ok(Backend::gateway(client))
        }
        BackendKind::Memory => {
            let app_id = config.app_id.clone().context("HR_APP_ID must be set")?;
            let store = MemoryStore::new(app_id);
            // a configured token signs in as its own subject, or a fixed local user
            if let Some(token) = &config.initial_auth_token {
                let user = jwt::subject(token)
                    .map(UserId::new)
                    .unwrap_or_else(|| UserId::new("local-user"));
                store.register_custom_token(token, user);
            }
            info!(app_id = store.app_id(), "using in-process document store");
            Ok(Backend::memory(Arc::new(store)))
        }
    }
}

fn session_store(config: &Config) -> Box<dyn SessionStore> {
    match &config.session_file {
        Some(path) => Box::new(FileSessionStore::new(path)),
        None => Box::new(EphemeralSessionStore),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("invalid configuration")?;

    // Rolling daily log; stdout belongs to the console
    let file_appender = rolling::daily(&config.log_dir, "hr-portal.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(backend = %config.backend, "portal starting...");

    let backend = connect(&config)?;
    let (events, receiver) = sync::channel();
    let mut portal = Portal::new(
        backend,
        session_store(&config),
        PortalOptions::from_config(&config),
        events,
    );

    if let Err(e) = portal.start().await {
        warn!(error = %e, "starting signed out");
    }

    console::run(&mut portal, receiver).await?;

    info!("portal closed");
    Ok(())
}
