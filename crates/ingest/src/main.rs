//! `gasmon-ingest` — gas-supply telemetry monitor daemon.
//!
//! Receives telemetry frames from the broker bridge, persists the
//! latest reading per device, and emails the on-call operators when a
//! reading crosses a safety threshold.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default              | Description                          |
//! |-----------------------|----------|----------------------|--------------------------------------|
//! | `BROKER_WS_URL`       | yes      | --                   | Broker bridge endpoint, e.g. `wss://host/ws/telemetry` |
//! | `REDIS_URL`           | no       | `redis://127.0.0.1/` | Last-reading store                   |
//! | `DASHBOARD_SYNC_URL`  | no       | --                   | Entity registration endpoint; sync skipped when unset |
//! | `ALERT_COOLDOWN_SECS` | no       | `300`                | Per-entity notification cooldown     |
//!
//! Mail settings (`EMAIL_*`) are documented in `gasmon_notify::config`
//! and may also come from an `email_config.json` file.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gasmon_core::AlertGate;
use gasmon_ingest::directory::{EntityDirectory, HttpDirectory};
use gasmon_ingest::router::MessageRouter;
use gasmon_ingest::source;
use gasmon_ingest::store::RedisStore;
use gasmon_notify::config::DEFAULT_CONFIG_FILE;
use gasmon_notify::{DispatchConfig, Dispatcher, MailConfig, SmtpMailer};

/// Default per-entity notification cooldown.
const DEFAULT_COOLDOWN_SECS: u64 = 300;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gasmon_ingest=info,gasmon_notify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ws_url = std::env::var("BROKER_WS_URL").unwrap_or_else(|_| {
        tracing::error!("BROKER_WS_URL environment variable is required");
        std::process::exit(1);
    });

    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1/".to_string());

    let cooldown_secs: u64 = std::env::var("ALERT_COOLDOWN_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_COOLDOWN_SECS);

    let mail_config = MailConfig::load(DEFAULT_CONFIG_FILE);
    let dispatch_config = DispatchConfig::from_env();

    let mailer = match SmtpMailer::new(mail_config) {
        Ok(mailer) => mailer,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build SMTP mailer");
            std::process::exit(1);
        }
    };

    let store = match RedisStore::connect(&redis_url).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, url = %redis_url, "Failed to connect to reading store");
            std::process::exit(1);
        }
    };

    let directory: Option<Arc<dyn EntityDirectory>> = std::env::var("DASHBOARD_SYNC_URL")
        .ok()
        .map(|url| Arc::new(HttpDirectory::new(url)) as Arc<dyn EntityDirectory>);

    let dispatcher = Dispatcher::new(Arc::new(mailer), dispatch_config);
    let router = MessageRouter::new(
        Arc::new(store),
        directory,
        AlertGate::new(Duration::from_secs(cooldown_secs)),
        dispatcher.clone(),
    );

    tracing::info!(
        ws_url = %ws_url,
        cooldown_secs,
        max_retries = dispatch_config.max_retries,
        "Starting gasmon-ingest",
    );

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown signal received");
                cancel.cancel();
            }
        }
    });

    source::run(&ws_url, &router, cancel).await;

    tracing::info!("Draining outstanding notification dispatches");
    dispatcher.shutdown().await;
}
