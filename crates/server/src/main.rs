mod bootstrap;
mod health;
mod routes;

use anyhow::Result;

use banquet_core::config::{AppConfig, LoadOptions};
use routes::ApiState;

fn init_logging(config: &AppConfig) {
    use banquet_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Config and logging come up before anything else can fail.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    bootstrap::spawn_expiry_sweep(app.store.clone());

    let router = routes::router(ApiState { service: app.service.clone(), verifier: app.verifier.clone() })
        .merge(health::router(app.store.clone()));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!(
        event_name = "server_started",
        bind_address = %address,
        approvals_channel = %app.config.slack.approvals_channel,
        "banquet-server listening"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(event_name = "server_stopping", "banquet-server shutting down");
    Ok(())
}

async fn wait_for_shutdown() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(event_name = "shutdown_signal_error", error = %error, "could not listen for ctrl-c");
    }
}
