use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use banquet_core::config::{AppConfig, ConfigError, LoadOptions};
use banquet_core::store::RequestStore;
use banquet_core::verify::SignatureVerifier;
use banquet_slack::approval::ApprovalFlowService;
use banquet_slack::gateway::{RelayEmailSender, SendError, SlackApiClient};

const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(600);

pub struct Application {
    pub config: AppConfig,
    pub store: Arc<RequestStore>,
    pub service: Arc<ApprovalFlowService<SlackApiClient, RelayEmailSender>>,
    pub verifier: Arc<SignatureVerifier>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("outbound client construction failed: {0}")]
    Gateway(#[from] SendError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(event_name = "bootstrap_start", "starting application bootstrap");
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let ttl = chrono::Duration::hours(config.requests.ttl_hours as i64);
    let store = Arc::new(RequestStore::new(ttl));

    let gateway = SlackApiClient::new(config.slack.bot_token.clone())?;
    let email = RelayEmailSender::new(config.email.relay_url.clone())?;
    let verifier = Arc::new(SignatureVerifier::new(&config.slack.signing_secret));

    let service = Arc::new(ApprovalFlowService::new(
        store.clone(),
        gateway,
        email,
        config.slack.approvals_channel.clone(),
        config.slack.approver_user_ids.clone(),
        config.email.caterer_address.clone(),
        config.email.cc.clone(),
    ));

    info!(
        event_name = "bootstrap_ready",
        ttl_hours = config.requests.ttl_hours,
        approvers = config.slack.approver_user_ids.len(),
        "application wired"
    );

    Ok(Application { config, store, service, verifier })
}

/// Background sweep that drops expired requests, complementing the lazy
/// expiry on read.
pub fn spawn_expiry_sweep(store: Arc<RequestStore>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(EXPIRY_SWEEP_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                info!(event_name = "expiry_sweep", purged, "dropped expired requests");
            } else {
                debug!(event_name = "expiry_sweep", "no expired requests");
            }
        }
    })
}
