//! Outbound side: the chat API client and the email relay.
//!
//! Both seams are traits so the approval service can be exercised with
//! recording fakes; the real implementations speak HTTPS via `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use banquet_core::domain::request::ConversationRef;

use crate::blocks::MessageTemplate;
use crate::views::ModalView;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SendError {
    #[error("transport failure calling `{endpoint}`: {source}")]
    Transport { endpoint: String, source: reqwest::Error },
    #[error("`{endpoint}` answered HTTP {status}")]
    Status { endpoint: String, status: u16 },
    #[error("`{endpoint}` answered ok=false: {error}")]
    Platform { endpoint: String, error: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Chat platform operations the approval flow needs.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Posts a new message and returns where it landed, so later edits can
    /// find it.
    async fn post_new(
        &self,
        channel: &str,
        message: &MessageTemplate,
    ) -> Result<ConversationRef, SendError>;

    async fn update_in_place(
        &self,
        conversation: &ConversationRef,
        message: &MessageTemplate,
    ) -> Result<(), SendError>;

    async fn open_modal(&self, trigger_id: &str, view: &ModalView) -> Result<(), SendError>;

    /// One-off reply visible only to the interacting user.
    async fn respond_ephemeral(&self, response_url: &str, text: &str) -> Result<(), SendError>;

    async fn post_thread_reply(
        &self,
        conversation: &ConversationRef,
        text: &str,
    ) -> Result<(), SendError>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), SendError>;
}

/// Web-API client authenticated with the bot token.
pub struct SlackApiClient {
    http: reqwest::Client,
    bot_token: SecretString,
    base_url: String,
}

impl SlackApiClient {
    pub fn new(bot_token: SecretString) -> Result<Self, SendError> {
        Self::with_base_url(bot_token, "https://slack.com/api")
    }

    pub fn with_base_url(
        bot_token: SecretString,
        base_url: impl Into<String>,
    ) -> Result<Self, SendError> {
        let base_url = base_url.into();
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build().map_err(|source| {
            SendError::Transport { endpoint: base_url.clone(), source }
        })?;
        Ok(Self { http, bot_token, base_url })
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value, SendError> {
        let endpoint = format!("{}/{method}", self.base_url);
        debug!(event_name = "slack_api_call", method, "calling chat API");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|source| SendError::Transport { endpoint: endpoint.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Status { endpoint, status: status.as_u16() });
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|source| SendError::Transport { endpoint: endpoint.clone(), source })?;

        if parsed["ok"].as_bool() != Some(true) {
            let error = parsed["error"].as_str().unwrap_or("unknown_error").to_string();
            return Err(SendError::Platform { endpoint, error });
        }

        Ok(parsed)
    }
}

#[async_trait]
impl ChatGateway for SlackApiClient {
    async fn post_new(
        &self,
        channel: &str,
        message: &MessageTemplate,
    ) -> Result<ConversationRef, SendError> {
        let parsed = self
            .call(
                "chat.postMessage",
                json!({
                    "channel": channel,
                    "text": message.fallback_text,
                    "blocks": message.blocks,
                }),
            )
            .await?;

        Ok(ConversationRef {
            channel_id: parsed["channel"].as_str().unwrap_or(channel).to_string(),
            message_ts: parsed["ts"].as_str().unwrap_or_default().to_string(),
        })
    }

    async fn update_in_place(
        &self,
        conversation: &ConversationRef,
        message: &MessageTemplate,
    ) -> Result<(), SendError> {
        self.call(
            "chat.update",
            json!({
                "channel": conversation.channel_id,
                "ts": conversation.message_ts,
                "text": message.fallback_text,
                "blocks": message.blocks,
            }),
        )
        .await
        .map(|_| ())
    }

    async fn open_modal(&self, trigger_id: &str, view: &ModalView) -> Result<(), SendError> {
        self.call("views.open", json!({ "trigger_id": trigger_id, "view": view })).await.map(|_| ())
    }

    async fn respond_ephemeral(&self, response_url: &str, text: &str) -> Result<(), SendError> {
        let response = self
            .http
            .post(response_url)
            .json(&json!({ "response_type": "ephemeral", "replace_original": false, "text": text }))
            .send()
            .await
            .map_err(|source| SendError::Transport { endpoint: response_url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Status {
                endpoint: response_url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    async fn post_thread_reply(
        &self,
        conversation: &ConversationRef,
        text: &str,
    ) -> Result<(), SendError> {
        self.call(
            "chat.postMessage",
            json!({
                "channel": conversation.channel_id,
                "thread_ts": conversation.message_ts,
                "text": text,
            }),
        )
        .await
        .map(|_| ())
    }
}

/// Hands finished emails to the deployment's mail relay over HTTPS. The relay
/// owns SMTP; this process only ever sees an accepted/rejected answer.
pub struct RelayEmailSender {
    http: reqwest::Client,
    relay_url: String,
}

impl RelayEmailSender {
    pub fn new(relay_url: impl Into<String>) -> Result<Self, SendError> {
        let relay_url = relay_url.into();
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build().map_err(|source| {
            SendError::Transport { endpoint: relay_url.clone(), source }
        })?;
        Ok(Self { http, relay_url })
    }
}

#[async_trait]
impl EmailSender for RelayEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), SendError> {
        debug!(event_name = "email_relay_send", to = %message.to, "handing email to relay");

        let response = self
            .http
            .post(&self.relay_url)
            .json(message)
            .send()
            .await
            .map_err(|source| SendError::Transport { endpoint: self.relay_url.clone(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::Status { endpoint: self.relay_url.clone(), status: status.as_u16() });
        }
        Ok(())
    }
}
