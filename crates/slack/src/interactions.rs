//! Inbound interaction payload parsing.
//!
//! Interactivity calls arrive form-encoded with a single `payload` field
//! holding urlencoded JSON. Parsing here is strictly read-only; signature
//! verification has already happened on the raw body upstream.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("interaction body has no `payload` field")]
    MissingPayloadField,
    #[error("interaction payload is not valid urlencoding: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
    #[error("interaction payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    BlockActions(BlockActionsPayload),
    ViewSubmission(ViewSubmissionPayload),
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, Deserialize)]
pub struct UserRef {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ChannelRef {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessageRef {
    pub ts: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ActionInvocation {
    pub action_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BlockActionsPayload {
    pub user: UserRef,
    pub trigger_id: String,
    #[serde(default)]
    pub response_url: Option<String>,
    #[serde(default)]
    pub channel: Option<ChannelRef>,
    #[serde(default)]
    pub message: Option<MessageRef>,
    pub actions: Vec<ActionInvocation>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ViewSubmissionPayload {
    pub user: UserRef,
    pub view: ViewRef,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ViewRef {
    pub callback_id: String,
    #[serde(default)]
    pub private_metadata: String,
    pub state: ViewState,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub values: HashMap<String, HashMap<String, StateValue>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct StateValue {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub selected_options: Option<Vec<SelectedOption>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

impl ViewSubmissionPayload {
    /// Values of the checked options under `block_id`/`action_id`, empty when
    /// nothing was checked.
    pub fn selected_values(&self, block_id: &str, action_id: &str) -> Vec<String> {
        self.state_value(block_id, action_id)
            .and_then(|state| state.selected_options.as_ref())
            .map(|options| options.iter().map(|option| option.value.clone()).collect())
            .unwrap_or_default()
    }

    /// Trimmed text of a plain-text input, `None` when absent or blank.
    pub fn text_value(&self, block_id: &str, action_id: &str) -> Option<String> {
        self.state_value(block_id, action_id)
            .and_then(|state| state.value.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    }

    fn state_value(&self, block_id: &str, action_id: &str) -> Option<&StateValue> {
        self.view.state.values.get(block_id).and_then(|actions| actions.get(action_id))
    }
}

/// Parses the raw form body of an interactivity call.
pub fn parse_interaction_body(raw_body: &str) -> Result<Interaction, InteractionError> {
    let encoded = raw_body
        .split('&')
        .find_map(|pair| pair.strip_prefix("payload="))
        .ok_or(InteractionError::MissingPayloadField)?;

    // Form encoding uses `+` for spaces, which percent-decoding alone leaves.
    let with_spaces = encoded.replace('+', " ");
    let decoded = urlencoding::decode(&with_spaces)?;
    Ok(serde_json::from_str(&decoded)?)
}
