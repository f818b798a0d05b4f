//! Modal views for the partial-approval and deny-reason dialogs.
//!
//! Correlation never lives in process memory: the request id and the original
//! message coordinates ride inside the modal's `private_metadata`, so the
//! later `view_submission` call can be handled by any process instance.

use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use banquet_core::domain::request::{CateringRequest, ConversationRef, RequestId};

use crate::blocks::TextObject;

pub const PARTIAL_CALLBACK_ID: &str = "catering.partial_approval.submit";
pub const DENY_CALLBACK_ID: &str = "catering.deny_reason.submit";

pub const ROOMS_BLOCK_ID: &str = "partial.rooms.v1";
pub const ROOMS_ACTION_ID: &str = "partial.rooms.select";
pub const NOTE_BLOCK_ID: &str = "partial.note.v1";
pub const NOTE_ACTION_ID: &str = "partial.note.input";
pub const REASON_BLOCK_ID: &str = "deny.reason.v1";
pub const REASON_ACTION_ID: &str = "deny.reason.input";

/// Everything a `view_submission` needs to find its way back: the request id
/// plus the channel and timestamp of the message to edit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalMetadata {
    pub request_id: RequestId,
    pub channel_id: String,
    pub message_ts: String,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("modal metadata is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ModalMetadata {
    pub fn new(request_id: RequestId, conversation: &ConversationRef) -> Self {
        Self {
            request_id,
            channel_id: conversation.channel_id.clone(),
            message_ts: conversation.message_ts.clone(),
        }
    }

    pub fn conversation(&self) -> ConversationRef {
        ConversationRef { channel_id: self.channel_id.clone(), message_ts: self.message_ts.clone() }
    }

    pub fn encode(&self) -> String {
        // Serializing a struct of strings cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckboxOption {
    pub text: TextObject,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputElement {
    Checkboxes { action_id: String, options: Vec<CheckboxOption> },
    PlainTextInput { action_id: String, multiline: bool },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewBlock {
    Section { block_id: String, text: TextObject },
    Input { block_id: String, label: TextObject, element: InputElement, optional: bool },
}

/// A `modal`-type view, shaped for `views.open`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModalView {
    #[serde(rename = "type")]
    kind: &'static str,
    pub callback_id: String,
    pub private_metadata: String,
    pub title: TextObject,
    pub submit: TextObject,
    pub close: TextObject,
    pub blocks: Vec<ViewBlock>,
}

impl ModalView {
    fn new(
        callback_id: &str,
        metadata: &ModalMetadata,
        title: &str,
        submit: &str,
        blocks: Vec<ViewBlock>,
    ) -> Self {
        Self {
            kind: "modal",
            callback_id: callback_id.to_string(),
            private_metadata: metadata.encode(),
            title: TextObject::plain(title),
            submit: TextObject::plain(submit),
            close: TextObject::plain("Cancel"),
            blocks,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!(self)
    }
}

/// Room checkboxes from the request's own room list, plus an optional note.
pub fn partial_approval_modal(request: &CateringRequest, metadata: &ModalMetadata) -> ModalView {
    let options = request
        .rooms
        .iter()
        .map(|room| CheckboxOption { text: TextObject::plain(room.clone()), value: room.clone() })
        .collect();

    ModalView::new(
        PARTIAL_CALLBACK_ID,
        metadata,
        "Partial Approval",
        "Submit",
        vec![
            ViewBlock::Section {
                block_id: "partial.intro.v1".to_string(),
                text: TextObject::mrkdwn(format!(
                    "Select the rooms to approve for *{}*. Unselected rooms are declined.",
                    request.event_name
                )),
            },
            ViewBlock::Input {
                block_id: ROOMS_BLOCK_ID.to_string(),
                label: TextObject::plain("Rooms to approve"),
                element: InputElement::Checkboxes {
                    action_id: ROOMS_ACTION_ID.to_string(),
                    options,
                },
                optional: false,
            },
            ViewBlock::Input {
                block_id: NOTE_BLOCK_ID.to_string(),
                label: TextObject::plain("Note for the caterer"),
                element: InputElement::PlainTextInput {
                    action_id: NOTE_ACTION_ID.to_string(),
                    multiline: true,
                },
                optional: true,
            },
        ],
    )
}

pub fn deny_reason_modal(request: &CateringRequest, metadata: &ModalMetadata) -> ModalView {
    ModalView::new(
        DENY_CALLBACK_ID,
        metadata,
        "Deny Request",
        "Deny",
        vec![
            ViewBlock::Section {
                block_id: "deny.intro.v1".to_string(),
                text: TextObject::mrkdwn(format!(
                    "Provide a reason for denying *{}*. It is sent to the caterer verbatim.",
                    request.event_name
                )),
            },
            ViewBlock::Input {
                block_id: REASON_BLOCK_ID.to_string(),
                label: TextObject::plain("Reason"),
                element: InputElement::PlainTextInput {
                    action_id: REASON_ACTION_ID.to_string(),
                    multiline: true,
                },
                optional: false,
            },
        ],
    )
}
