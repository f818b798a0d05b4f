//! Messaging-platform integration for the banquet approval relay: Block Kit
//! templates, modal views, inbound interaction parsing, the outbound chat and
//! email gateways, and the approval flow service that ties them to the core.

pub mod approval;
pub mod blocks;
pub mod gateway;
pub mod interactions;
pub mod views;

#[cfg(test)]
mod testutil;

pub use approval::{ApprovalFlowService, SubmitError, ViewSubmissionOutcome};
pub use gateway::{
    ChatGateway, EmailMessage, EmailSender, RelayEmailSender, SendError, SlackApiClient,
};
pub use interactions::{parse_interaction_body, Interaction, InteractionError};
