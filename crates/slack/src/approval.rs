//! Orchestration of the approval flow.
//!
//! `ApprovalFlowService` sits between the HTTP layer and the pure core: it
//! owns the store handle and the outbound seams, maps inbound interaction
//! payloads onto workflow events, and runs the notification fan-out for a
//! committed decision. Once a decision is in the store it is final; outbound
//! failures after that point are logged and never rolled back.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use banquet_core::domain::request::{
    CateringRequest, ConversationRef, DecisionKind, DecisionRecord, RequestId,
    SubmitRequestPayload,
};
use banquet_core::errors::DomainError;
use banquet_core::format;
use banquet_core::store::{RequestStore, ResolveError};
use banquet_core::workflow::{
    transition, ApprovalEvent, ApprovalState, GuardContext, TransitionError,
};

use crate::blocks::{self, APPROVE_ALL_ACTION, DENY_ACTION, PARTIAL_ACTION};
use crate::gateway::{ChatGateway, EmailMessage, EmailSender, SendError};
use crate::interactions::{BlockActionsPayload, ViewSubmissionPayload};
use crate::views::{
    self, ModalMetadata, DENY_CALLBACK_ID, NOTE_ACTION_ID, NOTE_BLOCK_ID, PARTIAL_CALLBACK_ID,
    REASON_ACTION_ID, REASON_BLOCK_ID, ROOMS_ACTION_ID, ROOMS_BLOCK_ID,
};

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("could not post the approval message: {0}")]
    Send(#[from] SendError),
}

/// What the HTTP layer should answer to a `view_submission`.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewSubmissionOutcome {
    /// Decision committed; close the modal and notify.
    Decided { request: CateringRequest },
    /// Keep the modal open and surface per-field errors.
    Errors(HashMap<String, String>),
    /// Someone else decided first; close the modal silently.
    AlreadyDecided,
    /// Not a dialog this service owns.
    Ignored,
}

pub struct ApprovalFlowService<G, E> {
    store: Arc<RequestStore>,
    gateway: G,
    email: E,
    approvals_channel: String,
    approver_user_ids: Vec<String>,
    caterer_address: String,
    caterer_cc: Vec<String>,
}

impl<G: ChatGateway, E: EmailSender> ApprovalFlowService<G, E> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<RequestStore>,
        gateway: G,
        email: E,
        approvals_channel: impl Into<String>,
        approver_user_ids: Vec<String>,
        caterer_address: impl Into<String>,
        caterer_cc: Vec<String>,
    ) -> Self {
        Self {
            store,
            gateway,
            email,
            approvals_channel: approvals_channel.into(),
            approver_user_ids,
            caterer_address: caterer_address.into(),
            caterer_cc,
        }
    }

    pub fn store(&self) -> &Arc<RequestStore> {
        &self.store
    }

    /// Validates a web-form submission, stores it as PENDING and posts the
    /// approval message. If the post fails the entry is removed again, so a
    /// stored request always has a message to decide it from.
    pub async fn submit(&self, payload: SubmitRequestPayload) -> Result<RequestId, SubmitError> {
        let request = CateringRequest::from_submission(payload)?;
        let id = request.id.clone();
        let message = blocks::new_request_message(&request);
        self.store.insert(request);

        match self.gateway.post_new(&self.approvals_channel, &message).await {
            Ok(conversation) => {
                self.store.set_conversation(&id, conversation);
                info!(event_name = "request_submitted", request_id = %id, "approval message posted");
                Ok(id)
            }
            Err(send_error) => {
                self.store.remove(&id);
                Err(send_error.into())
            }
        }
    }

    /// Handles one button click. The HTTP layer has already acked; everything
    /// here reports back through ephemeral responses, message edits or logs.
    pub async fn handle_block_action(&self, payload: BlockActionsPayload) {
        let Some(action) = payload.actions.first() else {
            warn!(event_name = "block_action_empty", "interaction carried no actions");
            return;
        };

        let event = match action.action_id.as_str() {
            APPROVE_ALL_ACTION => ApprovalEvent::ApproveAll,
            PARTIAL_ACTION => ApprovalEvent::RequestPartialDetail,
            DENY_ACTION => ApprovalEvent::RequestDenyReason,
            other => {
                warn!(event_name = "block_action_unknown", action_id = other, "ignoring action");
                return;
            }
        };

        let Some(raw_id) = action.value.clone() else {
            warn!(event_name = "block_action_no_value", action_id = %action.action_id, "button carried no request id");
            return;
        };
        let request_id = RequestId(raw_id);

        let Some(request) = self.store.get(&request_id) else {
            self.reply_ephemeral(
                payload.response_url.as_deref(),
                "This request has expired or is no longer available. Please ask for it to be resubmitted.",
            )
            .await;
            return;
        };

        if request.status.is_terminal() {
            self.reply_ephemeral(
                payload.response_url.as_deref(),
                &format!("This request was already resolved as {:?}.", request.status),
            )
            .await;
            return;
        }

        let ctx = GuardContext::for_button(self.is_approver(&payload.user.id));
        let outcome = match transition(ApprovalState::Pending, event, &ctx) {
            Ok(outcome) => outcome,
            Err(TransitionError::Unauthorized) => {
                warn!(event_name = "block_action_unauthorized", user_id = %payload.user.id, request_id = %request_id);
                self.reply_ephemeral(
                    payload.response_url.as_deref(),
                    "You are not authorized to decide catering requests.",
                )
                .await;
                return;
            }
            Err(transition_error) => {
                warn!(event_name = "block_action_invalid", error = %transition_error, request_id = %request_id);
                return;
            }
        };

        match outcome.to {
            ApprovalState::Approved => {
                let decision = DecisionRecord {
                    actor_user_id: payload.user.id.clone(),
                    decided_at: Utc::now(),
                    kind: DecisionKind::Approved,
                };
                match self.store.resolve(&request_id, decision) {
                    Ok(decided) => self.notify_decided(&decided).await,
                    Err(ResolveError::AlreadyDecided { status, .. }) => {
                        self.reply_ephemeral(
                            payload.response_url.as_deref(),
                            &format!("This request was already resolved as {status:?}."),
                        )
                        .await;
                    }
                    Err(ResolveError::NotFound(_)) => {
                        self.reply_ephemeral(
                            payload.response_url.as_deref(),
                            "This request has expired or is no longer available.",
                        )
                        .await;
                    }
                }
            }
            ApprovalState::AwaitingPartialDetail | ApprovalState::AwaitingDenyReason => {
                let Some(conversation) = self.conversation_for(&request, &payload) else {
                    warn!(event_name = "block_action_no_conversation", request_id = %request_id, "cannot correlate modal without message coordinates");
                    return;
                };
                let metadata = ModalMetadata::new(request_id.clone(), &conversation);
                let view = if outcome.to == ApprovalState::AwaitingPartialDetail {
                    views::partial_approval_modal(&request, &metadata)
                } else {
                    views::deny_reason_modal(&request, &metadata)
                };

                if let Err(send_error) = self.gateway.open_modal(&payload.trigger_id, &view).await {
                    error!(event_name = "modal_open_failed", error = %send_error, request_id = %request_id);
                }
            }
            _ => {}
        }
    }

    /// Maps a dialog submission onto the state machine and, when the guards
    /// pass, commits the decision. Pure store work; the caller answers the
    /// HTTP call from the outcome and runs `notify_decided` afterwards.
    pub fn resolve_view_submission(&self, payload: &ViewSubmissionPayload) -> ViewSubmissionOutcome {
        let (current, event, error_block) = match payload.view.callback_id.as_str() {
            PARTIAL_CALLBACK_ID => (
                ApprovalState::AwaitingPartialDetail,
                ApprovalEvent::PartialDetailSubmitted,
                ROOMS_BLOCK_ID,
            ),
            DENY_CALLBACK_ID => {
                (ApprovalState::AwaitingDenyReason, ApprovalEvent::DenyReasonSubmitted, REASON_BLOCK_ID)
            }
            _ => return ViewSubmissionOutcome::Ignored,
        };

        let metadata = match ModalMetadata::decode(&payload.view.private_metadata) {
            Ok(metadata) => metadata,
            Err(metadata_error) => {
                warn!(event_name = "view_submission_bad_metadata", error = %metadata_error);
                return ViewSubmissionOutcome::Ignored;
            }
        };

        let approved_rooms = payload.selected_values(ROOMS_BLOCK_ID, ROOMS_ACTION_ID);
        let reason = payload.text_value(REASON_BLOCK_ID, REASON_ACTION_ID);

        let ctx = match event {
            ApprovalEvent::PartialDetailSubmitted => GuardContext::for_partial_submission(
                self.is_approver(&payload.user.id),
                approved_rooms.len(),
            ),
            _ => GuardContext::for_deny_submission(
                self.is_approver(&payload.user.id),
                reason.clone().unwrap_or_default(),
            ),
        };

        if let Err(transition_error) = transition(current, event, &ctx) {
            let message = match transition_error {
                TransitionError::Unauthorized => {
                    "You are not authorized to decide catering requests.".to_string()
                }
                TransitionError::NoRoomsSelected => {
                    "Select at least one room to approve.".to_string()
                }
                TransitionError::EmptyReason => "A denial reason is required.".to_string(),
                TransitionError::Invalid { .. } => {
                    warn!(event_name = "view_submission_invalid", error = %transition_error);
                    return ViewSubmissionOutcome::Ignored;
                }
            };
            return ViewSubmissionOutcome::Errors(HashMap::from([(
                error_block.to_string(),
                message,
            )]));
        }

        let kind = match event {
            ApprovalEvent::PartialDetailSubmitted => {
                let Some(request) = self.store.get(&metadata.request_id) else {
                    return ViewSubmissionOutcome::Errors(HashMap::from([(
                        error_block.to_string(),
                        "This request has expired and can no longer be decided.".to_string(),
                    )]));
                };
                DecisionKind::Partial {
                    declined_rooms: request.declined_rooms(&approved_rooms),
                    approved_rooms,
                    note: payload.text_value(NOTE_BLOCK_ID, NOTE_ACTION_ID),
                }
            }
            _ => DecisionKind::Denied { reason: reason.unwrap_or_default() },
        };

        let decision =
            DecisionRecord { actor_user_id: payload.user.id.clone(), decided_at: Utc::now(), kind };

        match self.store.resolve(&metadata.request_id, decision) {
            Ok(mut decided) => {
                // The message coordinates travelled through the modal; the
                // store copy may predate them.
                if decided.conversation.is_none() {
                    decided.conversation = Some(metadata.conversation());
                }
                ViewSubmissionOutcome::Decided { request: decided }
            }
            Err(ResolveError::AlreadyDecided { .. }) => ViewSubmissionOutcome::AlreadyDecided,
            Err(ResolveError::NotFound(_)) => ViewSubmissionOutcome::Errors(HashMap::from([(
                error_block.to_string(),
                "This request has expired and can no longer be decided.".to_string(),
            )])),
        }
    }

    /// Fan-out for a committed decision: caterer email first, then the
    /// in-place message edit, then the thread confirmation. Each leg logs its
    /// own failure and the rest still run.
    pub async fn notify_decided(&self, request: &CateringRequest) {
        let Some(decision) = &request.decision else {
            error!(event_name = "notify_without_decision", request_id = %request.id, "refusing to notify an undecided request");
            return;
        };

        let content = format::decision_email(request, decision);
        let message = EmailMessage {
            to: self.caterer_address.clone(),
            cc: self.caterer_cc.clone(),
            subject: content.subject,
            body: content.body,
        };
        if let Err(send_error) = self.email.send(&message).await {
            error!(event_name = "decision_email_failed", error = %send_error, request_id = %request.id);
        }

        let Some(conversation) = &request.conversation else {
            warn!(event_name = "decision_message_unlocatable", request_id = %request.id, "no message coordinates to update");
            return;
        };

        let updated = blocks::decided_message(request, decision);
        if let Err(send_error) = self.gateway.update_in_place(conversation, &updated).await {
            error!(event_name = "decision_update_failed", error = %send_error, request_id = %request.id);
        }

        let reply = blocks::decision_thread_reply(request, decision);
        if let Err(send_error) = self.gateway.post_thread_reply(conversation, &reply).await {
            error!(event_name = "decision_thread_reply_failed", error = %send_error, request_id = %request.id);
        }

        info!(
            event_name = "decision_notified",
            request_id = %request.id,
            status = ?request.status,
            "decision fan-out finished"
        );
    }

    fn is_approver(&self, user_id: &str) -> bool {
        self.approver_user_ids.iter().any(|approver| approver == user_id)
    }

    fn conversation_for(
        &self,
        request: &CateringRequest,
        payload: &BlockActionsPayload,
    ) -> Option<ConversationRef> {
        if let Some(conversation) = &request.conversation {
            return Some(conversation.clone());
        }
        match (&payload.channel, &payload.message) {
            (Some(channel), Some(message)) => {
                Some(ConversationRef { channel_id: channel.id.clone(), message_ts: message.ts.clone() })
            }
            _ => None,
        }
    }

    async fn reply_ephemeral(&self, response_url: Option<&str>, text: &str) {
        let Some(response_url) = response_url else {
            warn!(event_name = "ephemeral_without_response_url", text, "nowhere to answer");
            return;
        };
        if let Err(send_error) = self.gateway.respond_ephemeral(response_url, text).await {
            error!(event_name = "ephemeral_failed", error = %send_error);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Duration;

    use banquet_core::domain::request::{ConversationRef, RequestId, RequestStatus};
    use banquet_core::store::RequestStore;

    use super::{ApprovalFlowService, ViewSubmissionOutcome};
    use crate::blocks::{Block, MessageTemplate, APPROVE_ALL_ACTION, PARTIAL_ACTION};
    use crate::gateway::{ChatGateway, EmailMessage, EmailSender, SendError};
    use crate::interactions::{
        ActionInvocation, BlockActionsPayload, ChannelRef, MessageRef, UserRef,
        ViewSubmissionPayload,
    };
    use crate::testutil::submission_fixture;
    use crate::views::{ModalMetadata, PARTIAL_CALLBACK_ID};

    const APPROVER: &str = "U0APPROVER";

    /// Shared append-only log so tests can assert cross-seam ordering.
    type EventLog = Arc<Mutex<Vec<String>>>;

    #[derive(Clone, Default)]
    struct RecordingGateway {
        log: EventLog,
        fail_posts: bool,
    }

    #[async_trait]
    impl ChatGateway for RecordingGateway {
        async fn post_new(
            &self,
            channel: &str,
            _message: &MessageTemplate,
        ) -> Result<ConversationRef, SendError> {
            if self.fail_posts {
                return Err(SendError::Status { endpoint: "chat.postMessage".to_string(), status: 500 });
            }
            self.log.lock().expect("log lock").push(format!("post_new:{channel}"));
            Ok(ConversationRef {
                channel_id: channel.to_string(),
                message_ts: "1730000000.000100".to_string(),
            })
        }

        async fn update_in_place(
            &self,
            conversation: &ConversationRef,
            message: &MessageTemplate,
        ) -> Result<(), SendError> {
            let has_actions =
                message.blocks.iter().any(|block| matches!(block, Block::Actions { .. }));
            self.log
                .lock()
                .expect("log lock")
                .push(format!("update:{}:actions={has_actions}", conversation.message_ts));
            Ok(())
        }

        async fn open_modal(
            &self,
            trigger_id: &str,
            view: &crate::views::ModalView,
        ) -> Result<(), SendError> {
            self.log
                .lock()
                .expect("log lock")
                .push(format!("open_modal:{trigger_id}:{}", view.callback_id));
            Ok(())
        }

        async fn respond_ephemeral(&self, _response_url: &str, text: &str) -> Result<(), SendError> {
            self.log.lock().expect("log lock").push(format!("ephemeral:{text}"));
            Ok(())
        }

        async fn post_thread_reply(
            &self,
            _conversation: &ConversationRef,
            _text: &str,
        ) -> Result<(), SendError> {
            self.log.lock().expect("log lock").push("thread_reply".to_string());
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingEmail {
        log: EventLog,
        sent: Arc<Mutex<Vec<EmailMessage>>>,
        fail: bool,
    }

    #[async_trait]
    impl EmailSender for RecordingEmail {
        async fn send(&self, message: &EmailMessage) -> Result<(), SendError> {
            if self.fail {
                return Err(SendError::Status { endpoint: "relay".to_string(), status: 502 });
            }
            self.log.lock().expect("log lock").push("email".to_string());
            self.sent.lock().expect("sent lock").push(message.clone());
            Ok(())
        }
    }

    fn service(
        log: EventLog,
    ) -> (ApprovalFlowService<RecordingGateway, RecordingEmail>, Arc<Mutex<Vec<EmailMessage>>>)
    {
        let gateway = RecordingGateway { log: log.clone(), fail_posts: false };
        let email = RecordingEmail { log, sent: Arc::default(), fail: false };
        let sent = email.sent.clone();
        let store = Arc::new(RequestStore::new(Duration::hours(24)));
        let service = ApprovalFlowService::new(
            store,
            gateway,
            email,
            "C0FACILITIES",
            vec![APPROVER.to_string()],
            "kitchen@example.org",
            vec!["events@example.org".to_string()],
        );
        (service, sent)
    }

    fn button_payload(user_id: &str, action_id: &str, request_id: &RequestId) -> BlockActionsPayload {
        BlockActionsPayload {
            user: UserRef { id: user_id.to_string() },
            trigger_id: "trigger-1".to_string(),
            response_url: Some("https://hooks.example.com/respond".to_string()),
            channel: Some(ChannelRef { id: "C0FACILITIES".to_string() }),
            message: Some(MessageRef { ts: "1730000000.000100".to_string() }),
            actions: vec![ActionInvocation {
                action_id: action_id.to_string(),
                value: Some(request_id.0.clone()),
            }],
        }
    }

    fn partial_submission(
        user_id: &str,
        metadata: &ModalMetadata,
        rooms: &[&str],
    ) -> ViewSubmissionPayload {
        let state = serde_json::json!({
            "partial.rooms.v1": {
                "partial.rooms.select": {
                    "selected_options": rooms
                        .iter()
                        .map(|room| serde_json::json!({"value": room}))
                        .collect::<Vec<_>>()
                }
            }
        });
        serde_json::from_value(serde_json::json!({
            "user": {"id": user_id},
            "view": {
                "callback_id": PARTIAL_CALLBACK_ID,
                "private_metadata": metadata.encode(),
                "state": {"values": state}
            }
        }))
        .expect("valid test payload")
    }

    #[tokio::test]
    async fn submit_stores_request_and_records_conversation() {
        let log: EventLog = Arc::default();
        let (service, _) = service(log.clone());

        let id = service.submit(submission_fixture()).await.expect("submission accepted");

        let stored = service.store().get(&id).expect("request stored");
        assert_eq!(stored.status, RequestStatus::Pending);
        assert_eq!(stored.conversation.expect("conversation set").channel_id, "C0FACILITIES");
        assert_eq!(log.lock().expect("log lock").as_slice(), ["post_new:C0FACILITIES"]);
    }

    #[tokio::test]
    async fn failed_post_rolls_the_stored_request_back() {
        let log: EventLog = Arc::default();
        let gateway = RecordingGateway { log: log.clone(), fail_posts: true };
        let email = RecordingEmail { log, sent: Arc::default(), fail: false };
        let store = Arc::new(RequestStore::new(Duration::hours(24)));
        let service = ApprovalFlowService::new(
            store.clone(),
            gateway,
            email,
            "C0FACILITIES",
            vec![APPROVER.to_string()],
            "kitchen@example.org",
            Vec::new(),
        );

        assert!(service.submit(submission_fixture()).await.is_err());
        assert_eq!(store.pending_count(), 0, "failed submissions must not linger");
    }

    #[tokio::test]
    async fn approve_all_commits_once_and_second_click_is_a_noop() {
        let log: EventLog = Arc::default();
        let (service, sent) = service(log.clone());
        let id = service.submit(submission_fixture()).await.expect("submitted");

        service.handle_block_action(button_payload(APPROVER, APPROVE_ALL_ACTION, &id)).await;
        service.handle_block_action(button_payload(APPROVER, APPROVE_ALL_ACTION, &id)).await;

        assert_eq!(sent.lock().expect("sent lock").len(), 1, "exactly one decision email");
        assert_eq!(
            service.store().get(&id).expect("still readable").status,
            RequestStatus::Approved
        );

        let entries = log.lock().expect("log lock").clone();
        assert!(
            entries.iter().any(|entry| entry.starts_with("ephemeral:")),
            "second click answers ephemerally: {entries:?}"
        );
    }

    #[tokio::test]
    async fn decision_email_goes_out_before_the_message_update() {
        let log: EventLog = Arc::default();
        let (service, _) = service(log.clone());
        let id = service.submit(submission_fixture()).await.expect("submitted");

        service.handle_block_action(button_payload(APPROVER, APPROVE_ALL_ACTION, &id)).await;

        let entries = log.lock().expect("log lock").clone();
        let email_at = entries.iter().position(|entry| entry == "email").expect("email sent");
        let update_at = entries
            .iter()
            .position(|entry| entry.starts_with("update:"))
            .expect("message updated");
        assert!(email_at < update_at, "email must precede the edit: {entries:?}");
        assert!(
            entries[update_at].ends_with("actions=false"),
            "edited message must not keep buttons: {entries:?}"
        );
        assert_eq!(entries.last().map(String::as_str), Some("thread_reply"));
    }

    #[tokio::test]
    async fn unauthorized_click_is_rejected_without_touching_the_request() {
        let log: EventLog = Arc::default();
        let (service, sent) = service(log.clone());
        let id = service.submit(submission_fixture()).await.expect("submitted");

        service.handle_block_action(button_payload("U0STRANGER", APPROVE_ALL_ACTION, &id)).await;

        assert!(sent.lock().expect("sent lock").is_empty());
        assert_eq!(service.store().get(&id).expect("unchanged").status, RequestStatus::Pending);
        let entries = log.lock().expect("log lock").clone();
        assert!(entries.iter().any(|entry| entry.contains("not authorized")), "{entries:?}");
    }

    #[tokio::test]
    async fn partial_button_opens_the_room_modal() {
        let log: EventLog = Arc::default();
        let (service, _) = service(log.clone());
        let id = service.submit(submission_fixture()).await.expect("submitted");

        service.handle_block_action(button_payload(APPROVER, PARTIAL_ACTION, &id)).await;

        let entries = log.lock().expect("log lock").clone();
        assert!(
            entries.iter().any(|entry| entry == &format!("open_modal:trigger-1:{PARTIAL_CALLBACK_ID}")),
            "{entries:?}"
        );
        assert_eq!(
            service.store().get(&id).expect("still pending").status,
            RequestStatus::Pending,
            "opening a dialog must not commit anything"
        );
    }

    #[tokio::test]
    async fn unknown_request_id_answers_with_an_expiry_notice() {
        let log: EventLog = Arc::default();
        let (service, _) = service(log.clone());

        let ghost = RequestId("req_ghost".to_string());
        service.handle_block_action(button_payload(APPROVER, APPROVE_ALL_ACTION, &ghost)).await;

        let entries = log.lock().expect("log lock").clone();
        assert!(entries.iter().any(|entry| entry.contains("expired")), "{entries:?}");
    }

    #[tokio::test]
    async fn partial_submission_partitions_rooms_and_commits() {
        let log: EventLog = Arc::default();
        let (service, _) = service(log);
        let id = service.submit(submission_fixture()).await.expect("submitted");
        let stored = service.store().get(&id).expect("stored");
        let metadata =
            ModalMetadata::new(id.clone(), stored.conversation.as_ref().expect("conversation"));

        let outcome = service
            .resolve_view_submission(&partial_submission(APPROVER, &metadata, &["Hall A", "Hall C"]));

        let ViewSubmissionOutcome::Decided { request } = outcome else {
            panic!("expected a committed decision, got {outcome:?}");
        };
        assert_eq!(request.status, RequestStatus::PartiallyApproved);
        let decision = request.decision.expect("decision recorded");
        assert!(matches!(
            decision.kind,
            banquet_core::domain::request::DecisionKind::Partial { ref approved_rooms, ref declined_rooms, .. }
                if approved_rooms == &["Hall A".to_string(), "Hall C".to_string()]
                    && declined_rooms == &["Hall B".to_string()]
        ));
    }

    #[tokio::test]
    async fn partial_submission_with_no_rooms_keeps_the_modal_open() {
        let log: EventLog = Arc::default();
        let (service, _) = service(log);
        let id = service.submit(submission_fixture()).await.expect("submitted");
        let stored = service.store().get(&id).expect("stored");
        let metadata =
            ModalMetadata::new(id.clone(), stored.conversation.as_ref().expect("conversation"));

        let outcome = service.resolve_view_submission(&partial_submission(APPROVER, &metadata, &[]));

        assert_eq!(
            outcome,
            ViewSubmissionOutcome::Errors(HashMap::from([(
                "partial.rooms.v1".to_string(),
                "Select at least one room to approve.".to_string()
            )]))
        );
        assert_eq!(service.store().get(&id).expect("unchanged").status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn email_failure_does_not_roll_back_or_skip_the_message_update() {
        let log: EventLog = Arc::default();
        let gateway = RecordingGateway { log: log.clone(), fail_posts: false };
        let email = RecordingEmail { log: log.clone(), sent: Arc::default(), fail: true };
        let store = Arc::new(RequestStore::new(Duration::hours(24)));
        let service = ApprovalFlowService::new(
            store,
            gateway,
            email,
            "C0FACILITIES",
            vec![APPROVER.to_string()],
            "kitchen@example.org",
            Vec::new(),
        );
        let id = service.submit(submission_fixture()).await.expect("submitted");

        service.handle_block_action(button_payload(APPROVER, APPROVE_ALL_ACTION, &id)).await;

        assert_eq!(
            service.store().get(&id).expect("still readable").status,
            RequestStatus::Approved,
            "the committed decision stands regardless of the email outcome"
        );
        let entries = log.lock().expect("log lock").clone();
        assert!(
            entries.iter().any(|entry| entry.starts_with("update:")),
            "message update must still run: {entries:?}"
        );
    }

    #[tokio::test]
    async fn dialog_submission_after_a_decision_closes_silently() {
        let log: EventLog = Arc::default();
        let (service, sent) = service(log);
        let id = service.submit(submission_fixture()).await.expect("submitted");
        let stored = service.store().get(&id).expect("stored");
        let metadata =
            ModalMetadata::new(id.clone(), stored.conversation.as_ref().expect("conversation"));

        service.handle_block_action(button_payload(APPROVER, APPROVE_ALL_ACTION, &id)).await;
        let emails_after_approve = sent.lock().expect("sent lock").len();

        let outcome =
            service.resolve_view_submission(&partial_submission(APPROVER, &metadata, &["Hall A"]));

        assert_eq!(outcome, ViewSubmissionOutcome::AlreadyDecided);
        assert_eq!(
            sent.lock().expect("sent lock").len(),
            emails_after_approve,
            "losing a race must not send another email"
        );
    }
}
