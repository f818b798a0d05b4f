//! HTTP surface: the public form submission endpoint and the interactivity
//! webhook.
//!
//! The webhook path acks fast: verify the signature on the raw body, parse,
//! then either answer the dialog synchronously (`response_action`) or spawn
//! the slow work and return an empty 200 before the platform's timeout.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::{info, warn};

use banquet_core::domain::request::SubmitRequestPayload;
use banquet_core::verify::SignatureVerifier;
use banquet_slack::approval::{ApprovalFlowService, SubmitError, ViewSubmissionOutcome};
use banquet_slack::gateway::{ChatGateway, EmailSender};
use banquet_slack::interactions::{parse_interaction_body, Interaction};

const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
const SIGNATURE_HEADER: &str = "x-slack-signature";

pub struct ApiState<G, E> {
    pub service: Arc<ApprovalFlowService<G, E>>,
    pub verifier: Arc<SignatureVerifier>,
}

impl<G, E> Clone for ApiState<G, E> {
    fn clone(&self) -> Self {
        Self { service: self.service.clone(), verifier: self.verifier.clone() }
    }
}

pub fn router<G, E>(state: ApiState<G, E>) -> Router
where
    G: ChatGateway + 'static,
    E: EmailSender + 'static,
{
    Router::new()
        .route("/api/submit-request", post(submit_request::<G, E>))
        .route("/api/slack/interactions", post(interactions::<G, E>))
        .with_state(state)
}

async fn submit_request<G, E>(
    State(state): State<ApiState<G, E>>,
    Json(payload): Json<SubmitRequestPayload>,
) -> Response
where
    G: ChatGateway + 'static,
    E: EmailSender + 'static,
{
    match state.service.submit(payload).await {
        Ok(id) => Json(json!({ "success": true, "requestId": id })).into_response(),
        Err(SubmitError::Validation(validation_error)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "success": false, "error": validation_error.to_string() })),
        )
            .into_response(),
        Err(SubmitError::Send(send_error)) => {
            warn!(event_name = "submit_post_failed", error = %send_error, "approval message could not be posted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": "failed to deliver the request for approval" })),
            )
                .into_response()
        }
    }
}

async fn interactions<G, E>(
    State(state): State<ApiState<G, E>>,
    headers: HeaderMap,
    body: String,
) -> Response
where
    G: ChatGateway + 'static,
    E: EmailSender + 'static,
{
    let timestamp = header_str(&headers, TIMESTAMP_HEADER);
    let signature = header_str(&headers, SIGNATURE_HEADER);

    if let Err(verify_error) = state.verifier.verify(&body, signature, timestamp) {
        warn!(event_name = "interaction_rejected", error = %verify_error, "signature verification failed");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let interaction = match parse_interaction_body(&body) {
        Ok(interaction) => interaction,
        Err(parse_error) => {
            warn!(event_name = "interaction_unparseable", error = %parse_error);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match interaction {
        Interaction::BlockActions(payload) => {
            // Ack immediately; the click is handled after the response.
            let service = state.service.clone();
            tokio::spawn(async move { service.handle_block_action(payload).await });
            StatusCode::OK.into_response()
        }
        Interaction::ViewSubmission(payload) => match state.service.resolve_view_submission(&payload) {
            ViewSubmissionOutcome::Decided { request } => {
                let service = state.service.clone();
                tokio::spawn(async move { service.notify_decided(&request).await });
                Json(json!({ "response_action": "clear" })).into_response()
            }
            ViewSubmissionOutcome::Errors(errors) => {
                Json(json!({ "response_action": "errors", "errors": errors })).into_response()
            }
            ViewSubmissionOutcome::AlreadyDecided => {
                info!(event_name = "view_submission_raced", "decision landed elsewhere first");
                Json(json!({ "response_action": "clear" })).into_response()
            }
            ViewSubmissionOutcome::Ignored => StatusCode::OK.into_response(),
        },
        Interaction::Unsupported => StatusCode::OK.into_response(),
    }
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> &'h str {
    headers.get(name).and_then(|value| value.to_str().ok()).unwrap_or_default()
}
