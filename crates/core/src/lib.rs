//! Domain core for the banquet catering approval relay.
//!
//! Everything here is transport-free: the request model and validation, the
//! in-memory store, the approval state machine, notification formatting, and
//! inbound signature verification. The `banquet-slack` and `banquet-server`
//! crates layer the messaging platform and HTTP surface on top.

pub mod config;
pub mod domain;
pub mod errors;
pub mod format;
pub mod store;
pub mod verify;
pub mod workflow;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::request::{
    CateringRequest, ConversationRef, DecisionKind, DecisionRecord, PlannerContact, RequestId,
    RequestStatus, SubmitRequestPayload, Timeline, TimelineSlot,
};
pub use errors::DomainError;
pub use store::{RequestStore, ResolveError};
pub use verify::{SignatureVerifier, VerifyError};
pub use workflow::{
    transition, ApprovalEvent, ApprovalState, GuardContext, TransitionError, TransitionOutcome,
    WorkflowAction,
};
