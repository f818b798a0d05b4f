//! Approval lifecycle as a pure transition table.
//!
//! The three inbound legs of a decision (button click, dialog open, dialog
//! submit) arrive as independent HTTP calls, possibly on different process
//! instances. The machine therefore never assumes in-process continuity: the
//! AWAITING_* states are implied by the dialog in flight (its metadata names
//! the request), while the store only ever records PENDING or a terminal
//! status.

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalState {
    Pending,
    AwaitingPartialDetail,
    AwaitingDenyReason,
    Approved,
    PartiallyApproved,
    Denied,
    Expired,
}

impl ApprovalState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::PartiallyApproved | Self::Denied | Self::Expired)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalEvent {
    ApproveAll,
    RequestPartialDetail,
    RequestDenyReason,
    PartialDetailSubmitted,
    DenyReasonSubmitted,
    TtlElapsed,
}

/// Facts the caller established about the triggering interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardContext {
    pub actor_is_approver: bool,
    pub selected_room_count: usize,
    pub reason: Option<String>,
}

impl GuardContext {
    pub fn for_button(actor_is_approver: bool) -> Self {
        Self { actor_is_approver, selected_room_count: 0, reason: None }
    }

    pub fn for_partial_submission(actor_is_approver: bool, selected_room_count: usize) -> Self {
        Self { actor_is_approver, selected_room_count, reason: None }
    }

    pub fn for_deny_submission(actor_is_approver: bool, reason: impl Into<String>) -> Self {
        Self { actor_is_approver, selected_room_count: 0, reason: Some(reason.into()) }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowAction {
    SendDecisionNotifications,
    OpenPartialDetailDialog,
    OpenDenyReasonDialog,
    DropFromStore,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub from: ApprovalState,
    pub to: ApprovalState,
    pub actions: Vec<WorkflowAction>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("actor is not an authorized approver")]
    Unauthorized,
    #[error("at least one room must be selected")]
    NoRoomsSelected,
    #[error("a denial reason is required")]
    EmptyReason,
    #[error("no transition from {from:?} on {event:?}")]
    Invalid { from: ApprovalState, event: ApprovalEvent },
}

/// Applies one event. Terminal states absorb everything: any further event is
/// `Invalid`, which callers surface as an idempotent no-op rather than a
/// second round of notifications.
pub fn transition(
    current: ApprovalState,
    event: ApprovalEvent,
    ctx: &GuardContext,
) -> Result<TransitionOutcome, TransitionError> {
    use ApprovalEvent::*;
    use ApprovalState::*;

    let invalid = || TransitionError::Invalid { from: current, event };

    let (to, actions) = match (current, event) {
        (Pending, ApproveAll) => {
            require_approver(ctx)?;
            (Approved, vec![WorkflowAction::SendDecisionNotifications])
        }
        (Pending, RequestPartialDetail) => {
            require_approver(ctx)?;
            (AwaitingPartialDetail, vec![WorkflowAction::OpenPartialDetailDialog])
        }
        (Pending, RequestDenyReason) => {
            require_approver(ctx)?;
            (AwaitingDenyReason, vec![WorkflowAction::OpenDenyReasonDialog])
        }
        (AwaitingPartialDetail, PartialDetailSubmitted) => {
            require_approver(ctx)?;
            if ctx.selected_room_count == 0 {
                return Err(TransitionError::NoRoomsSelected);
            }
            (PartiallyApproved, vec![WorkflowAction::SendDecisionNotifications])
        }
        (AwaitingDenyReason, DenyReasonSubmitted) => {
            require_approver(ctx)?;
            if ctx.reason.as_deref().map(str::trim).unwrap_or("").is_empty() {
                return Err(TransitionError::EmptyReason);
            }
            (Denied, vec![WorkflowAction::SendDecisionNotifications])
        }
        (Pending | AwaitingPartialDetail | AwaitingDenyReason, TtlElapsed) => {
            (Expired, vec![WorkflowAction::DropFromStore])
        }
        _ => return Err(invalid()),
    };

    Ok(TransitionOutcome { from: current, to, actions })
}

fn require_approver(ctx: &GuardContext) -> Result<(), TransitionError> {
    if ctx.actor_is_approver {
        Ok(())
    } else {
        Err(TransitionError::Unauthorized)
    }
}
