use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generates an unguessable opaque token. The id is the only request
    /// datum ever embedded in client-visible button values.
    pub fn generate() -> Self {
        Self(format!("req_{}", Uuid::new_v4().simple()))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel + message timestamp pair for later in-place edits of the
/// original approval message, independent of which inbound path asks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRef {
    pub channel_id: String,
    pub message_ts: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    PartiallyApproved,
    Denied,
    Expired,
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineSlot {
    pub date: String,
    pub time: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    pub setup: TimelineSlot,
    pub event_start: TimelineSlot,
    pub event_end: TimelineSlot,
    pub teardown: TimelineSlot,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Approved,
    Partial { approved_rooms: Vec<String>, declined_rooms: Vec<String>, note: Option<String> },
    Denied { reason: String },
}

impl DecisionKind {
    pub fn status(&self) -> RequestStatus {
        match self {
            Self::Approved => RequestStatus::Approved,
            Self::Partial { .. } => RequestStatus::PartiallyApproved,
            Self::Denied { .. } => RequestStatus::Denied,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub actor_user_id: String,
    pub decided_at: DateTime<Utc>,
    pub kind: DecisionKind,
}

/// The central entity: one submitted catering request, held in memory while
/// awaiting a decision. `rooms` never changes after creation; a partial
/// decision partitions it inside the decision record instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CateringRequest {
    pub id: RequestId,
    pub event_name: String,
    pub client_name: String,
    pub event_date: String,
    pub guest_count: u32,
    pub rooms: Vec<String>,
    pub planner: PlannerContact,
    pub timeline: Timeline,
    pub officiant: Option<String>,
    pub notes: Option<String>,
    pub parking_needed: bool,
    pub music_requested: bool,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub conversation: Option<ConversationRef>,
    pub decision: Option<DecisionRecord>,
}

/// Submission body of `POST /api/submit-request`. Field names mirror the web
/// form; older form revisions used `expectedGuests`, `roomsRequested` and
/// `partyPlanner*`, kept as aliases.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequestPayload {
    pub event_name: String,
    pub client_name: String,
    pub event_date: String,
    #[serde(alias = "expectedGuests")]
    pub guest_count: u32,
    #[serde(alias = "roomsRequested")]
    pub rooms: Vec<String>,
    #[serde(alias = "partyPlannerName")]
    pub planner_name: String,
    #[serde(alias = "partyPlannerEmail")]
    pub planner_email: String,
    #[serde(alias = "partyPlannerPhone")]
    pub planner_phone: String,
    pub setup_date: String,
    pub setup_time: String,
    pub event_start_date: String,
    pub event_start_time: String,
    pub event_end_date: String,
    pub event_end_time: String,
    pub teardown_date: String,
    pub teardown_time: String,
    #[serde(default)]
    pub officiant: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub parking_needed: bool,
    #[serde(default)]
    pub music_requested: bool,
}

impl CateringRequest {
    pub fn from_submission(payload: SubmitRequestPayload) -> Result<Self, DomainError> {
        validate_submission(&payload)?;

        let rooms = payload
            .rooms
            .into_iter()
            .map(|room| room.trim().to_string())
            .filter(|room| !room.is_empty())
            .collect();

        Ok(Self {
            id: RequestId::generate(),
            event_name: payload.event_name.trim().to_string(),
            client_name: payload.client_name.trim().to_string(),
            event_date: payload.event_date.trim().to_string(),
            guest_count: payload.guest_count,
            rooms,
            planner: PlannerContact {
                name: payload.planner_name.trim().to_string(),
                email: payload.planner_email.trim().to_string(),
                phone: payload.planner_phone.trim().to_string(),
            },
            timeline: Timeline {
                setup: TimelineSlot { date: payload.setup_date, time: payload.setup_time },
                event_start: TimelineSlot {
                    date: payload.event_start_date,
                    time: payload.event_start_time,
                },
                event_end: TimelineSlot {
                    date: payload.event_end_date,
                    time: payload.event_end_time,
                },
                teardown: TimelineSlot {
                    date: payload.teardown_date,
                    time: payload.teardown_time,
                },
            },
            officiant: normalize_optional(payload.officiant),
            notes: normalize_optional(payload.notes),
            parking_needed: payload.parking_needed,
            music_requested: payload.music_requested,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
            conversation: None,
            decision: None,
        })
    }

    /// Rooms the caterer declined, given the approved subset of a partial
    /// decision. Preserves the original submission order.
    pub fn declined_rooms(&self, approved: &[String]) -> Vec<String> {
        self.rooms.iter().filter(|room| !approved.contains(room)).cloned().collect()
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.map(|text| text.trim().to_string()).filter(|text| !text.is_empty())
}

fn validate_submission(payload: &SubmitRequestPayload) -> Result<(), DomainError> {
    let mut problems = Vec::new();

    for (field, value) in [
        ("eventName", &payload.event_name),
        ("clientName", &payload.client_name),
        ("partyPlannerName", &payload.planner_name),
        ("partyPlannerPhone", &payload.planner_phone),
    ] {
        if value.trim().is_empty() {
            problems.push(format!("`{field}` is required"));
        }
    }

    if !payload.planner_email.contains('@') {
        problems.push("`partyPlannerEmail` must be a valid email address".to_string());
    }

    if payload.guest_count == 0 {
        problems.push("`guestCount` must be greater than zero".to_string());
    }

    if payload.rooms.iter().all(|room| room.trim().is_empty()) {
        problems.push("at least one room must be requested".to_string());
    }

    if NaiveDate::parse_from_str(payload.event_date.trim(), "%Y-%m-%d").is_err() {
        problems.push(format!("`eventDate` must be YYYY-MM-DD, got `{}`", payload.event_date));
    }

    for (field, value) in [
        ("setupTime", &payload.setup_time),
        ("eventStartTime", &payload.event_start_time),
        ("eventEndTime", &payload.event_end_time),
        ("teardownTime", &payload.teardown_time),
    ] {
        if NaiveTime::parse_from_str(value.trim(), "%H:%M").is_err() {
            problems.push(format!("`{field}` must be HH:MM, got `{value}`"));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(DomainError::Validation(problems.join("; ")))
    }
}

#[cfg(test)]
pub(crate) fn submission_fixture() -> SubmitRequestPayload {
    SubmitRequestPayload {
        event_name: "Spring Gala".to_string(),
        client_name: "Friends of the Library".to_string(),
        event_date: "2026-03-20".to_string(),
        guest_count: 120,
        rooms: vec!["Hall A".to_string(), "Hall B".to_string(), "Hall C".to_string()],
        planner_name: "Dana Reyes".to_string(),
        planner_email: "dana@example.org".to_string(),
        planner_phone: "555-0142".to_string(),
        setup_date: "2026-03-20".to_string(),
        setup_time: "14:00".to_string(),
        event_start_date: "2026-03-20".to_string(),
        event_start_time: "18:00".to_string(),
        event_end_date: "2026-03-20".to_string(),
        event_end_time: "22:00".to_string(),
        teardown_date: "2026-03-20".to_string(),
        teardown_time: "23:30".to_string(),
        officiant: None,
        notes: Some("Vegetarian menu".to_string()),
        parking_needed: true,
        music_requested: false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{submission_fixture, CateringRequest, RequestId, RequestStatus};
    use crate::errors::DomainError;

    #[test]
    fn submission_produces_pending_request_with_trimmed_fields() {
        let mut payload = submission_fixture();
        payload.event_name = "  Spring Gala  ".to_string();
        payload.rooms.push("   ".to_string());

        let request = CateringRequest::from_submission(payload).expect("valid submission");

        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.event_name, "Spring Gala");
        assert_eq!(request.rooms, vec!["Hall A", "Hall B", "Hall C"]);
        assert!(request.conversation.is_none());
        assert!(request.decision.is_none());
    }

    #[test]
    fn generated_ids_do_not_collide() {
        let ids: HashSet<String> = (0..1000).map(|_| RequestId::generate().0).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.starts_with("req_")));
    }

    #[test]
    fn submission_with_no_rooms_is_rejected() {
        let mut payload = submission_fixture();
        payload.rooms = vec![" ".to_string()];

        let error = CateringRequest::from_submission(payload).expect_err("should fail");
        assert!(matches!(
            error,
            DomainError::Validation(ref message) if message.contains("at least one room")
        ));
    }

    #[test]
    fn submission_with_malformed_date_and_time_reports_both() {
        let mut payload = submission_fixture();
        payload.event_date = "03/20/2026".to_string();
        payload.event_start_time = "6pm".to_string();

        let error = CateringRequest::from_submission(payload).expect_err("should fail");
        let DomainError::Validation(message) = error;
        assert!(message.contains("eventDate"));
        assert!(message.contains("eventStartTime"));
    }

    #[test]
    fn declined_rooms_preserve_submission_order() {
        let request =
            CateringRequest::from_submission(submission_fixture()).expect("valid submission");

        let declined = request.declined_rooms(&["Hall C".to_string(), "Hall A".to_string()]);
        assert_eq!(declined, vec!["Hall B".to_string()]);
    }

    #[test]
    fn terminal_statuses_are_every_status_but_pending() {
        assert!(!RequestStatus::Pending.is_terminal());
        for status in [
            RequestStatus::Approved,
            RequestStatus::PartiallyApproved,
            RequestStatus::Denied,
            RequestStatus::Expired,
        ] {
            assert!(status.is_terminal());
        }
    }
}
