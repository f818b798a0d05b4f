//! Pure rendering helpers shared by the Slack and email notification paths.
//!
//! All functions are side-effect free: a request in, strings out. Dates and
//! times arrive in the form's wire shapes (`YYYY-MM-DD`, 24h `HH:MM`);
//! unparseable values fall back to the raw input rather than failing a
//! notification that a human already expects.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::America::New_York;

use crate::domain::request::{CateringRequest, DecisionKind, DecisionRecord};

/// `2026-03-20` → `Friday, March 20, 2026`.
pub fn long_event_date(raw: &str) -> String {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => date.format("%A, %B %-d, %Y").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// `18:00` → `6:00 PM`; `00:00` → `12:00 AM`; `12:30` → `12:30 PM`.
pub fn clock_time_12h(raw: &str) -> String {
    match NaiveTime::parse_from_str(raw.trim(), "%H:%M") {
        Ok(time) => time.format("%-I:%M %p").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Decision timestamps are always rendered for the venue's wall clock
/// (America/New_York), e.g. `Mar 20, 2025, 6:00 PM`.
pub fn decision_stamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&New_York).format("%b %-d, %Y, %-I:%M %p").to_string()
}

pub fn status_label(kind: &DecisionKind) -> &'static str {
    match kind {
        DecisionKind::Approved => "APPROVED",
        DecisionKind::Partial { .. } => "PARTIALLY APPROVED",
        DecisionKind::Denied { .. } => "DENIED",
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub body: String,
}

/// Email for a terminal decision, with the full event detail. Partial
/// approvals list both the approved and the declined rooms.
pub fn decision_email(request: &CateringRequest, decision: &DecisionRecord) -> EmailContent {
    let stamp = decision_stamp(decision.decided_at);
    let mut body = String::new();

    match &decision.kind {
        DecisionKind::Approved => {
            body.push_str(&format!(
                "The catering request for \"{}\" has been approved in full.\n",
                request.event_name
            ));
        }
        DecisionKind::Partial { approved_rooms, declined_rooms, note } => {
            body.push_str(&format!(
                "The catering request for \"{}\" has been partially approved.\n\n",
                request.event_name
            ));
            body.push_str(&format!("Approved rooms: {}\n", approved_rooms.join(", ")));
            body.push_str(&format!("Declined rooms: {}\n", declined_rooms.join(", ")));
            if let Some(note) = note {
                body.push_str(&format!("Note from the approver: {note}\n"));
            }
        }
        DecisionKind::Denied { reason } => {
            body.push_str(&format!(
                "The catering request for \"{}\" has been denied.\n\nReason: {reason}\n",
                request.event_name
            ));
        }
    }

    body.push_str(&format!("\nDecided by {} on {stamp}.\n\n", decision.actor_user_id));
    body.push_str(&event_detail_block(request));

    EmailContent { subject: decision_subject(request, &decision.kind), body }
}

fn decision_subject(request: &CateringRequest, kind: &DecisionKind) -> String {
    let verdict = match kind {
        DecisionKind::Approved => "approved",
        DecisionKind::Partial { .. } => "partially approved",
        DecisionKind::Denied { .. } => "denied",
    };
    format!(
        "Catering request {verdict}: {} on {}",
        request.event_name,
        long_event_date(&request.event_date)
    )
}

/// Plain-text event summary appended to every decision email.
pub fn event_detail_block(request: &CateringRequest) -> String {
    let mut detail = String::new();
    detail.push_str("Event details\n");
    detail.push_str(&format!("  Event:    {}\n", request.event_name));
    detail.push_str(&format!("  Client:   {}\n", request.client_name));
    detail.push_str(&format!("  Date:     {}\n", long_event_date(&request.event_date)));
    detail.push_str(&format!("  Guests:   {}\n", request.guest_count));
    detail.push_str(&format!("  Rooms:    {}\n", request.rooms.join(", ")));
    detail.push_str(&format!(
        "  Setup:    {} {}\n",
        long_event_date(&request.timeline.setup.date),
        clock_time_12h(&request.timeline.setup.time)
    ));
    detail.push_str(&format!(
        "  Event:    {} - {}\n",
        clock_time_12h(&request.timeline.event_start.time),
        clock_time_12h(&request.timeline.event_end.time)
    ));
    detail.push_str(&format!(
        "  Teardown: {} {}\n",
        long_event_date(&request.timeline.teardown.date),
        clock_time_12h(&request.timeline.teardown.time)
    ));
    if let Some(officiant) = &request.officiant {
        detail.push_str(&format!("  Officiant: {officiant}\n"));
    }
    if let Some(notes) = &request.notes {
        detail.push_str(&format!("  Notes:    {notes}\n"));
    }
    detail.push_str(&format!(
        "  Parking:  {}\n  Music:    {}\n",
        if request.parking_needed { "yes" } else { "no" },
        if request.music_requested { "yes" } else { "no" }
    ));
    detail.push_str(&format!(
        "  Planner:  {} <{}> {}\n",
        request.planner.name, request.planner.email, request.planner.phone
    ));
    detail
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{clock_time_12h, decision_email, decision_stamp, long_event_date, status_label};
    use crate::domain::request::{
        submission_fixture, CateringRequest, DecisionKind, DecisionRecord,
    };

    #[test]
    fn event_dates_render_with_weekday_and_full_month() {
        assert_eq!(long_event_date("2026-03-20"), "Friday, March 20, 2026");
        assert_eq!(long_event_date("2025-01-01"), "Wednesday, January 1, 2025");
    }

    #[test]
    fn unparseable_dates_fall_back_to_raw_input() {
        assert_eq!(long_event_date("next Friday"), "next Friday");
    }

    #[test]
    fn times_render_twelve_hour_without_leading_zero() {
        assert_eq!(clock_time_12h("18:00"), "6:00 PM");
        assert_eq!(clock_time_12h("00:00"), "12:00 AM");
        assert_eq!(clock_time_12h("12:30"), "12:30 PM");
        assert_eq!(clock_time_12h("09:05"), "9:05 AM");
    }

    #[test]
    fn decision_stamps_use_new_york_wall_clock() {
        // 22:00 UTC on 2025-03-20 is 6:00 PM EDT.
        let at = Utc.with_ymd_and_hms(2025, 3, 20, 22, 0, 0).single().expect("valid instant");
        assert_eq!(decision_stamp(at), "Mar 20, 2025, 6:00 PM");

        // 17:00 UTC on 2025-01-10 is noon EST.
        let winter = Utc.with_ymd_and_hms(2025, 1, 10, 17, 0, 0).single().expect("valid instant");
        assert_eq!(decision_stamp(winter), "Jan 10, 2025, 12:00 PM");
    }

    #[test]
    fn partial_decision_email_lists_both_room_partitions() {
        let request =
            CateringRequest::from_submission(submission_fixture()).expect("valid submission");
        let decision = DecisionRecord {
            actor_user_id: "U12345".to_string(),
            decided_at: Utc.with_ymd_and_hms(2025, 3, 20, 22, 0, 0).single().expect("instant"),
            kind: DecisionKind::Partial {
                approved_rooms: vec!["Hall A".to_string(), "Hall C".to_string()],
                declined_rooms: vec!["Hall B".to_string()],
                note: Some("Hall B is under renovation".to_string()),
            },
        };

        let email = decision_email(&request, &decision);

        assert!(email.subject.contains("partially approved"));
        assert!(email.body.contains("Approved rooms: Hall A, Hall C"));
        assert!(email.body.contains("Declined rooms: Hall B"));
        assert!(email.body.contains("Hall B is under renovation"));
        assert!(email.body.contains("Mar 20, 2025, 6:00 PM"));
        assert!(email.body.contains("Friday, March 20, 2026"));
    }

    #[test]
    fn denial_email_carries_the_reason() {
        let request =
            CateringRequest::from_submission(submission_fixture()).expect("valid submission");
        let decision = DecisionRecord {
            actor_user_id: "U12345".to_string(),
            decided_at: Utc::now(),
            kind: DecisionKind::Denied { reason: "Calendar conflict".to_string() },
        };

        let email = decision_email(&request, &decision);
        assert!(email.subject.contains("denied"));
        assert!(email.body.contains("Reason: Calendar conflict"));
        assert_eq!(status_label(&decision.kind), "DENIED");
    }
}
