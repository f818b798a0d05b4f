//! Shared fixtures for this crate's tests.

use banquet_core::domain::request::{CateringRequest, SubmitRequestPayload};

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

pub(crate) fn request_fixture() -> CateringRequest {
    CateringRequest::from_submission(submission_fixture()).expect("fixture submission is valid")
}
