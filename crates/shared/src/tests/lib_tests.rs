use chrono::NaiveDate;
use serde_json::json;

use crate::{
    domain::{
        CampaignPhase, CandidateResource, DayOfWeek, LifecycleAction, ReservationRequest,
        ReservationStatus, ResourceId, TimeRange,
    },
    error::ValidationError,
    protocol::{
        CampaignStatus, CourseProgress, CourseProgressResponse, CreateReservationBody,
        EnrolledStudentsResponse, MutationResponse, SearchQuery,
    },
};

fn march_tenth() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).expect("date")
}

#[test]
fn time_range_rejects_equal_and_inverted_bounds() {
    for (start, end) in [("08:00", "08:00"), ("10:00", "08:00"), ("23:59", "00:00")] {
        let err = TimeRange::parse(start, end).expect_err("must reject");
        assert!(
            matches!(err, ValidationError::InvertedTimeRange { .. }),
            "unexpected error for {start}-{end}: {err:?}"
        );
    }
}

#[test]
fn time_range_reports_missing_and_malformed_fields() {
    assert_eq!(
        TimeRange::parse("", "10:00").expect_err("missing"),
        ValidationError::MissingField("start_time")
    );
    assert!(matches!(
        TimeRange::parse("08:00", "ten").expect_err("malformed"),
        ValidationError::InvalidTime {
            field: "end_time",
            ..
        }
    ));
}

#[test]
fn time_range_accepts_seconds_and_formats_without_them() {
    let window = TimeRange::parse("08:00:00", "10:30").expect("window");
    assert_eq!(window.to_string(), "08:00-10:30");
}

#[test]
fn lifecycle_transitions_follow_reservation_state_machine() {
    use LifecycleAction::*;
    use ReservationStatus::*;

    assert_eq!(Pending.after(Approve), Some(Approved));
    assert_eq!(Pending.after(Reject), Some(Rejected));
    assert_eq!(Pending.after(Cancel), Some(Cancelled));
    assert_eq!(Approved.after(Cancel), Some(Cancelled));
    assert_eq!(Approved.after(Approve), None);
    assert_eq!(Approved.after(Reject), None);
    for terminal in [Rejected, Cancelled] {
        for action in [Approve, Reject, Cancel] {
            assert!(!terminal.allows(action));
        }
    }
}

#[test]
fn reservation_request_requires_purpose_and_resource() {
    let window = TimeRange::parse("08:00", "10:00").expect("window");
    assert_eq!(
        ReservationRequest::new(march_tenth(), window, ResourceId::from("A1"), "   ")
            .expect_err("blank purpose"),
        ValidationError::EmptyPurpose
    );
    assert_eq!(
        ReservationRequest::new(march_tenth(), window, ResourceId::from(""), "Makeup class")
            .expect_err("no resource"),
        ValidationError::NoSelection
    );
}

#[test]
fn create_body_uses_wire_formats() {
    let window = TimeRange::parse("08:00", "10:00").expect("window");
    let request =
        ReservationRequest::new(march_tenth(), window, ResourceId::from("A1"), "Makeup class")
            .expect("request");
    let body = serde_json::to_value(CreateReservationBody::from(&request)).expect("json");
    assert_eq!(
        body,
        json!({
            "classroom_id": "A1",
            "date": "2025-03-10",
            "start_time": "08:00",
            "end_time": "10:00",
            "purpose": "Makeup class"
        })
    );

    let query = SearchQuery::new(march_tenth(), window);
    assert_eq!(query.date, "2025-03-10");
    assert_eq!(query.start_time, "08:00");
}

#[test]
fn candidate_tolerates_missing_type_and_location() {
    let candidate: CandidateResource =
        serde_json::from_value(json!({"id": "A1", "code": "LAB-3", "name": "LAB-3", "capacity": 30}))
            .expect("candidate");
    assert_eq!(candidate.id, ResourceId::from("A1"));
    assert!(candidate.kind.is_empty());
    assert!(candidate.location.is_empty());

    let typed: CandidateResource = serde_json::from_value(json!({
        "id": "B2", "code": "AULA-1", "name": "Aula 1", "type": "AULA",
        "location": "Pabellon B", "capacity": 40
    }))
    .expect("candidate");
    assert_eq!(typed.kind, "AULA");
}

#[test]
fn failure_messages_prefer_error_list() {
    let listed: MutationResponse = serde_json::from_value(json!({
        "success": false,
        "errors": ["Schedule conflict", "Quota exceeded"],
        "error": "ignored"
    }))
    .expect("response");
    assert_eq!(
        listed.failure_messages(),
        vec!["Schedule conflict".to_string(), "Quota exceeded".to_string()]
    );

    let single: MutationResponse =
        serde_json::from_value(json!({"success": false, "error": "Not found"})).expect("response");
    assert_eq!(single.failure_messages(), vec!["Not found".to_string()]);

    let bare: MutationResponse =
        serde_json::from_value(json!({"success": false})).expect("response");
    assert!(bare.failure_messages().is_empty());
}

#[test]
fn day_of_week_uses_backend_names() {
    assert_eq!(
        serde_json::to_value(DayOfWeek::Wednesday).expect("json"),
        json!("MIERCOLES")
    );
    assert_eq!(
        DayOfWeek::parse("day_of_week", "friday").expect("day"),
        DayOfWeek::Friday
    );
    assert_eq!(
        DayOfWeek::parse("day_of_week", "").expect_err("missing"),
        ValidationError::MissingField("day_of_week")
    );
}

#[test]
fn unknown_campaign_phase_decodes_as_unknown() {
    let status: CampaignStatus = serde_json::from_value(json!({
        "course_id": "c-1",
        "status": "ARCHIVED"
    }))
    .expect("status");
    assert_eq!(status.status, CampaignPhase::Unknown);
    assert_eq!(status.postulations, 0);
}

#[test]
fn progress_reply_counts_completed_sessions() {
    let reply: CourseProgressResponse = serde_json::from_value(json!({
        "course_name": "Networks",
        "group_name": "Group A",
        "syllabus_data": [
            { "unit_name": "Unit 1", "sessions": [
                { "number": 1, "topic": "Intro", "is_completed": true },
                { "number": 2, "topic": "Layers", "is_completed": false }
            ]},
            { "unit_name": "Unit 2", "sessions": [
                { "number": 3, "topic": "Routing", "is_completed": true }
            ]}
        ]
    }))
    .expect("progress");

    let progress: CourseProgress = reply.into_result().expect("no error field");
    assert_eq!(progress.group_name, "Group A");
    assert_eq!(progress.session_count(), 3);
    assert_eq!(progress.completed_count(), 2);
}

#[test]
fn progress_error_reply_is_an_error() {
    let reply: CourseProgressResponse =
        serde_json::from_value(json!({ "error": "Group not found" })).expect("error shape");
    assert_eq!(reply.into_result(), Err("Group not found".to_string()));
}

#[test]
fn enrolled_students_default_optional_columns() {
    let reply: EnrolledStudentsResponse = serde_json::from_value(json!({
        "students": [{ "order": 1, "full_name": "Ana Torres" }]
    }))
    .expect("students");
    assert_eq!(reply.students[0].email, "");
    assert!(!reply.students[0].has_conflict);
}
