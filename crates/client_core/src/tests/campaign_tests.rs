use super::*;
use crate::test_support::{campaign_status, Call, FakeApi};
use shared::domain::CampaignPhase;
use tokio::sync::broadcast::error::RecvError;

fn lab_details() -> LabDetails {
    LabDetails {
        day: "LUNES".to_string(),
        start_time: "14:00".to_string(),
        end_time: "16:00".to_string(),
        room: "LAB-3".to_string(),
    }
}

#[tokio::test]
async fn poll_once_reports_each_card_and_skips_failures() {
    let api = Arc::new(FakeApi::new());
    api.set_campaign_status("c-2", Err(RemoteError::Transport("timeout".into())))
        .await;
    let poller = CampaignPoller::new(
        api.clone(),
        vec![CourseId::from("c-1"), CourseId::from("c-2")],
        DEFAULT_POLL_PERIOD,
    );
    let mut rx = poller.subscribe();

    let updated = poller.poll_once().await;
    assert_eq!(updated, vec![campaign_status("c-1", CampaignPhase::Open)]);

    let mut events = vec![
        rx.recv().await.expect("event"),
        rx.recv().await.expect("event"),
    ];
    events.sort_by_key(|event| matches!(event, CampaignEvent::PollFailed { .. }));
    assert!(matches!(events[0], CampaignEvent::StatusUpdated(_)));
    assert!(matches!(
        &events[1],
        CampaignEvent::PollFailed { course_id, .. } if course_id.as_str() == "c-2"
    ));
}

#[tokio::test]
async fn poller_without_cards_never_starts() {
    let api = Arc::new(FakeApi::new());
    let poller = CampaignPoller::new(api.clone(), Vec::new(), DEFAULT_POLL_PERIOD);
    assert!(poller.start().is_none());
    assert_eq!(api.network_calls().await, 0);
}

#[tokio::test(start_paused = true)]
async fn first_refresh_happens_one_period_after_start() {
    let api = Arc::new(FakeApi::new());
    let poller = CampaignPoller::new(
        api.clone(),
        vec![CourseId::from("c-1")],
        Duration::from_secs(30),
    );
    let mut rx = poller.subscribe();
    let started = Instant::now();
    let handle = poller.start().expect("cards present");
    assert!(handle.is_running());

    let event = rx.recv().await.expect("first refresh");
    assert!(matches!(event, CampaignEvent::StatusUpdated(_)));
    assert!(started.elapsed() >= Duration::from_secs(30));

    rx.recv().await.expect("second refresh");
    assert!(started.elapsed() >= Duration::from_secs(60));
    assert_eq!(
        api.calls().await,
        vec![
            Call::CampaignStatus(CourseId::from("c-1")),
            Call::CampaignStatus(CourseId::from("c-1")),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_polling() {
    let api = Arc::new(FakeApi::new());
    let poller = CampaignPoller::new(
        api.clone(),
        vec![CourseId::from("c-1")],
        Duration::from_secs(30),
    );
    let mut rx = poller.subscribe();
    let handle = poller.start().expect("cards present");
    handle.stop();

    assert!(matches!(rx.recv().await, Err(RecvError::Closed)));
    assert_eq!(api.network_calls().await, 0);
}

#[tokio::test]
async fn opening_the_dialog_loads_details() {
    let api = FakeApi::new();
    api.set_lab_details(Ok(lab_details())).await;
    let mut dialog = PostulationDialog::new();

    let lab_id = dialog.open(CampaignId::from("camp-1"), LabId::from("lab-9"));
    assert_eq!(dialog.details(), &LabDetailsView::Loading);
    assert_eq!(dialog.details().time(), "--:--");

    dialog.load_details(&api, &lab_id).await;
    assert_eq!(dialog.details().day(), "LUNES");
    assert_eq!(dialog.details().time(), "14:00 - 16:00");
    assert_eq!(dialog.details().room(), "LAB-3");
}

#[test]
fn details_for_a_previous_lab_are_dropped() {
    let mut dialog = PostulationDialog::new();
    dialog.open(CampaignId::from("camp-1"), LabId::from("lab-1"));
    dialog.open(CampaignId::from("camp-1"), LabId::from("lab-2"));
    dialog.apply_details(&LabId::from("lab-1"), Ok(lab_details()));
    assert_eq!(dialog.details(), &LabDetailsView::Loading);
}

#[test]
fn failed_details_show_placeholder() {
    let mut dialog = PostulationDialog::new();
    let lab_id = dialog.open(CampaignId::from("camp-1"), LabId::from("lab-1"));
    dialog.apply_details(&lab_id, Err(RemoteError::Transport("refused".into())));
    assert_eq!(dialog.details().day(), DETAILS_UNAVAILABLE);
}

#[tokio::test]
async fn successful_postulation_closes_dialog() {
    let api = FakeApi::new();
    let mut dialog = PostulationDialog::new();
    dialog.open(CampaignId::from("camp-1"), LabId::from("lab-9"));

    assert!(dialog.confirm(&api).await.expect("posted"));
    assert!(!dialog.is_open());
    assert_eq!(
        dialog.notice().map(|notice| notice.level),
        Some(NoticeLevel::Success)
    );
    assert_eq!(
        api.calls().await,
        vec![Call::Postulate(PostulationRequest {
            campaign_id: CampaignId::from("camp-1"),
            lab_id: LabId::from("lab-9"),
        })]
    );
}

#[tokio::test]
async fn business_failure_keeps_dialog_open() {
    let api = FakeApi::new();
    api.push_mutation(Err(RemoteError::business(["No seats left", "Schedule clash"])))
        .await;
    let mut dialog = PostulationDialog::new();
    dialog.open(CampaignId::from("camp-1"), LabId::from("lab-9"));

    dialog.confirm(&api).await.expect_err("refused");
    assert!(dialog.is_open());
    assert_eq!(dialog.confirm_state(), ControlState::Enabled);
    assert_eq!(
        dialog.notice().map(|notice| notice.text.as_str()),
        Some("No seats left, Schedule clash")
    );
}

#[test]
fn business_failure_without_messages_uses_fallback() {
    let mut dialog = PostulationDialog::new();
    dialog.open(CampaignId::from("camp-1"), LabId::from("lab-9"));
    dialog.begin_confirm().expect("request");
    dialog
        .finish_confirm(Err(RemoteError::business(Vec::<String>::new())))
        .expect_err("refused");
    assert_eq!(
        dialog.notice().map(|notice| notice.text.as_str()),
        Some(UNKNOWN_POSTULATION_ERROR)
    );
}

#[tokio::test]
async fn transport_failure_closes_dialog() {
    let api = FakeApi::new();
    api.push_mutation(Err(RemoteError::Transport("reset".into())))
        .await;
    let mut dialog = PostulationDialog::new();
    dialog.open(CampaignId::from("camp-1"), LabId::from("lab-9"));

    dialog.confirm(&api).await.expect_err("transport");
    assert!(!dialog.is_open());
    assert_eq!(dialog.confirm_state(), ControlState::Enabled);
    assert_eq!(
        dialog.notice().map(|notice| notice.text.as_str()),
        Some(SYSTEM_ERROR_MESSAGE)
    );
}

#[test]
fn confirm_is_ignored_while_in_flight() {
    let mut dialog = PostulationDialog::new();
    dialog.open(CampaignId::from("camp-1"), LabId::from("lab-9"));
    assert!(dialog.begin_confirm().is_some());
    assert_eq!(dialog.confirm_state(), ControlState::Busy);
    assert!(dialog.begin_confirm().is_none());
}
