//! Lab enrollment campaigns: periodic status refresh for the secretary's
//! campaign cards and the student's postulation dialog.

use std::{sync::Arc, time::Duration};

use futures::future::join_all;
use shared::{
    domain::{CampaignId, CourseId, LabId},
    protocol::{CampaignStatus, LabDetails, PostulationRequest},
};
use tokio::{
    sync::broadcast,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tokio_stream::{wrappers::IntervalStream, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    error::{RemoteError, WorkflowError},
    view::{ControlState, Notice, NoticeLevel},
    CampaignApi,
};

pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(30);
pub const POSTULATION_SUCCESS_MESSAGE: &str =
    "Your application was registered. You will be notified once the assignment is confirmed.";
pub const UNKNOWN_POSTULATION_ERROR: &str = "An unknown error occurred";
pub const SYSTEM_ERROR_MESSAGE: &str =
    "There was a connection problem. Please try again.";
pub const DETAILS_UNAVAILABLE: &str = "Could not load lab information";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignEvent {
    StatusUpdated(CampaignStatus),
    PollFailed { course_id: CourseId, message: String },
}

/// Refreshes the status of every visible campaign card on a fixed period.
pub struct CampaignPoller {
    api: Arc<dyn CampaignApi>,
    course_ids: Vec<CourseId>,
    period: Duration,
    events: broadcast::Sender<CampaignEvent>,
}

impl CampaignPoller {
    pub fn new(api: Arc<dyn CampaignApi>, course_ids: Vec<CourseId>, period: Duration) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            api,
            course_ids,
            period,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CampaignEvent> {
        self.events.subscribe()
    }

    /// One refresh of every card. Failures are reported and skipped.
    pub async fn poll_once(&self) -> Vec<CampaignStatus> {
        let fetches = self.course_ids.iter().map(|course_id| async move {
            (course_id, self.api.campaign_status(course_id).await)
        });

        let mut updated = Vec::with_capacity(self.course_ids.len());
        for (course_id, result) in join_all(fetches).await {
            match result {
                Ok(status) => {
                    debug!(%course_id, status = ?status.status, "campaign status refreshed");
                    let _ = self.events.send(CampaignEvent::StatusUpdated(status.clone()));
                    updated.push(status);
                }
                Err(err) => {
                    warn!(%course_id, error = %err, "campaign status refresh failed");
                    let _ = self.events.send(CampaignEvent::PollFailed {
                        course_id: course_id.clone(),
                        message: err.to_string(),
                    });
                }
            }
        }
        updated
    }

    /// Starts polling in the background. The first refresh happens one full
    /// period after start. Returns `None` when there is nothing to poll.
    pub fn start(self) -> Option<PollerHandle> {
        if self.course_ids.is_empty() {
            debug!("no active campaigns, status polling not started");
            return None;
        }
        info!(
            campaigns = self.course_ids.len(),
            period_secs = self.period.as_secs(),
            "campaign status polling started"
        );
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + self.period, self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut ticks = IntervalStream::new(interval);
            while ticks.next().await.is_some() {
                self.poll_once().await;
            }
        });
        Some(PollerHandle { task })
    }
}

/// Stops the poller when stopped or dropped.
pub struct PollerHandle {
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabDetailsView {
    Loading,
    Loaded(LabDetails),
    Unavailable,
}

impl LabDetailsView {
    pub fn day(&self) -> &str {
        match self {
            LabDetailsView::Loading => "Loading...",
            LabDetailsView::Loaded(details) => &details.day,
            LabDetailsView::Unavailable => DETAILS_UNAVAILABLE,
        }
    }

    pub fn time(&self) -> String {
        match self {
            LabDetailsView::Loaded(details) => {
                format!("{} - {}", details.start_time, details.end_time)
            }
            _ => "--:--".to_string(),
        }
    }

    pub fn room(&self) -> &str {
        match self {
            LabDetailsView::Loaded(details) => &details.room,
            _ => "...",
        }
    }
}

/// State of the postulation confirmation dialog.
#[derive(Debug, Clone)]
pub struct PostulationDialog {
    target: Option<PostulationRequest>,
    details: LabDetailsView,
    confirm: ControlState,
    notice: Option<Notice>,
}

impl Default for PostulationDialog {
    fn default() -> Self {
        Self {
            target: None,
            details: LabDetailsView::Loading,
            confirm: ControlState::Enabled,
            notice: None,
        }
    }
}

impl PostulationDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&PostulationRequest> {
        self.target.as_ref()
    }

    pub fn details(&self) -> &LabDetailsView {
        &self.details
    }

    pub fn confirm_state(&self) -> ControlState {
        self.confirm
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Opens the dialog for one lab; details show a loading placeholder
    /// until `apply_details` runs.
    pub fn open(&mut self, campaign_id: CampaignId, lab_id: LabId) -> LabId {
        self.target = Some(PostulationRequest {
            campaign_id,
            lab_id: lab_id.clone(),
        });
        self.details = LabDetailsView::Loading;
        self.confirm = ControlState::Enabled;
        self.notice = None;
        lab_id
    }

    pub fn apply_details(&mut self, lab_id: &LabId, result: Result<LabDetails, RemoteError>) {
        if self.target.as_ref().map(|target| &target.lab_id) != Some(lab_id) {
            debug!(%lab_id, "dropping details for a lab no longer shown");
            return;
        }
        self.details = match result {
            Ok(details) => LabDetailsView::Loaded(details),
            Err(err) => {
                warn!(%lab_id, error = %err, "failed to load lab details");
                LabDetailsView::Unavailable
            }
        };
    }

    pub fn close(&mut self) {
        self.target = None;
        self.details = LabDetailsView::Loading;
        self.confirm = ControlState::Enabled;
    }

    pub fn begin_confirm(&mut self) -> Option<PostulationRequest> {
        if self.confirm == ControlState::Busy {
            return None;
        }
        let request = self.target.clone()?;
        self.confirm = ControlState::Busy;
        self.notice = None;
        Some(request)
    }

    pub fn finish_confirm(&mut self, result: Result<(), RemoteError>) -> Result<(), WorkflowError> {
        self.confirm = ControlState::Enabled;
        match result {
            Ok(()) => {
                if let Some(target) = &self.target {
                    info!(campaign_id = %target.campaign_id, lab_id = %target.lab_id, "postulation registered");
                }
                self.close();
                self.notice = Some(Notice::alert(
                    NoticeLevel::Success,
                    POSTULATION_SUCCESS_MESSAGE,
                ));
                Ok(())
            }
            Err(RemoteError::Business(business)) => {
                let text = if business.messages.is_empty() {
                    UNKNOWN_POSTULATION_ERROR.to_string()
                } else {
                    business.messages.join(", ")
                };
                self.notice = Some(Notice::alert(NoticeLevel::Warning, text));
                Err(RemoteError::Business(business).into())
            }
            Err(err) => {
                self.close();
                self.notice = Some(Notice::alert(NoticeLevel::Error, SYSTEM_ERROR_MESSAGE));
                Err(err.into())
            }
        }
    }

    pub async fn load_details(&mut self, api: &dyn CampaignApi, lab_id: &LabId) {
        let result = api.lab_details(lab_id).await;
        self.apply_details(lab_id, result);
    }

    pub async fn confirm(&mut self, api: &dyn CampaignApi) -> Result<bool, WorkflowError> {
        let Some(request) = self.begin_confirm() else {
            return Ok(false);
        };
        let result = api.postulate(&request).await;
        self.finish_confirm(result)?;
        Ok(true)
    }
}

#[cfg(test)]
#[path = "tests/campaign_tests.rs"]
mod tests;
