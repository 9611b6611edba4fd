//! Per-dialog state for the classroom reservation workflow:
//! search → select → confirm.
//!
//! The state is split into `begin_*` steps that validate and mark the
//! triggering control busy, and `finish_*` steps that apply a response. The
//! controller awaits the network between the two without holding a lock, so
//! the struct itself never performs I/O.

mod search;
mod selection;
mod submission;

use chrono::NaiveDate;
use shared::domain::{CandidateResource, ResourceId, TimeRange};

use crate::{
    controller::ActionKind,
    view::{ControlState, Controls, Notice},
};

pub use search::{SearchTicket, EMPTY_RESULTS_MESSAGE};
pub use submission::{SubmitTicket, PENDING_APPROVAL_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    /// Date and time inputs, nothing found yet.
    Criteria,
    /// Candidate cards are shown, none selected.
    Results,
    /// A candidate is selected; purpose field and submit are visible.
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SearchCriteria {
    date: NaiveDate,
    window: TimeRange,
}

#[derive(Debug, Clone)]
pub struct ReservationWorkflow {
    criteria: Option<SearchCriteria>,
    candidates: Vec<CandidateResource>,
    selected: Option<ResourceId>,
    purpose: String,
    purpose_focused: bool,
    step: WorkflowStep,
    controls: Controls,
    notice: Option<Notice>,
    issued_searches: u64,
    applied_search: u64,
}

impl Default for ReservationWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl ReservationWorkflow {
    pub fn new() -> Self {
        Self {
            criteria: None,
            candidates: Vec::new(),
            selected: None,
            purpose: String::new(),
            purpose_focused: false,
            step: WorkflowStep::Criteria,
            controls: Controls::new(&[
                (ActionKind::Search, ControlState::Enabled),
                (ActionKind::Submit, ControlState::Disabled),
            ]),
            notice: None,
            issued_searches: 0,
            applied_search: 0,
        }
    }

    /// Drops every transient entity, as closing the dialog does.
    pub fn close(&mut self) {
        *self = Self::new();
    }

    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    pub fn candidates(&self) -> &[CandidateResource] {
        &self.candidates
    }

    /// Candidate cards with their selected flag, in result order.
    pub fn cards(&self) -> impl Iterator<Item = (&CandidateResource, bool)> {
        self.candidates
            .iter()
            .map(|candidate| (candidate, self.is_selected(&candidate.id)))
    }

    pub fn selected(&self) -> Option<&CandidateResource> {
        let id = self.selected.as_ref()?;
        self.candidates.iter().find(|candidate| &candidate.id == id)
    }

    pub fn is_selected(&self, id: &ResourceId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn purpose_focused(&self) -> bool {
        self.purpose_focused
    }

    pub fn confirmation_visible(&self) -> bool {
        self.step == WorkflowStep::Confirm
    }

    pub fn control(&self, kind: ActionKind) -> ControlState {
        self.controls.state(kind)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.purpose_focused = false;
        if self.step == WorkflowStep::Confirm {
            self.step = WorkflowStep::Results;
        }
        if !self.controls.is_busy(ActionKind::Submit) {
            self.controls.disable(ActionKind::Submit);
        }
    }
}

#[cfg(test)]
#[path = "../tests/workflow_tests.rs"]
mod tests;
