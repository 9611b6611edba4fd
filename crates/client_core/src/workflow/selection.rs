use shared::{
    domain::{CandidateResource, ResourceId},
    error::ValidationError,
};

use super::{ReservationWorkflow, WorkflowStep};
use crate::{controller::ActionKind, error::WorkflowError};

impl ReservationWorkflow {
    /// Marks one candidate card selected and every other one unselected, then
    /// reveals the confirmation step with the purpose field focused.
    pub fn select(&mut self, id: &ResourceId) -> Result<&CandidateResource, WorkflowError> {
        let Some(index) = self
            .candidates
            .iter()
            .position(|candidate| &candidate.id == id)
        else {
            return Err(ValidationError::UnknownCandidate(id.to_string()).into());
        };

        self.selected = Some(id.clone());
        self.step = WorkflowStep::Confirm;
        self.purpose_focused = true;
        self.notice = None;
        if !self.controls.is_busy(ActionKind::Submit) {
            self.controls.enable(ActionKind::Submit);
        }

        Ok(&self.candidates[index])
    }

    pub fn selected_count(&self) -> usize {
        self.cards().filter(|(_, selected)| *selected).count()
    }
}
