use shared::{
    domain::ReservationRequest, error::ValidationError, protocol::CreateReservationBody,
};
use tracing::{info, warn};

use super::ReservationWorkflow;
use crate::{
    controller::ActionKind,
    error::{RemoteError, WorkflowError},
    view::{Notice, NoticeLevel},
};

pub const PENDING_APPROVAL_MESSAGE: &str =
    "Reservation request sent. It is pending approval by the secretary's office.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    request: ReservationRequest,
}

impl SubmitTicket {
    pub fn request(&self) -> &ReservationRequest {
        &self.request
    }

    pub fn body(&self) -> CreateReservationBody {
        CreateReservationBody::from(&self.request)
    }
}

impl ReservationWorkflow {
    pub fn begin_submit(&mut self, purpose: &str) -> Result<SubmitTicket, WorkflowError> {
        self.purpose = purpose.to_string();
        if self.controls.is_busy(ActionKind::Submit) {
            return Err(WorkflowError::Busy(ActionKind::Submit));
        }

        let request = self.build_request();
        let request = match request {
            Ok(request) => request,
            Err(err) => {
                self.notice = Some(Notice::field_error(err.field(), err.to_string()));
                return Err(err.into());
            }
        };

        self.controls.begin(ActionKind::Submit);
        self.notice = None;
        Ok(SubmitTicket { request })
    }

    /// Releases the submit control of a submission whose reply will never be
    /// applied.
    pub(crate) fn abandon_submit(&mut self) {
        warn!("reservation submission abandoned before its reply");
        self.rearm_submit();
    }

    /// Submit is only usable while a candidate is still selected; a search
    /// that completed meanwhile may have cleared it.
    fn rearm_submit(&mut self) {
        if self.selected.is_some() {
            self.controls.enable(ActionKind::Submit);
        } else {
            self.controls.disable(ActionKind::Submit);
        }
    }

    fn build_request(&self) -> Result<ReservationRequest, ValidationError> {
        let selected = self.selected().ok_or(ValidationError::NoSelection)?;
        let criteria = self.criteria.ok_or(ValidationError::MissingField("date"))?;
        ReservationRequest::new(
            criteria.date,
            criteria.window,
            selected.id.clone(),
            &self.purpose,
        )
    }

    /// On success the workflow closes; the caller refetches authoritative
    /// state. On failure the form stays populated and submit is re-armed.
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<(), RemoteError>,
    ) -> Result<(), WorkflowError> {
        match result {
            Ok(()) => {
                info!(
                    classroom_id = %ticket.request.resource_id(),
                    date = %ticket.request.date(),
                    "reservation request accepted"
                );
                self.close();
                self.notice = Some(Notice::alert(NoticeLevel::Success, PENDING_APPROVAL_MESSAGE));
                Ok(())
            }
            Err(err) => {
                warn!(
                    classroom_id = %ticket.request.resource_id(),
                    error = %err,
                    "reservation request failed"
                );
                self.rearm_submit();
                self.notice = Some(Notice::dialog(NoticeLevel::Error, err.user_message()));
                Err(err.into())
            }
        }
    }
}
