//! Approve / reject / cancel on existing reservations.
//!
//! Statuses are never flipped locally: a successful action only clears the
//! pending entry, and the caller refetches the reservation list to learn the
//! new status.

use std::collections::HashMap;

use shared::{
    domain::{LifecycleAction, ReservationId, ReservationStatus, ReservationSummary},
    error::ValidationError,
    protocol::RejectReservationBody,
};
use tracing::{info, warn};

use crate::{
    controller::ActionKind,
    error::{RemoteError, WorkflowError},
    view::{ControlState, Notice, NoticeLevel},
    ReservationApi,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleCommand {
    Approve {
        reservation_id: ReservationId,
    },
    Reject {
        reservation_id: ReservationId,
        reason: String,
    },
    Cancel {
        reservation_id: ReservationId,
    },
}

impl LifecycleCommand {
    pub fn reservation_id(&self) -> &ReservationId {
        match self {
            LifecycleCommand::Approve { reservation_id }
            | LifecycleCommand::Reject { reservation_id, .. }
            | LifecycleCommand::Cancel { reservation_id } => reservation_id,
        }
    }

    pub fn action(&self) -> LifecycleAction {
        match self {
            LifecycleCommand::Approve { .. } => LifecycleAction::Approve,
            LifecycleCommand::Reject { .. } => LifecycleAction::Reject,
            LifecycleCommand::Cancel { .. } => LifecycleAction::Cancel,
        }
    }

    pub fn action_kind(&self) -> ActionKind {
        match self {
            LifecycleCommand::Approve { .. } => ActionKind::Approve,
            LifecycleCommand::Reject { .. } => ActionKind::Reject,
            LifecycleCommand::Cancel { .. } => ActionKind::Cancel,
        }
    }

    pub async fn send(&self, api: &dyn ReservationApi) -> Result<(), RemoteError> {
        match self {
            LifecycleCommand::Approve { reservation_id } => {
                api.approve_reservation(reservation_id).await
            }
            LifecycleCommand::Reject {
                reservation_id,
                reason,
            } => {
                let body = RejectReservationBody {
                    reservation_id: reservation_id.clone(),
                    reason: reason.clone(),
                };
                api.reject_reservation(&body).await
            }
            LifecycleCommand::Cancel { reservation_id } => {
                api.cancel_reservation(reservation_id).await
            }
        }
    }
}

/// Known statuses and in-flight mutations for the reservations on screen.
#[derive(Debug, Clone, Default)]
pub struct LifecycleBoard {
    known: HashMap<ReservationId, ReservationStatus>,
    pending: HashMap<ReservationId, LifecycleAction>,
    notice: Option<Notice>,
}

impl LifecycleBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_reservations(&mut self, reservations: &[ReservationSummary]) {
        self.known = reservations
            .iter()
            .map(|reservation| (reservation.reservation_id.clone(), reservation.status))
            .collect();
    }

    pub fn status(&self, id: &ReservationId) -> Option<ReservationStatus> {
        self.known.get(id).copied()
    }

    pub fn pending(&self, id: &ReservationId) -> Option<LifecycleAction> {
        self.pending.get(id).copied()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn control_state(&self, id: &ReservationId, action: LifecycleAction) -> ControlState {
        if self.pending.contains_key(id) {
            return ControlState::Busy;
        }
        match self.status(id) {
            Some(status) if !status.allows(action) => ControlState::Disabled,
            _ => ControlState::Enabled,
        }
    }

    pub fn begin(&mut self, command: &LifecycleCommand) -> Result<(), WorkflowError> {
        let id = command.reservation_id();
        let action = command.action();
        if self.pending.contains_key(id) {
            return Err(WorkflowError::Busy(command.action_kind()));
        }
        if let Some(status) = self.status(id) {
            if !status.allows(action) {
                return Err(ValidationError::TransitionNotAllowed {
                    reservation_id: id.to_string(),
                    action: action.name(),
                    status: format!("{status:?}").to_ascii_lowercase(),
                }
                .into());
            }
        }
        self.pending.insert(id.clone(), action);
        self.notice = None;
        Ok(())
    }

    pub(crate) fn abandon(&mut self, command: &LifecycleCommand) {
        let id = command.reservation_id();
        if self.pending.remove(id).is_some() {
            warn!(reservation_id = %id, action = command.action().name(), "reservation update abandoned");
        }
    }

    /// Always releases the pending entry, whatever the outcome.
    pub fn finish(
        &mut self,
        command: &LifecycleCommand,
        result: Result<(), RemoteError>,
    ) -> Result<(), WorkflowError> {
        let id = command.reservation_id();
        self.pending.remove(id);
        match result {
            Ok(()) => {
                info!(reservation_id = %id, action = command.action().name(), "reservation updated");
                Ok(())
            }
            Err(err) => {
                warn!(
                    reservation_id = %id,
                    action = command.action().name(),
                    error = %err,
                    "reservation update failed"
                );
                let text = match &err {
                    RemoteError::Business(_) => format!("Error: {}", err.user_message()),
                    RemoteError::Transport(_) => err.user_message(),
                };
                self.notice = Some(Notice::alert(NoticeLevel::Error, text));
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
