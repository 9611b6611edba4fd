//! Typed action dispatch for the reservation screens.
//!
//! Every user intent is a `WorkflowAction`; `ReservationController::dispatch`
//! routes it to its handler, keeps the per-dialog state current and
//! broadcasts `WorkflowEvent`s for whoever renders it.

use std::sync::Arc;

use shared::domain::{
    CandidateResource, LifecycleAction, ReservationId, ReservationSummary, ResourceId,
};
use tokio::{
    runtime::Handle,
    sync::{broadcast, Mutex},
};
use tracing::{debug, info, warn};

use crate::{
    error::{ErrorCategory, WorkflowError},
    lifecycle::{LifecycleBoard, LifecycleCommand},
    view::Notice,
    workflow::ReservationWorkflow,
    ReservationApi,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Search,
    Select,
    Submit,
    Approve,
    Reject,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowAction {
    Search {
        date: String,
        start_time: String,
        end_time: String,
    },
    Select {
        resource_id: ResourceId,
    },
    Submit {
        purpose: String,
    },
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

impl WorkflowAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            WorkflowAction::Search { .. } => ActionKind::Search,
            WorkflowAction::Select { .. } => ActionKind::Select,
            WorkflowAction::Submit { .. } => ActionKind::Submit,
            WorkflowAction::Approve { .. } => ActionKind::Approve,
            WorkflowAction::Reject { .. } => ActionKind::Reject,
            WorkflowAction::Cancel { .. } => ActionKind::Cancel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Searched { candidates: usize },
    Selected(CandidateResource),
    Submitted,
    Updated {
        reservation_id: ReservationId,
        action: LifecycleAction,
    },
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    SearchCompleted {
        candidates: Vec<CandidateResource>,
    },
    SelectionChanged {
        resource_id: ResourceId,
    },
    ReservationSubmitted,
    ReservationUpdated {
        reservation_id: ReservationId,
        action: LifecycleAction,
    },
    ReservationsRefreshed {
        reservations: Vec<ReservationSummary>,
    },
    Notice(Notice),
    Failed {
        kind: ActionKind,
        category: ErrorCategory,
        message: String,
    },
}

type Undo<T> = Box<dyn FnOnce(&mut T) + Send>;

/// Reverts a `begin_*` step if the request future is dropped before its
/// reply is applied. Must be disarmed once the state lock for `finish_*` is
/// held.
struct Rollback<T: Send + 'static> {
    state: Arc<Mutex<T>>,
    undo: Option<Undo<T>>,
}

impl<T: Send + 'static> Rollback<T> {
    fn new(state: &Arc<Mutex<T>>, undo: impl FnOnce(&mut T) + Send + 'static) -> Self {
        Self {
            state: Arc::clone(state),
            undo: Some(Box::new(undo)),
        }
    }

    fn disarm(&mut self) {
        self.undo = None;
    }
}

impl<T: Send + 'static> Drop for Rollback<T> {
    fn drop(&mut self) {
        let Some(undo) = self.undo.take() else {
            return;
        };
        if let Ok(mut state) = self.state.try_lock() {
            undo(&mut *state);
            return;
        }
        match Handle::try_current() {
            Ok(handle) => {
                let state = Arc::clone(&self.state);
                handle.spawn(async move {
                    undo(&mut *state.lock().await);
                });
            }
            Err(_) => warn!("abandoned action could not be released outside a runtime"),
        }
    }
}

pub struct ReservationController {
    api: Arc<dyn ReservationApi>,
    workflow: Arc<Mutex<ReservationWorkflow>>,
    board: Arc<Mutex<LifecycleBoard>>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl ReservationController {
    pub fn new(api: Arc<dyn ReservationApi>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            workflow: Arc::new(Mutex::new(ReservationWorkflow::new())),
            board: Arc::new(Mutex::new(LifecycleBoard::new())),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the dialog state for rendering.
    pub async fn workflow(&self) -> ReservationWorkflow {
        self.workflow.lock().await.clone()
    }

    pub async fn board(&self) -> LifecycleBoard {
        self.board.lock().await.clone()
    }

    pub async fn close_workflow(&self) {
        self.workflow.lock().await.close();
    }

    /// Initial load of the reservation list; also used after mutations.
    pub async fn refresh(&self) -> Result<Vec<ReservationSummary>, WorkflowError> {
        let reservations = self.api.list_reservations().await?;
        self.board.lock().await.replace_reservations(&reservations);
        debug!(count = reservations.len(), "reservation list refreshed");
        let _ = self.events.send(WorkflowEvent::ReservationsRefreshed {
            reservations: reservations.clone(),
        });
        Ok(reservations)
    }

    pub async fn dispatch(&self, action: WorkflowAction) -> Result<ActionOutcome, WorkflowError> {
        let kind = action.kind();
        let result = match action {
            WorkflowAction::Search {
                date,
                start_time,
                end_time,
            } => self.search(&date, &start_time, &end_time).await,
            WorkflowAction::Select { resource_id } => self.select(&resource_id).await,
            WorkflowAction::Submit { purpose } => self.submit(&purpose).await,
            WorkflowAction::Approve { reservation_id } => {
                self.apply_lifecycle(LifecycleCommand::Approve { reservation_id })
                    .await
            }
            WorkflowAction::Reject {
                reservation_id,
                reason,
            } => {
                self.apply_lifecycle(LifecycleCommand::Reject {
                    reservation_id,
                    reason,
                })
                .await
            }
            WorkflowAction::Cancel { reservation_id } => {
                self.apply_lifecycle(LifecycleCommand::Cancel { reservation_id })
                    .await
            }
        };

        if let Err(err) = &result {
            let _ = self.events.send(WorkflowEvent::Failed {
                kind,
                category: err.category(),
                message: err.user_message(),
            });
        }
        result
    }

    async fn search(
        &self,
        date: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<ActionOutcome, WorkflowError> {
        let ticket = self
            .workflow
            .lock()
            .await
            .begin_search(date, start_time, end_time)?;
        let generation = ticket.generation();
        let mut rollback = Rollback::new(&self.workflow, move |workflow: &mut ReservationWorkflow| {
            workflow.abandon_search(generation);
        });

        let result = self.api.search_available(ticket.query()).await;

        let mut workflow = self.workflow.lock().await;
        rollback.disarm();
        let outcome = workflow.finish_search(ticket, result);
        self.publish_notice(workflow.notice());
        let candidates = outcome?;
        let _ = self.events.send(WorkflowEvent::SearchCompleted {
            candidates: workflow.candidates().to_vec(),
        });
        Ok(ActionOutcome::Searched { candidates })
    }

    async fn select(&self, resource_id: &ResourceId) -> Result<ActionOutcome, WorkflowError> {
        let mut workflow = self.workflow.lock().await;
        let candidate = workflow.select(resource_id)?.clone();
        let _ = self.events.send(WorkflowEvent::SelectionChanged {
            resource_id: resource_id.clone(),
        });
        Ok(ActionOutcome::Selected(candidate))
    }

    async fn submit(&self, purpose: &str) -> Result<ActionOutcome, WorkflowError> {
        let ticket = self.workflow.lock().await.begin_submit(purpose)?;
        let mut rollback = Rollback::new(&self.workflow, ReservationWorkflow::abandon_submit);

        let result = self.api.create_reservation(&ticket.body()).await;

        {
            let mut workflow = self.workflow.lock().await;
            rollback.disarm();
            let outcome = workflow.finish_submit(ticket, result);
            self.publish_notice(workflow.notice());
            outcome?;
        }

        let _ = self.events.send(WorkflowEvent::ReservationSubmitted);
        self.refresh_after_mutation().await;
        Ok(ActionOutcome::Submitted)
    }

    async fn apply_lifecycle(
        &self,
        command: LifecycleCommand,
    ) -> Result<ActionOutcome, WorkflowError> {
        self.board.lock().await.begin(&command)?;
        let pending = command.clone();
        let mut rollback = Rollback::new(&self.board, move |board: &mut LifecycleBoard| {
            board.abandon(&pending)
        });

        let result = command.send(self.api.as_ref()).await;

        {
            let mut board = self.board.lock().await;
            rollback.disarm();
            let outcome = board.finish(&command, result);
            self.publish_notice(board.notice());
            outcome?;
        }

        let reservation_id = command.reservation_id().clone();
        let action = command.action();
        let _ = self.events.send(WorkflowEvent::ReservationUpdated {
            reservation_id: reservation_id.clone(),
            action,
        });
        self.refresh_after_mutation().await;
        Ok(ActionOutcome::Updated {
            reservation_id,
            action,
        })
    }

    /// The mutation itself already succeeded; a failed refetch only leaves
    /// the list stale until the next refresh.
    async fn refresh_after_mutation(&self) {
        match self.refresh().await {
            Ok(reservations) => info!(count = reservations.len(), "state resynchronized"),
            Err(err) => warn!(error = %err, "failed to refetch reservations after mutation"),
        }
    }

    fn publish_notice(&self, notice: Option<&Notice>) {
        if let Some(notice) = notice {
            let _ = self.events.send(WorkflowEvent::Notice(notice.clone()));
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
