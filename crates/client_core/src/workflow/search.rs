use chrono::NaiveDate;
use shared::{
    domain::{parse_date, CandidateResource, TimeRange},
    protocol::SearchQuery,
};
use tracing::{debug, info};

use super::{ReservationWorkflow, SearchCriteria, WorkflowStep};
use crate::{
    controller::ActionKind,
    error::{RemoteError, WorkflowError},
    view::{Notice, NoticeLevel},
};

pub const EMPTY_RESULTS_MESSAGE: &str =
    "No classrooms are available for the selected date and time.";

/// A validated search that is ready to go out on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    date: NaiveDate,
    window: TimeRange,
    query: SearchQuery,
}

impl SearchTicket {
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl ReservationWorkflow {
    pub fn begin_search(
        &mut self,
        date: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<SearchTicket, WorkflowError> {
        if self.controls.is_busy(ActionKind::Search) {
            return Err(WorkflowError::Busy(ActionKind::Search));
        }

        let parsed = parse_date("date", date)
            .and_then(|date| TimeRange::parse(start_time, end_time).map(|window| (date, window)));
        let (date, window) = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                self.notice = Some(Notice::field_error(err.field(), err.to_string()));
                return Err(err.into());
            }
        };

        self.controls.begin(ActionKind::Search);
        self.notice = None;
        self.clear_selection();
        self.issued_searches += 1;

        Ok(SearchTicket {
            generation: self.issued_searches,
            date,
            window,
            query: SearchQuery::new(date, window),
        })
    }

    pub(crate) fn abandon_search(&mut self, generation: u64) {
        debug!(generation, "search abandoned before its reply");
        self.controls.enable(ActionKind::Search);
    }

    /// Applies a search reply. Replies are applied in arrival order; a reply
    /// for an older ticket still overwrites a newer one.
    pub fn finish_search(
        &mut self,
        ticket: SearchTicket,
        result: Result<Vec<CandidateResource>, RemoteError>,
    ) -> Result<usize, WorkflowError> {
        self.controls.enable(ActionKind::Search);
        if ticket.generation < self.applied_search {
            debug!(
                generation = ticket.generation,
                applied = self.applied_search,
                "search reply arrived after a newer one"
            );
        }
        self.applied_search = ticket.generation;

        match result {
            Ok(candidates) if candidates.is_empty() => {
                self.candidates.clear();
                self.clear_selection();
                self.step = WorkflowStep::Criteria;
                self.notice = Some(Notice::dialog(NoticeLevel::Info, EMPTY_RESULTS_MESSAGE));
                Ok(0)
            }
            Ok(candidates) => {
                info!(
                    count = candidates.len(),
                    date = %ticket.date,
                    window = %ticket.window,
                    "classroom search returned candidates"
                );
                self.criteria = Some(SearchCriteria {
                    date: ticket.date,
                    window: ticket.window,
                });
                self.candidates = candidates;
                self.clear_selection();
                self.step = WorkflowStep::Results;
                self.notice = None;
                Ok(self.candidates.len())
            }
            Err(err) => {
                self.notice = Some(Notice::dialog(NoticeLevel::Error, err.user_message()));
                Err(err.into())
            }
        }
    }
}
