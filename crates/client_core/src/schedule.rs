//! Schedule conflict checks and the course-group schedule editor.

use shared::{
    domain::{CourseGroupId, CourseId, DayOfWeek, RoomId, ScheduleEntry, TimeRange},
    error::ValidationError,
    protocol::{ConflictCheckRequest, ScheduleEntryBody, ScheduleSaveRequest},
};
use tracing::{debug, info, warn};

use crate::{
    error::{RemoteError, WorkflowError},
    view::{ControlState, Notice, NoticeLevel},
    ScheduleApi,
};

pub const AVAILABLE_MESSAGE: &str = "Schedule available.";
pub const UNVERIFIED_MESSAGE: &str = "Could not verify schedule conflicts.";
pub const SAVE_FAILED_MESSAGE: &str = "Could not save the schedule.";
pub const SAVED_MESSAGE: &str = "Schedule saved.";

/// Builds a conflict check from raw form fields. Returns `Ok(None)` while the
/// day or either time is still empty; nothing is sent in that case.
pub fn conflict_request(
    course_id: &CourseId,
    day: &str,
    start_time: &str,
    end_time: &str,
    room_id: Option<&str>,
) -> Result<Option<ConflictCheckRequest>, ValidationError> {
    if day.trim().is_empty() || start_time.trim().is_empty() || end_time.trim().is_empty() {
        return Ok(None);
    }
    let day = DayOfWeek::parse("day_of_week", day)?;
    let window = TimeRange::parse(start_time, end_time)?;
    let room_id = room_id
        .map(str::trim)
        .filter(|room| !room.is_empty())
        .map(RoomId::from);

    Ok(Some(ConflictCheckRequest {
        course_id: course_id.clone(),
        day_of_week: day,
        start_time: window.start_label(),
        end_time: window.end_label(),
        room_id,
    }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictOutcome {
    Available,
    Conflict(Vec<String>),
    /// The check itself failed; availability is unknown.
    Unverified(String),
}

impl ConflictOutcome {
    pub fn notice(&self) -> Notice {
        match self {
            ConflictOutcome::Available => Notice::dialog(NoticeLevel::Success, AVAILABLE_MESSAGE),
            ConflictOutcome::Conflict(messages) => Notice::dialog(
                NoticeLevel::Error,
                format!("Conflict: {}", messages.join(", ")),
            ),
            ConflictOutcome::Unverified(_) => {
                Notice::dialog(NoticeLevel::Warning, UNVERIFIED_MESSAGE)
            }
        }
    }
}

pub async fn check_conflicts(
    api: &dyn ScheduleApi,
    request: &ConflictCheckRequest,
) -> ConflictOutcome {
    match api.check_conflicts(request).await {
        Ok(response) if response.has_conflict => ConflictOutcome::Conflict(response.messages),
        Ok(_) => ConflictOutcome::Available,
        Err(err) => {
            warn!(course_id = %request.course_id, error = %err, "conflict check failed");
            ConflictOutcome::Unverified(err.to_string())
        }
    }
}

/// One editable row of the schedule dialog, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleRowInput {
    pub day: String,
    pub room_id: String,
    pub start_time: String,
    pub end_time: String,
}

impl ScheduleRowInput {
    pub fn new(day: &str, room_id: &str, start_time: &str, end_time: &str) -> Self {
        Self {
            day: day.to_string(),
            room_id: room_id.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        }
    }

    pub fn parse(&self) -> Result<ScheduleEntry, ValidationError> {
        let day = DayOfWeek::parse("day", &self.day)?;
        let room_id = self.room_id.trim();
        if room_id.is_empty() {
            return Err(ValidationError::MissingField("room_id"));
        }
        let window = TimeRange::parse(&self.start_time, &self.end_time)?;
        Ok(ScheduleEntry {
            day,
            room_id: RoomId::from(room_id),
            window,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleEditor {
    course_group_id: CourseGroupId,
    rows: Vec<ScheduleRowInput>,
    save: ControlState,
    notice: Option<Notice>,
}

impl ScheduleEditor {
    /// Opens the editor with the group's current entries, or one blank row.
    pub fn open(course_group_id: CourseGroupId, existing: &[ScheduleEntry]) -> Self {
        let stored: Vec<ScheduleEntryBody> = existing.iter().map(ScheduleEntryBody::from).collect();
        Self {
            course_group_id,
            rows: rows_from(&stored),
            save: ControlState::Enabled,
            notice: None,
        }
    }

    pub fn rows(&self) -> &[ScheduleRowInput] {
        &self.rows
    }

    pub fn row_mut(&mut self, index: usize) -> Option<&mut ScheduleRowInput> {
        self.rows.get_mut(index)
    }

    pub fn add_row(&mut self) {
        self.rows.push(ScheduleRowInput::default());
    }

    pub fn remove_row(&mut self, index: usize) -> Option<ScheduleRowInput> {
        (index < self.rows.len()).then(|| self.rows.remove(index))
    }

    pub fn save_state(&self) -> ControlState {
        self.save
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Validates every row; a single bad row aborts the whole save.
    pub fn begin_save(&mut self) -> Result<ScheduleSaveRequest, WorkflowError> {
        self.notice = None;
        let mut horarios = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            match row.parse() {
                Ok(entry) => horarios.push(ScheduleEntryBody::from(&entry)),
                Err(err) => {
                    let reported = match err {
                        ValidationError::InvertedTimeRange { .. } => err,
                        _ => ValidationError::IncompleteScheduleRow { row: index + 1 },
                    };
                    self.notice = Some(Notice::dialog(NoticeLevel::Error, reported.to_string()));
                    return Err(reported.into());
                }
            }
        }
        self.save = ControlState::Busy;
        Ok(ScheduleSaveRequest {
            course_group_id: self.course_group_id.clone(),
            horarios,
        })
    }

    pub fn finish_save(&mut self, result: Result<(), RemoteError>) -> Result<(), WorkflowError> {
        self.save = ControlState::Enabled;
        match result {
            Ok(()) => {
                info!(course_group_id = %self.course_group_id, rows = self.rows.len(), "schedule saved");
                self.notice = Some(Notice::dialog(NoticeLevel::Success, SAVED_MESSAGE));
                Ok(())
            }
            Err(err) => {
                let text = match &err {
                    RemoteError::Business(business) if business.messages.is_empty() => {
                        SAVE_FAILED_MESSAGE.to_string()
                    }
                    _ => err.user_message(),
                };
                self.notice = Some(Notice::dialog(NoticeLevel::Error, text));
                Err(err.into())
            }
        }
    }

    /// Replaces the rows with what the server stored. A failed reload keeps
    /// the rows as typed; the save itself already succeeded.
    pub fn apply_stored(&mut self, result: Result<Vec<ScheduleEntryBody>, RemoteError>) {
        match result {
            Ok(stored) => {
                debug!(course_group_id = %self.course_group_id, rows = stored.len(), "schedule reloaded");
                self.rows = rows_from(&stored);
            }
            Err(err) => {
                warn!(course_group_id = %self.course_group_id, error = %err, "failed to reload schedule after save");
            }
        }
    }

    pub async fn save(&mut self, api: &dyn ScheduleApi) -> Result<(), WorkflowError> {
        let request = self.begin_save()?;
        let result = api.save_schedule(&request).await;
        self.finish_save(result)?;
        let stored = api.group_schedule(&self.course_group_id).await;
        self.apply_stored(stored);
        Ok(())
    }
}

/// One row per stored entry, or a single blank row.
fn rows_from(stored: &[ScheduleEntryBody]) -> Vec<ScheduleRowInput> {
    let mut rows: Vec<ScheduleRowInput> = stored
        .iter()
        .map(|entry| {
            ScheduleRowInput::new(
                entry.day.wire_name(),
                entry.room_id.as_str(),
                &entry.start_time,
                &entry.end_time,
            )
        })
        .collect();
    if rows.is_empty() {
        rows.push(ScheduleRowInput::default());
    }
    rows
}

#[cfg(test)]
#[path = "tests/schedule_tests.rs"]
mod tests;
