use thiserror::Error;

/// Failures detected before any request leaves the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{field} is not a valid time: {value}")]
    InvalidTime { field: &'static str, value: String },
    #[error("{field} is not a valid date: {value}")]
    InvalidDate { field: &'static str, value: String },
    #[error("unknown day of week: {0}")]
    InvalidDay(String),
    #[error("start time {start} must be earlier than end time {end}")]
    InvertedTimeRange { start: String, end: String },
    #[error("purpose is required")]
    EmptyPurpose,
    #[error("select a classroom first")]
    NoSelection,
    #[error("classroom {0} is not part of the current search results")]
    UnknownCandidate(String),
    #[error("{action} is not available for reservation {reservation_id} while {status}")]
    TransitionNotAllowed {
        reservation_id: String,
        action: &'static str,
        status: String,
    },
    #[error("complete all schedule fields correctly (row {row})")]
    IncompleteScheduleRow { row: usize },
    #[error("new password must differ from the current one")]
    PasswordUnchanged,
    #[error("password confirmation does not match")]
    PasswordMismatch,
}

impl ValidationError {
    /// Name of the form field the error should be rendered next to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field)
            | ValidationError::InvalidTime { field, .. }
            | ValidationError::InvalidDate { field, .. } => field,
            ValidationError::InvalidDay(_) => "day_of_week",
            ValidationError::InvertedTimeRange { .. } => "end_time",
            ValidationError::EmptyPurpose => "purpose",
            ValidationError::NoSelection | ValidationError::UnknownCandidate(_) => "classroom_id",
            ValidationError::TransitionNotAllowed { .. } => "reservation_id",
            ValidationError::IncompleteScheduleRow { .. } => "horarios",
            ValidationError::PasswordUnchanged => "new_password",
            ValidationError::PasswordMismatch => "confirm_password",
        }
    }
}
