use std::fmt;

use shared::{error::ValidationError, protocol::MutationResponse};
use thiserror::Error;

use crate::controller::ActionKind;

pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error. Please try again.";

/// A `success: false` reply. Messages are shown to the user verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessError {
    pub messages: Vec<String>,
    pub error_type: Option<String>,
}

impl BusinessError {
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            error_type: None,
        }
    }
}

impl From<&MutationResponse> for BusinessError {
    fn from(response: &MutationResponse) -> Self {
        Self {
            messages: response.failure_messages(),
            error_type: response.error_type.clone(),
        }
    }
}

impl fmt::Display for BusinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.messages.is_empty() {
            return f.write_str("request rejected by server");
        }
        f.write_str(&self.messages.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("{0}")]
    Business(BusinessError),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl RemoteError {
    pub fn business<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RemoteError::Business(BusinessError::new(messages))
    }

    /// Text for the user: the server's own messages, or the generic
    /// connectivity message when the server gave none.
    pub fn user_message(&self) -> String {
        match self {
            RemoteError::Business(err) if !err.messages.is_empty() => err.messages.join(", "),
            _ => CONNECTION_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Transport(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Business,
    Transport,
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error("{0:?} is already in progress")]
    Busy(ActionKind),
}

impl WorkflowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WorkflowError::Validation(_) => ErrorCategory::Validation,
            WorkflowError::Remote(RemoteError::Business(_)) => ErrorCategory::Business,
            WorkflowError::Remote(RemoteError::Transport(_)) => ErrorCategory::Transport,
            WorkflowError::Busy(_) => ErrorCategory::Busy,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Remote(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
