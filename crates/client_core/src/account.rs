//! Password change form.

use shared::{error::ValidationError, protocol::PasswordChangeRequest};
use tracing::{info, warn};

use crate::{
    error::{RemoteError, WorkflowError},
    view::{ControlState, Notice, NoticeLevel},
    AccountApi,
};

pub const PASSWORD_UPDATED_MESSAGE: &str = "Password updated.";
const OLD_PASSWORD_ERROR_TYPE: &str = "old_password";

#[derive(Debug, Clone)]
pub struct PasswordForm {
    save: ControlState,
    notices: Vec<Notice>,
}

impl Default for PasswordForm {
    fn default() -> Self {
        Self {
            save: ControlState::Enabled,
            notices: Vec::new(),
        }
    }
}

impl PasswordForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_state(&self) -> ControlState {
        self.save
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Live check run while the new password is typed.
    pub fn check_new_password(old_password: &str, new_password: &str) -> Result<(), ValidationError> {
        if !new_password.is_empty() && new_password == old_password {
            return Err(ValidationError::PasswordUnchanged);
        }
        Ok(())
    }

    pub fn begin(
        &mut self,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<PasswordChangeRequest, WorkflowError> {
        self.notices.clear();
        if self.save == ControlState::Busy {
            return Err(WorkflowError::Busy(crate::ActionKind::Submit));
        }
        let checked = Self::check_new_password(old_password, new_password).and_then(|_| {
            if new_password != confirm_password {
                Err(ValidationError::PasswordMismatch)
            } else {
                Ok(())
            }
        });
        if let Err(err) = checked {
            self.notices
                .push(Notice::field_error(err.field(), err.to_string()));
            return Err(err.into());
        }

        self.save = ControlState::Busy;
        Ok(PasswordChangeRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
            confirm_password: confirm_password.to_string(),
        })
    }

    pub fn finish(&mut self, result: Result<(), RemoteError>) -> Result<(), WorkflowError> {
        self.save = ControlState::Enabled;
        match result {
            Ok(()) => {
                info!("password changed");
                self.notices
                    .push(Notice::alert(NoticeLevel::Success, PASSWORD_UPDATED_MESSAGE));
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "password change failed");
                let notice = match &err {
                    RemoteError::Business(business)
                        if business.error_type.as_deref() == Some(OLD_PASSWORD_ERROR_TYPE) =>
                    {
                        Notice::field_error("old_password", business.to_string())
                    }
                    _ => Notice::dialog(NoticeLevel::Error, err.user_message()),
                };
                self.notices.push(notice);
                Err(err.into())
            }
        }
    }

    pub async fn submit(
        &mut self,
        api: &dyn AccountApi,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), WorkflowError> {
        let request = self.begin(old_password, new_password, confirm_password)?;
        let result = api.change_password(&request).await;
        self.finish(result)
    }
}

#[cfg(test)]
#[path = "tests/account_tests.rs"]
mod tests;
