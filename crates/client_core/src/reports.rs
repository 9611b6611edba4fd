//! Read-only dialogs: the students enrolled in a lab and the session
//! timeline of a course group.

use shared::{
    domain::{CourseGroupId, LabId},
    protocol::{CourseProgress, EnrolledStudent},
};
use tracing::{debug, warn};

use crate::{
    error::RemoteError,
    view::{Loadable, Notice, NoticeLevel},
    CampaignApi, ProgressApi,
};

pub const LOADING_MESSAGE: &str = "Loading...";
pub const NO_STUDENTS_MESSAGE: &str = "No students enrolled yet";
pub const NO_SESSIONS_MESSAGE: &str = "No sessions recorded.";

#[derive(Debug, Clone)]
pub struct EnrolledStudentsDialog {
    lab_id: Option<LabId>,
    title: String,
    content: Loadable<Vec<EnrolledStudent>>,
}

impl Default for EnrolledStudentsDialog {
    fn default() -> Self {
        Self {
            lab_id: None,
            title: String::new(),
            content: Loadable::Loading,
        }
    }
}

impl EnrolledStudentsDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, lab_id: LabId, lab_name: &str) -> LabId {
        self.lab_id = Some(lab_id.clone());
        self.title = format!("Enrolled students: {lab_name}");
        self.content = Loadable::Loading;
        lab_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &Loadable<Vec<EnrolledStudent>> {
        &self.content
    }

    /// Message shown in place of the table, if any.
    pub fn notice(&self) -> Option<Notice> {
        match &self.content {
            Loadable::Loading => Some(Notice::dialog(NoticeLevel::Info, LOADING_MESSAGE)),
            Loadable::Empty => Some(Notice::dialog(NoticeLevel::Info, NO_STUDENTS_MESSAGE)),
            Loadable::Ready(_) => None,
            Loadable::Failed(notice) => Some(notice.clone()),
        }
    }

    pub fn apply(&mut self, lab_id: &LabId, result: Result<Vec<EnrolledStudent>, RemoteError>) {
        if self.lab_id.as_ref() != Some(lab_id) {
            debug!(%lab_id, "dropping students for a lab no longer shown");
            return;
        }
        self.content = match result {
            Ok(students) if students.is_empty() => Loadable::Empty,
            Ok(students) => {
                debug!(%lab_id, count = students.len(), "enrolled students loaded");
                Loadable::Ready(students)
            }
            Err(err) => {
                warn!(%lab_id, error = %err, "failed to load enrolled students");
                Loadable::Failed(Notice::dialog(
                    NoticeLevel::Error,
                    format!("Could not load students: {}", err.user_message()),
                ))
            }
        };
    }

    pub async fn load(&mut self, api: &dyn CampaignApi) {
        let Some(lab_id) = self.lab_id.clone() else {
            return;
        };
        let result = api.enrolled_students(&lab_id).await;
        self.apply(&lab_id, result);
    }
}

#[derive(Debug, Clone)]
pub struct ProgressDialog {
    course_group_id: Option<CourseGroupId>,
    title: String,
    subtitle: String,
    content: Loadable<CourseProgress>,
}

impl Default for ProgressDialog {
    fn default() -> Self {
        Self {
            course_group_id: None,
            title: LOADING_MESSAGE.to_string(),
            subtitle: String::new(),
            content: Loadable::Loading,
        }
    }
}

impl ProgressDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, course_group_id: CourseGroupId) -> CourseGroupId {
        *self = Self {
            course_group_id: Some(course_group_id.clone()),
            ..Self::default()
        };
        course_group_id
    }

    /// Course name once loaded.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Group name once loaded.
    pub fn subtitle(&self) -> &str {
        &self.subtitle
    }

    pub fn content(&self) -> &Loadable<CourseProgress> {
        &self.content
    }

    pub fn notice(&self) -> Option<Notice> {
        match &self.content {
            Loadable::Loading => Some(Notice::dialog(NoticeLevel::Info, LOADING_MESSAGE)),
            Loadable::Empty => Some(Notice::dialog(NoticeLevel::Info, NO_SESSIONS_MESSAGE)),
            Loadable::Ready(_) => None,
            Loadable::Failed(notice) => Some(notice.clone()),
        }
    }

    /// A server `{error}` is shown as a warning; transport failures get the
    /// generic connection message.
    pub fn apply(
        &mut self,
        course_group_id: &CourseGroupId,
        result: Result<CourseProgress, RemoteError>,
    ) {
        if self.course_group_id.as_ref() != Some(course_group_id) {
            debug!(%course_group_id, "dropping progress for a group no longer shown");
            return;
        }
        self.content = match result {
            Ok(progress) => {
                self.title = progress.course_name.clone();
                self.subtitle = progress.group_name.clone();
                if progress.session_count() == 0 {
                    Loadable::Empty
                } else {
                    debug!(
                        %course_group_id,
                        sessions = progress.session_count(),
                        completed = progress.completed_count(),
                        "course progress loaded"
                    );
                    Loadable::Ready(progress)
                }
            }
            Err(err) => {
                warn!(%course_group_id, error = %err, "failed to load course progress");
                let level = if err.is_transport() {
                    NoticeLevel::Error
                } else {
                    NoticeLevel::Warning
                };
                Loadable::Failed(Notice::dialog(level, err.user_message()))
            }
        };
    }

    pub async fn load(&mut self, api: &dyn ProgressApi) {
        let Some(course_group_id) = self.course_group_id.clone() else {
            return;
        };
        let result = api.course_progress(&course_group_id).await;
        self.apply(&course_group_id, result);
    }
}

#[cfg(test)]
#[path = "tests/reports_tests.rs"]
mod tests;
