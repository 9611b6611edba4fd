use serde::{Deserialize, Serialize};

use crate::domain::{
    CampaignId, CampaignPhase, CandidateResource, CourseGroupId, CourseId, DayOfWeek, LabId,
    ReservationId, ReservationRequest, ReservationSummary, ResourceId, RoomId, ScheduleEntry,
    TimeRange, DATE_FORMAT,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
}

impl SearchQuery {
    pub fn new(date: chrono::NaiveDate, window: TimeRange) -> Self {
        Self {
            date: date.format(DATE_FORMAT).to_string(),
            start_time: window.start_label(),
            end_time: window.end_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(default)]
    pub classrooms: Vec<CandidateResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReservationBody {
    pub classroom_id: ResourceId,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub purpose: String,
}

impl From<&ReservationRequest> for CreateReservationBody {
    fn from(request: &ReservationRequest) -> Self {
        Self {
            classroom_id: request.resource_id().clone(),
            date: request.date().format(DATE_FORMAT).to_string(),
            start_time: request.window().start_label(),
            end_time: request.window().end_label(),
            purpose: request.purpose().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationActionBody {
    pub reservation_id: ReservationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectReservationBody {
    pub reservation_id: ReservationId,
    pub reason: String,
}

/// Reply shape shared by every mutating endpoint.
///
/// Failures carry either an `errors` list (create, postulate), a single
/// `error` string (lifecycle actions, schedule save) or a `message` with an
/// optional `error_type` (password change).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MutationResponse {
    pub fn failure_messages(&self) -> Vec<String> {
        if !self.errors.is_empty() {
            return self.errors.clone();
        }
        self.error
            .iter()
            .chain(self.message.iter())
            .take(1)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationListResponse {
    pub success: bool,
    #[serde(default)]
    pub reservations: Vec<ReservationSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictCheckRequest {
    pub course_id: CourseId,
    pub day_of_week: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
    pub room_id: Option<RoomId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub has_conflict: bool,
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntryBody {
    pub day: DayOfWeek,
    pub room_id: RoomId,
    pub start_time: String,
    pub end_time: String,
}

impl From<&ScheduleEntry> for ScheduleEntryBody {
    fn from(entry: &ScheduleEntry) -> Self {
        Self {
            day: entry.day,
            room_id: entry.room_id.clone(),
            start_time: entry.window.start_label(),
            end_time: entry.window.end_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSaveRequest {
    pub course_group_id: CourseGroupId,
    pub horarios: Vec<ScheduleEntryBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStatus {
    pub course_id: CourseId,
    pub status: CampaignPhase,
    #[serde(default)]
    pub postulations: u32,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabDetails {
    pub day: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabDetailsResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab: Option<LabDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostulationRequest {
    pub campaign_id: CampaignId,
    pub lab_id: LabId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Reply of the schedule read used to refresh the editor after a save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleListResponse {
    pub success: bool,
    #[serde(default)]
    pub horarios: Vec<ScheduleEntryBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledStudent {
    pub order: u32,
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub has_conflict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrolledStudentsResponse {
    #[serde(default)]
    pub students: Vec<EnrolledStudent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProgress {
    pub number: u32,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusUnit {
    pub unit_name: String,
    #[serde(default)]
    pub sessions: Vec<SessionProgress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseProgress {
    pub course_name: String,
    pub group_name: String,
    pub syllabus_data: Vec<SyllabusUnit>,
}

impl CourseProgress {
    pub fn session_count(&self) -> usize {
        self.syllabus_data.iter().map(|unit| unit.sessions.len()).sum()
    }

    pub fn completed_count(&self) -> usize {
        self.syllabus_data
            .iter()
            .flat_map(|unit| &unit.sessions)
            .filter(|session| session.is_completed)
            .count()
    }
}

/// Either the progress payload or `{error}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseProgressResponse {
    #[serde(default)]
    pub course_name: String,
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub syllabus_data: Vec<SyllabusUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CourseProgressResponse {
    pub fn into_result(self) -> Result<CourseProgress, String> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(CourseProgress {
            course_name: self.course_name,
            group_name: self.group_name,
            syllabus_data: self.syllabus_data,
        })
    }
}
