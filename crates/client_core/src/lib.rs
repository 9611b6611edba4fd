//! Headless client for the academic-management backend: availability search
//! and classroom reservations, lifecycle actions, schedule conflict checks,
//! lab enrollment campaigns and account settings.

use async_trait::async_trait;
use shared::{
    domain::{
        CandidateResource, CourseGroupId, CourseId, LabId, ReservationId, ReservationSummary,
    },
    protocol::{
        CampaignStatus, ConflictCheckRequest, ConflictCheckResponse, CourseProgress,
        CreateReservationBody, EnrolledStudent, LabDetails, PasswordChangeRequest,
        PostulationRequest, RejectReservationBody, ScheduleEntryBody, ScheduleSaveRequest,
        SearchQuery,
    },
};

pub mod account;
pub mod campaign;
pub mod controller;
pub mod csrf;
pub mod error;
pub mod lifecycle;
pub mod reports;
pub mod schedule;
pub mod transport;
pub mod view;
pub mod workflow;

pub use controller::{ActionKind, ActionOutcome, ReservationController, WorkflowAction, WorkflowEvent};
pub use error::{BusinessError, RemoteError, WorkflowError};
pub use transport::{HttpClientOptions, HttpReservationClient};

#[async_trait]
pub trait ReservationApi: Send + Sync {
    async fn search_available(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<CandidateResource>, RemoteError>;
    async fn create_reservation(&self, body: &CreateReservationBody) -> Result<(), RemoteError>;
    async fn approve_reservation(&self, reservation_id: &ReservationId) -> Result<(), RemoteError>;
    async fn reject_reservation(&self, body: &RejectReservationBody) -> Result<(), RemoteError>;
    async fn cancel_reservation(&self, reservation_id: &ReservationId) -> Result<(), RemoteError>;
    /// Authoritative reservation list, fetched at start-up and after every
    /// successful mutation.
    async fn list_reservations(&self) -> Result<Vec<ReservationSummary>, RemoteError>;
}

#[async_trait]
pub trait ScheduleApi: Send + Sync {
    async fn check_conflicts(
        &self,
        request: &ConflictCheckRequest,
    ) -> Result<ConflictCheckResponse, RemoteError>;
    async fn save_schedule(&self, request: &ScheduleSaveRequest) -> Result<(), RemoteError>;
    /// Stored schedule of one course group, reloaded after a save.
    async fn group_schedule(
        &self,
        course_group_id: &CourseGroupId,
    ) -> Result<Vec<ScheduleEntryBody>, RemoteError>;
}

#[async_trait]
pub trait CampaignApi: Send + Sync {
    async fn campaign_status(&self, course_id: &CourseId) -> Result<CampaignStatus, RemoteError>;
    async fn lab_details(&self, lab_id: &LabId) -> Result<LabDetails, RemoteError>;
    async fn postulate(&self, request: &PostulationRequest) -> Result<(), RemoteError>;
    async fn enrolled_students(&self, lab_id: &LabId) -> Result<Vec<EnrolledStudent>, RemoteError>;
}

#[async_trait]
pub trait ProgressApi: Send + Sync {
    async fn course_progress(
        &self,
        course_group_id: &CourseGroupId,
    ) -> Result<CourseProgress, RemoteError>;
}

#[async_trait]
pub trait AccountApi: Send + Sync {
    async fn change_password(&self, request: &PasswordChangeRequest) -> Result<(), RemoteError>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
