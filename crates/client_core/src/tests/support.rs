use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use shared::{
    domain::{
        CampaignPhase, CandidateResource, CourseGroupId, CourseId, LabId, ReservationId,
        ReservationStatus, ReservationSummary, ResourceId,
    },
    protocol::{
        CampaignStatus, ConflictCheckRequest, ConflictCheckResponse, CourseProgress,
        CreateReservationBody, EnrolledStudent, LabDetails, PasswordChangeRequest,
        PostulationRequest, RejectReservationBody, ScheduleEntryBody, ScheduleSaveRequest,
        SearchQuery,
    },
};
use tokio::sync::Mutex;

use crate::{
    error::RemoteError, AccountApi, CampaignApi, ProgressApi, ReservationApi, ScheduleApi,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Search(SearchQuery),
    Create(CreateReservationBody),
    Approve(ReservationId),
    Reject(RejectReservationBody),
    Cancel(ReservationId),
    List,
    CheckConflicts(ConflictCheckRequest),
    SaveSchedule(ScheduleSaveRequest),
    GroupSchedule(CourseGroupId),
    CampaignStatus(CourseId),
    LabDetails(LabId),
    Postulate(PostulationRequest),
    EnrolledStudents(LabId),
    CourseProgress(CourseGroupId),
    ChangePassword(PasswordChangeRequest),
}

/// In-memory backend. Queued results are consumed in order; an empty queue
/// answers with success.
#[derive(Default)]
pub(crate) struct FakeApi {
    calls: Mutex<Vec<Call>>,
    search_results: Mutex<VecDeque<Result<Vec<CandidateResource>, RemoteError>>>,
    mutation_results: Mutex<VecDeque<Result<(), RemoteError>>>,
    reservations: Mutex<Vec<ReservationSummary>>,
    list_error: Mutex<Option<RemoteError>>,
    conflict_result: Mutex<Option<Result<ConflictCheckResponse, RemoteError>>>,
    campaign_statuses: Mutex<HashMap<CourseId, Result<CampaignStatus, RemoteError>>>,
    lab_details: Mutex<Option<Result<LabDetails, RemoteError>>>,
    group_schedule: Mutex<Option<Result<Vec<ScheduleEntryBody>, RemoteError>>>,
    students: Mutex<Option<Result<Vec<EnrolledStudent>, RemoteError>>>,
    progress: Mutex<Option<Result<CourseProgress, RemoteError>>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn push_search(&self, result: Result<Vec<CandidateResource>, RemoteError>) {
        self.search_results.lock().await.push_back(result);
    }

    pub(crate) async fn push_mutation(&self, result: Result<(), RemoteError>) {
        self.mutation_results.lock().await.push_back(result);
    }

    pub(crate) async fn set_reservations(&self, reservations: Vec<ReservationSummary>) {
        *self.reservations.lock().await = reservations;
    }

    pub(crate) async fn fail_list(&self, err: RemoteError) {
        *self.list_error.lock().await = Some(err);
    }

    pub(crate) async fn set_conflict_result(
        &self,
        result: Result<ConflictCheckResponse, RemoteError>,
    ) {
        *self.conflict_result.lock().await = Some(result);
    }

    pub(crate) async fn set_campaign_status(
        &self,
        course_id: &str,
        result: Result<CampaignStatus, RemoteError>,
    ) {
        self.campaign_statuses
            .lock()
            .await
            .insert(CourseId::from(course_id), result);
    }

    pub(crate) async fn set_lab_details(&self, result: Result<LabDetails, RemoteError>) {
        *self.lab_details.lock().await = Some(result);
    }

    pub(crate) async fn set_group_schedule(
        &self,
        result: Result<Vec<ScheduleEntryBody>, RemoteError>,
    ) {
        *self.group_schedule.lock().await = Some(result);
    }

    pub(crate) async fn set_students(&self, result: Result<Vec<EnrolledStudent>, RemoteError>) {
        *self.students.lock().await = Some(result);
    }

    pub(crate) async fn set_progress(&self, result: Result<CourseProgress, RemoteError>) {
        *self.progress.lock().await = Some(result);
    }

    pub(crate) async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    pub(crate) async fn network_calls(&self) -> usize {
        self.calls.lock().await.len()
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }

    async fn next_mutation(&self) -> Result<(), RemoteError> {
        self.mutation_results
            .lock()
            .await
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

#[async_trait]
impl ReservationApi for FakeApi {
    async fn search_available(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<CandidateResource>, RemoteError> {
        self.record(Call::Search(query.clone())).await;
        self.search_results
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create_reservation(&self, body: &CreateReservationBody) -> Result<(), RemoteError> {
        self.record(Call::Create(body.clone())).await;
        self.next_mutation().await
    }

    async fn approve_reservation(&self, reservation_id: &ReservationId) -> Result<(), RemoteError> {
        self.record(Call::Approve(reservation_id.clone())).await;
        self.next_mutation().await
    }

    async fn reject_reservation(&self, body: &RejectReservationBody) -> Result<(), RemoteError> {
        self.record(Call::Reject(body.clone())).await;
        self.next_mutation().await
    }

    async fn cancel_reservation(&self, reservation_id: &ReservationId) -> Result<(), RemoteError> {
        self.record(Call::Cancel(reservation_id.clone())).await;
        self.next_mutation().await
    }

    async fn list_reservations(&self) -> Result<Vec<ReservationSummary>, RemoteError> {
        self.record(Call::List).await;
        if let Some(err) = self.list_error.lock().await.clone() {
            return Err(err);
        }
        Ok(self.reservations.lock().await.clone())
    }
}

#[async_trait]
impl ScheduleApi for FakeApi {
    async fn check_conflicts(
        &self,
        request: &ConflictCheckRequest,
    ) -> Result<ConflictCheckResponse, RemoteError> {
        self.record(Call::CheckConflicts(request.clone())).await;
        self.conflict_result
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| {
                Ok(ConflictCheckResponse {
                    has_conflict: false,
                    messages: Vec::new(),
                })
            })
    }

    async fn save_schedule(&self, request: &ScheduleSaveRequest) -> Result<(), RemoteError> {
        self.record(Call::SaveSchedule(request.clone())).await;
        self.next_mutation().await
    }

    async fn group_schedule(
        &self,
        course_group_id: &CourseGroupId,
    ) -> Result<Vec<ScheduleEntryBody>, RemoteError> {
        self.record(Call::GroupSchedule(course_group_id.clone())).await;
        self.group_schedule
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl CampaignApi for FakeApi {
    async fn campaign_status(&self, course_id: &CourseId) -> Result<CampaignStatus, RemoteError> {
        self.record(Call::CampaignStatus(course_id.clone())).await;
        self.campaign_statuses
            .lock()
            .await
            .get(course_id)
            .cloned()
            .unwrap_or_else(|| Ok(campaign_status(course_id.as_str(), CampaignPhase::Open)))
    }

    async fn lab_details(&self, lab_id: &LabId) -> Result<LabDetails, RemoteError> {
        self.record(Call::LabDetails(lab_id.clone())).await;
        self.lab_details
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| Err(RemoteError::business(["lab not found"])))
    }

    async fn postulate(&self, request: &PostulationRequest) -> Result<(), RemoteError> {
        self.record(Call::Postulate(request.clone())).await;
        self.next_mutation().await
    }

    async fn enrolled_students(&self, lab_id: &LabId) -> Result<Vec<EnrolledStudent>, RemoteError> {
        self.record(Call::EnrolledStudents(lab_id.clone())).await;
        self.students
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl ProgressApi for FakeApi {
    async fn course_progress(
        &self,
        course_group_id: &CourseGroupId,
    ) -> Result<CourseProgress, RemoteError> {
        self.record(Call::CourseProgress(course_group_id.clone())).await;
        self.progress
            .lock()
            .await
            .clone()
            .unwrap_or_else(|| Err(RemoteError::business(["group not found"])))
    }
}

#[async_trait]
impl AccountApi for FakeApi {
    async fn change_password(&self, request: &PasswordChangeRequest) -> Result<(), RemoteError> {
        self.record(Call::ChangePassword(request.clone())).await;
        self.next_mutation().await
    }
}

pub(crate) fn candidate(id: &str, code: &str) -> CandidateResource {
    CandidateResource {
        id: ResourceId::from(id),
        code: code.to_string(),
        name: format!("Room {code}"),
        kind: "LAB".to_string(),
        location: "Building B".to_string(),
        capacity: 30,
    }
}

pub(crate) fn reservation(id: &str, status: ReservationStatus) -> ReservationSummary {
    ReservationSummary {
        reservation_id: ReservationId::from(id),
        classroom_code: "LAB-3".to_string(),
        date: "2025-03-10".to_string(),
        start_time: "08:00".to_string(),
        end_time: "10:00".to_string(),
        purpose: "Makeup class".to_string(),
        status,
        rejection_reason: None,
    }
}

pub(crate) fn campaign_status(course_id: &str, phase: CampaignPhase) -> CampaignStatus {
    CampaignStatus {
        course_id: CourseId::from(course_id),
        status: phase,
        postulations: 12,
        capacity: 40,
        message: None,
    }
}

pub(crate) fn student(order: u32, full_name: &str) -> EnrolledStudent {
    EnrolledStudent {
        order,
        full_name: full_name.to_string(),
        email: format!("{}@campus.example.edu", full_name.to_lowercase().replace(' ', ".")),
        timestamp: "2025-03-01 09:15".to_string(),
        has_conflict: false,
    }
}
