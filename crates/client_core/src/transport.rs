use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, COOKIE},
    Client, Response,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{
        CandidateResource, CourseGroupId, CourseId, LabId, ReservationId, ReservationSummary,
    },
    protocol::{
        CampaignStatus, ConflictCheckRequest, ConflictCheckResponse, CourseProgress,
        CourseProgressResponse, CreateReservationBody, EnrolledStudent,
        EnrolledStudentsResponse, LabDetails, LabDetailsResponse, MutationResponse,
        PasswordChangeRequest, PostulationRequest, RejectReservationBody,
        ReservationActionBody, ReservationListResponse, ScheduleEntryBody,
        ScheduleListResponse, ScheduleSaveRequest, SearchQuery, SearchResponse,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::{
    csrf::{CookieCsrfToken, CsrfTokenProvider, MissingCsrfToken, CSRF_HEADER, DEFAULT_CSRF_COOKIE},
    error::{BusinessError, RemoteError},
    AccountApi, CampaignApi, ProgressApi, ReservationApi, ScheduleApi,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct HttpClientOptions {
    pub base_url: String,
    /// Raw `Cookie` header of the browser session; carries both the session
    /// id and the anti-forgery cookie.
    pub cookie_header: Option<String>,
    pub csrf_cookie_name: String,
    pub timeout: Duration,
}

impl HttpClientOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            cookie_header: None,
            csrf_cookie_name: DEFAULT_CSRF_COOKIE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub struct HttpReservationClient {
    http: Client,
    base_url: Url,
    csrf: Arc<dyn CsrfTokenProvider>,
}

impl HttpReservationClient {
    pub fn new(options: HttpClientOptions) -> anyhow::Result<Self> {
        let base_url = parse_base_url(&options.base_url)?;

        let mut headers = HeaderMap::new();
        if let Some(cookie_header) = &options.cookie_header {
            headers.insert(
                COOKIE,
                HeaderValue::from_str(cookie_header).context("invalid cookie header")?,
            );
        }
        let http = Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()
            .context("failed to build http client")?;

        let csrf: Arc<dyn CsrfTokenProvider> = match options.cookie_header {
            Some(cookie_header) => Arc::new(CookieCsrfToken::new(
                options.csrf_cookie_name,
                cookie_header,
            )),
            None => Arc::new(MissingCsrfToken),
        };

        Ok(Self {
            http,
            base_url,
            csrf,
        })
    }

    pub fn with_csrf_provider(mut self, csrf: Arc<dyn CsrfTokenProvider>) -> Self {
        self.csrf = csrf;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                RemoteError::Transport(format!("cannot build endpoint on {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T, Q>(&self, segments: &[&str], query: Option<&Q>) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        debug!(%url, "GET");
        let mut request = self.http.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        read_json(request.send().await?).await
    }

    async fn post_json<T, B>(&self, segments: &[&str], body: &B) -> Result<T, RemoteError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.endpoint(segments)?;
        debug!(%url, "POST");
        let mut request = self.http.post(url).json(body);
        match self.csrf.token() {
            Some(token) => request = request.header(CSRF_HEADER, token),
            None => warn!(
                endpoint = %segments.join("/"),
                "no anti-forgery token available for mutating request"
            ),
        }
        read_json(request.send().await?).await
    }

    async fn mutate<B>(&self, segments: &[&str], body: &B) -> Result<(), RemoteError>
    where
        B: Serialize + ?Sized,
    {
        let response: MutationResponse = self.post_json(segments, body).await?;
        if response.success {
            Ok(())
        } else {
            Err(RemoteError::Business(BusinessError::from(&response)))
        }
    }
}

fn parse_base_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid server url: {raw}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!("server url must start with http:// or https://"));
    }
    if url.cannot_be_a_base() {
        return Err(anyhow!("server url cannot be used as a base: {raw}"));
    }
    Ok(url)
}

/// The backend answers validation failures with 4xx plus a JSON body, so the
/// body is decoded whatever the status. Only an undecodable body (HTML error
/// page, proxy failure) is a transport error.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
    let status = response.status();
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|err| {
        if status.is_success() {
            RemoteError::Transport(format!("invalid JSON response: {err}"))
        } else {
            RemoteError::Transport(format!("server responded with {status}"))
        }
    })
}

fn failure(error: Option<String>) -> RemoteError {
    RemoteError::Business(BusinessError::new(error))
}

#[async_trait]
impl ReservationApi for HttpReservationClient {
    async fn search_available(
        &self,
        query: &SearchQuery,
    ) -> Result<Vec<CandidateResource>, RemoteError> {
        let response: SearchResponse = self
            .get_json(&["reservations", "search"], Some(query))
            .await?;
        if response.success {
            Ok(response.classrooms)
        } else {
            Err(failure(response.error))
        }
    }

    async fn create_reservation(&self, body: &CreateReservationBody) -> Result<(), RemoteError> {
        self.mutate(&["reservations", "create"], body).await
    }

    async fn approve_reservation(&self, reservation_id: &ReservationId) -> Result<(), RemoteError> {
        let body = ReservationActionBody {
            reservation_id: reservation_id.clone(),
        };
        self.mutate(&["reservations", "approve"], &body).await
    }

    async fn reject_reservation(&self, body: &RejectReservationBody) -> Result<(), RemoteError> {
        self.mutate(&["reservations", "reject"], body).await
    }

    async fn cancel_reservation(&self, reservation_id: &ReservationId) -> Result<(), RemoteError> {
        let body = ReservationActionBody {
            reservation_id: reservation_id.clone(),
        };
        self.mutate(&["reservations", "cancel"], &body).await
    }

    async fn list_reservations(&self) -> Result<Vec<ReservationSummary>, RemoteError> {
        let response: ReservationListResponse = self
            .get_json::<_, ()>(&["reservations", "list"], None)
            .await?;
        if response.success {
            Ok(response.reservations)
        } else {
            Err(failure(response.error))
        }
    }
}

#[async_trait]
impl ScheduleApi for HttpReservationClient {
    async fn check_conflicts(
        &self,
        request: &ConflictCheckRequest,
    ) -> Result<ConflictCheckResponse, RemoteError> {
        self.post_json(&["schedules", "check-conflicts"], request)
            .await
    }

    async fn save_schedule(&self, request: &ScheduleSaveRequest) -> Result<(), RemoteError> {
        self.mutate(&["schedules", "save"], request).await
    }

    async fn group_schedule(
        &self,
        course_group_id: &CourseGroupId,
    ) -> Result<Vec<ScheduleEntryBody>, RemoteError> {
        let response: ScheduleListResponse = self
            .get_json::<_, ()>(&["schedules", "group", course_group_id.as_str()], None)
            .await?;
        if response.success {
            Ok(response.horarios)
        } else {
            Err(failure(response.error))
        }
    }
}

#[async_trait]
impl CampaignApi for HttpReservationClient {
    async fn campaign_status(&self, course_id: &CourseId) -> Result<CampaignStatus, RemoteError> {
        self.get_json::<_, ()>(
            &["laboratories", "campaign-status", course_id.as_str()],
            None,
        )
        .await
    }

    async fn lab_details(&self, lab_id: &LabId) -> Result<LabDetails, RemoteError> {
        let response: LabDetailsResponse = self
            .get_json::<_, ()>(&["laboratories", lab_id.as_str(), "details"], None)
            .await?;
        match response {
            LabDetailsResponse {
                success: true,
                lab: Some(lab),
                ..
            } => Ok(lab),
            LabDetailsResponse { error, .. } => Err(failure(error)),
        }
    }

    async fn postulate(&self, request: &PostulationRequest) -> Result<(), RemoteError> {
        self.mutate(&["laboratories", "postulate"], request).await
    }

    async fn enrolled_students(&self, lab_id: &LabId) -> Result<Vec<EnrolledStudent>, RemoteError> {
        let response: EnrolledStudentsResponse = self
            .get_json::<_, ()>(
                &["laboratories", "enrolled-students", lab_id.as_str()],
                None,
            )
            .await?;
        match response.error {
            Some(error) => Err(failure(Some(error))),
            None => Ok(response.students),
        }
    }
}

#[async_trait]
impl ProgressApi for HttpReservationClient {
    async fn course_progress(
        &self,
        course_group_id: &CourseGroupId,
    ) -> Result<CourseProgress, RemoteError> {
        let response: CourseProgressResponse = self
            .get_json::<_, ()>(&["courses", "progress", course_group_id.as_str()], None)
            .await?;
        response.into_result().map_err(|error| failure(Some(error)))
    }
}

#[async_trait]
impl AccountApi for HttpReservationClient {
    async fn change_password(&self, request: &PasswordChangeRequest) -> Result<(), RemoteError> {
        self.mutate(&["accounts", "change-password"], request).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
