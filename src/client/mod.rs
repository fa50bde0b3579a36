// client/mod.rs
pub mod cache;

use std::collections::VecDeque;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    dtos::{
        jobdtos::{CreateApplicationDto, CreateJobDto, CreateReviewDto, SearchJobsDto, UpdateJobDto},
        notificationdtos::{AffectedDto, NotificationListDto, NotificationQueryDto, UnreadCountDto},
        userdtos::{
            FilterUserDto, LoginUserDto, PublicProfile, RegisterUserDto, UpdateProfileDto,
            UserData, UserLoginResponseDto,
        },
        ApiResponse,
    },
    error::ErrorResponse,
    handler::events::RESYNC_EVENT,
    models::{
        jobmodel::{AcceptOutcome, Application, Job, JobStatus, Review},
        notificationmodel::Notification,
        usermodel::UserRole,
    },
    service::realtime::ChangeEvent,
};
use cache::DataCache;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Sign in first")]
    NotAuthenticated,
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::NotAuthenticated => Some(StatusCode::UNAUTHORIZED),
            ClientError::Http(e) => e.status(),
            ClientError::Decode(_) => None,
        }
    }
}

/// Typed wrapper over the HTTP API. Holds the bearer token after `login`.
#[derive(Debug, Clone)]
pub struct MarketClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl MarketClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub async fn register(&self, body: &RegisterUserDto) -> Result<FilterUserDto, ClientError> {
        let data: UserData = self
            .send(self.request(Method::POST, "/api/auth/register").json(body))
            .await?;
        Ok(data.user)
    }

    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<FilterUserDto, ClientError> {
        let body = LoginUserDto {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self
            .request(Method::POST, "/api/auth/login")
            .json(&body)
            .send()
            .await?;
        let login: UserLoginResponseDto = decode(response).await?;

        self.token = Some(login.token);
        Ok(login.user)
    }

    pub async fn logout(&mut self) -> Result<(), ClientError> {
        let response = self.request(Method::POST, "/api/auth/logout").send().await?;
        let _: serde_json::Value = decode(response).await?;
        self.token = None;
        Ok(())
    }

    pub async fn me(&self) -> Result<FilterUserDto, ClientError> {
        let data: UserData = self.send(self.authed(Method::GET, "/api/users/me")?).await?;
        Ok(data.user)
    }

    pub async fn update_profile(
        &self,
        body: &UpdateProfileDto,
    ) -> Result<FilterUserDto, ClientError> {
        let data: UserData = self
            .send(self.authed(Method::PUT, "/api/users/me/profile")?.json(body))
            .await?;
        Ok(data.user)
    }

    pub async fn user_profile(&self, user_id: Uuid) -> Result<PublicProfile, ClientError> {
        self.send(self.authed(Method::GET, &format!("/api/users/{}", user_id))?)
            .await
    }

    pub async fn user_reviews(&self, user_id: Uuid) -> Result<Vec<Review>, ClientError> {
        self.send(self.authed(Method::GET, &format!("/api/users/{}/reviews", user_id))?)
            .await
    }

    pub async fn search_jobs(&self, query: &SearchJobsDto) -> Result<Vec<Job>, ClientError> {
        self.send(self.request(Method::GET, "/api/jobs").query(query))
            .await
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job, ClientError> {
        self.send(self.request(Method::GET, &format!("/api/jobs/{}", job_id)))
            .await
    }

    pub async fn create_job(&self, body: &CreateJobDto) -> Result<Job, ClientError> {
        self.send(self.authed(Method::POST, "/api/jobs")?.json(body))
            .await
    }

    pub async fn my_jobs(&self) -> Result<Vec<Job>, ClientError> {
        self.send(self.authed(Method::GET, "/api/jobs/mine")?).await
    }

    pub async fn assigned_jobs(&self) -> Result<Vec<Job>, ClientError> {
        self.send(self.authed(Method::GET, "/api/jobs/assigned")?)
            .await
    }

    pub async fn update_job(&self, job_id: Uuid, body: &UpdateJobDto) -> Result<Job, ClientError> {
        self.send(
            self.authed(Method::PUT, &format!("/api/jobs/{}", job_id))?
                .json(body),
        )
        .await
    }

    pub async fn delete_job(&self, job_id: Uuid) -> Result<Job, ClientError> {
        self.send(self.authed(Method::DELETE, &format!("/api/jobs/{}", job_id))?)
            .await
    }

    pub async fn cancel_job(&self, job_id: Uuid) -> Result<Job, ClientError> {
        self.send(self.authed(Method::PUT, &format!("/api/jobs/{}/cancel", job_id))?)
            .await
    }

    pub async fn complete_job(&self, job_id: Uuid) -> Result<Job, ClientError> {
        self.send(self.authed(Method::PUT, &format!("/api/jobs/{}/complete", job_id))?)
            .await
    }

    pub async fn apply(
        &self,
        job_id: Uuid,
        message: Option<String>,
    ) -> Result<Application, ClientError> {
        let body = CreateApplicationDto { message };
        self.send(
            self.authed(Method::POST, &format!("/api/jobs/{}/applications", job_id))?
                .json(&body),
        )
        .await
    }

    pub async fn job_applications(&self, job_id: Uuid) -> Result<Vec<Application>, ClientError> {
        self.send(self.authed(Method::GET, &format!("/api/jobs/{}/applications", job_id))?)
            .await
    }

    pub async fn my_applications(&self) -> Result<Vec<Application>, ClientError> {
        self.send(self.authed(Method::GET, "/api/applications/mine")?)
            .await
    }

    pub async fn pending_applications(&self) -> Result<Vec<Application>, ClientError> {
        self.send(self.authed(Method::GET, "/api/applications/pending")?)
            .await
    }

    pub async fn accept_application(
        &self,
        application_id: Uuid,
    ) -> Result<AcceptOutcome, ClientError> {
        self.send(self.authed(
            Method::PUT,
            &format!("/api/applications/{}/accept", application_id),
        )?)
        .await
    }

    pub async fn reject_application(
        &self,
        application_id: Uuid,
    ) -> Result<Application, ClientError> {
        self.send(self.authed(
            Method::PUT,
            &format!("/api/applications/{}/reject", application_id),
        )?)
        .await
    }

    pub async fn withdraw_application(
        &self,
        application_id: Uuid,
    ) -> Result<Application, ClientError> {
        self.send(self.authed(
            Method::PUT,
            &format!("/api/applications/{}/withdraw", application_id),
        )?)
        .await
    }

    pub async fn job_reviews(&self, job_id: Uuid) -> Result<Vec<Review>, ClientError> {
        self.send(self.request(Method::GET, &format!("/api/jobs/{}/reviews", job_id)))
            .await
    }

    pub async fn create_review(
        &self,
        job_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, ClientError> {
        let body = CreateReviewDto { rating, comment };
        self.send(
            self.authed(Method::POST, &format!("/api/jobs/{}/reviews", job_id))?
                .json(&body),
        )
        .await
    }

    pub async fn notifications(
        &self,
        query: &NotificationQueryDto,
    ) -> Result<NotificationListDto, ClientError> {
        self.send(self.authed(Method::GET, "/api/notifications")?.query(query))
            .await
    }

    pub async fn unread_count(&self) -> Result<i64, ClientError> {
        let count: UnreadCountDto = self
            .send(self.authed(Method::GET, "/api/notifications/unread-count")?)
            .await?;
        Ok(count.unread_count)
    }

    pub async fn mark_notification_read(
        &self,
        notification_id: Uuid,
    ) -> Result<Notification, ClientError> {
        self.send(self.authed(
            Method::PUT,
            &format!("/api/notifications/{}/read", notification_id),
        )?)
        .await
    }

    pub async fn mark_all_notifications_read(&self) -> Result<u64, ClientError> {
        let affected: AffectedDto = self
            .send(self.authed(Method::PUT, "/api/notifications/read-all")?)
            .await?;
        Ok(affected.affected)
    }

    pub async fn clear_notifications(&self) -> Result<u64, ClientError> {
        let affected: AffectedDto = self
            .send(self.authed(Method::DELETE, "/api/notifications")?)
            .await?;
        Ok(affected.affected)
    }

    /// Refetches everything the cache holds for the signed-in user.
    pub async fn refresh(&self, cache: &mut DataCache) -> Result<(), ClientError> {
        let me = self.me().await?;

        let mut jobs = self.search_jobs(&SearchJobsDto::default()).await?;
        let applications = match me.profile.role {
            UserRole::Poster => {
                let own = self.my_jobs().await?;
                let mut applications = Vec::new();
                for job in &own {
                    applications.extend(self.job_applications(job.id).await?);
                }
                jobs.extend(own);
                applications
            }
            UserRole::Seeker => {
                jobs.extend(self.assigned_jobs().await?);
                self.my_applications().await?
            }
        };

        let notifications = self
            .notifications(&NotificationQueryDto {
                unread_only: false,
                page: Some(1),
                limit: Some(100),
            })
            .await?;

        let mut reviews = self.user_reviews(me.id).await?;
        for job in jobs
            .iter()
            .filter(|job| job.status == JobStatus::Completed && job.is_party(me.id))
        {
            reviews.extend(self.job_reviews(job.id).await?);
        }

        cache.replace_jobs(jobs);
        cache.replace_applications(applications);
        cache.replace_reviews(reviews);
        cache.replace_notifications(notifications.notifications);
        tracing::debug!("cache refreshed for {}", me.id);
        Ok(())
    }

    /// Opens the change feed. Resolves once the server has accepted the
    /// subscription, so every change committed afterwards is delivered.
    pub async fn subscribe(&self) -> Result<FeedStream, ClientError> {
        let response = self
            .authed(Method::GET, "/api/events")?
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(FeedStream {
            response,
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
    }

    fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let token = self.token.as_ref().ok_or(ClientError::NotAuthenticated)?;
        Ok(self.request(method, path).bearer_auth(token))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let envelope: ApiResponse<T> = decode(response).await?;
        Ok(envelope.data)
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn api_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
    };
    ClientError::Api { status, message }
}

/// One message from the change feed.
#[derive(Debug, Clone)]
pub enum FeedMessage {
    Change(ChangeEvent),
    /// Events were dropped; refetch with `MarketClient::refresh`.
    Resync,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental `text/event-stream` parser.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feeds raw bytes and returns every frame they completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(frame) = parse_frame(&String::from_utf8_lossy(&block)) {
                frames.push(frame);
            }
        }
        frames
    }
}

fn parse_frame(block: &str) -> Option<SseFrame> {
    let mut frame = SseFrame::default();
    let mut data_lines = Vec::new();

    for line in block.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => frame.event = Some(value.to_string()),
            "data" => data_lines.push(value),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return None;
    }
    frame.data = data_lines.join("\n");
    Some(frame)
}

impl TryFrom<SseFrame> for FeedMessage {
    type Error = serde_json::Error;

    fn try_from(frame: SseFrame) -> Result<Self, Self::Error> {
        if frame.event.as_deref() == Some(RESYNC_EVENT) {
            return Ok(FeedMessage::Resync);
        }
        Ok(FeedMessage::Change(serde_json::from_str(&frame.data)?))
    }
}

/// Live change feed returned by `MarketClient::subscribe`.
#[derive(Debug)]
pub struct FeedStream {
    response: reqwest::Response,
    decoder: SseDecoder,
    pending: VecDeque<SseFrame>,
}

impl FeedStream {
    /// Waits for the next message. `None` once the server closes the stream.
    pub async fn next(&mut self) -> Result<Option<FeedMessage>, ClientError> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(FeedMessage::try_from(frame)?));
            }
            match self.response.chunk().await? {
                Some(chunk) => self.pending.extend(self.decoder.push(&chunk)),
                None => return Ok(None),
            }
        }
    }
}
