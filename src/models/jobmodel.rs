use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use sqlx::types::BigDecimal;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "job_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    Repairs,
    Gardening,
    Tutoring,
    Delivery,
    Errands,
    Cleaning,
    Moving,
    Other,
}

impl JobCategory {
    pub fn to_str(&self) -> &str {
        match self {
            JobCategory::Repairs => "repairs",
            JobCategory::Gardening => "gardening",
            JobCategory::Tutoring => "tutoring",
            JobCategory::Delivery => "delivery",
            JobCategory::Errands => "errands",
            JobCategory::Cleaning => "cleaning",
            JobCategory::Moving => "moving",
            JobCategory::Other => "other",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Open => "open",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// `open -> in_progress -> completed`, or `open -> cancelled`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Open, JobStatus::InProgress)
                | (JobStatus::Open, JobStatus::Cancelled)
                | (JobStatus::InProgress, JobStatus::Completed)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn is_terminal(self) -> bool {
        self != ApplicationStatus::Pending
    }

    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        self == ApplicationStatus::Pending && next.is_terminal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Job {
    pub id: Uuid,
    pub poster_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: JobCategory,
    pub location: String,
    pub rate: BigDecimal,
    pub duration: Option<String>,
    pub is_urgent: bool,
    pub status: JobStatus,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.poster_id == user_id || self.assigned_to == Some(user_id)
    }

    /// The other side of the job for `user_id`, if there is one yet.
    pub fn counterparty_of(&self, user_id: Uuid) -> Option<Uuid> {
        if user_id == self.poster_id {
            self.assigned_to
        } else if self.assigned_to == Some(user_id) {
            Some(self.poster_id)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub seeker_id: Uuid,
    pub message: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub job_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Arithmetic mean rounded to one decimal, half away from zero.
pub fn mean_rating<I>(ratings: I) -> Option<f64>
where
    I: IntoIterator<Item = i32>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0i64, 0i64), |(sum, count), r| (sum + r as i64, count + 1));
    if count == 0 {
        return None;
    }
    let mean = sum as f64 / count as f64;
    Some((mean * 10.0).round() / 10.0)
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub category: JobCategory,
    pub location: String,
    pub rate: BigDecimal,
    pub duration: Option<String>,
    pub is_urgent: bool,
}

#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<JobCategory>,
    pub location: Option<String>,
    pub rate: Option<BigDecimal>,
    pub duration: Option<String>,
    pub is_urgent: Option<bool>,
}

impl JobUpdate {
    pub fn apply_to(&self, job: &mut Job) {
        if let Some(title) = &self.title {
            job.title = title.clone();
        }
        if let Some(description) = &self.description {
            job.description = description.clone();
        }
        if let Some(category) = self.category {
            job.category = category;
        }
        if let Some(location) = &self.location {
            job.location = location.clone();
        }
        if let Some(rate) = &self.rate {
            job.rate = rate.clone();
        }
        if let Some(duration) = &self.duration {
            job.duration = Some(duration.clone());
        }
        if let Some(is_urgent) = self.is_urgent {
            job.is_urgent = is_urgent;
        }
    }
}

/// Query over the job board. Every field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub category: Option<JobCategory>,
    /// Case-insensitive substring of `location`.
    pub location: Option<String>,
    /// Case-insensitive substring of title or description.
    pub text: Option<String>,
    pub status: Option<JobStatus>,
    pub poster_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub limit: Option<i64>,
}

impl JobFilter {
    pub fn matches(&self, job: &Job) -> bool {
        if self.category.is_some_and(|c| c != job.category) {
            return false;
        }
        if self.status.is_some_and(|s| s != job.status) {
            return false;
        }
        if self.poster_id.is_some_and(|p| p != job.poster_id) {
            return false;
        }
        if self.assigned_to.is_some() && self.assigned_to != job.assigned_to {
            return false;
        }
        if let Some(location) = &self.location {
            if !job.location.to_lowercase().contains(&location.to_lowercase()) {
                return false;
            }
        }
        if let Some(text) = &self.text {
            let needle = text.to_lowercase();
            if !job.title.to_lowercase().contains(&needle)
                && !job.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub job_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewee_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

/// Result of accepting an application: the hired applicant, the job now in
/// progress, and every rival that was turned down in the same step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptOutcome {
    pub job: Job,
    pub accepted: Application,
    pub rejected: Vec<Application>,
}
