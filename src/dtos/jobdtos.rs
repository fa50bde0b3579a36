use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    models::jobmodel::{JobCategory, JobFilter, JobStatus, JobUpdate, NewJob},
    utils::{
        decimal::money_from_f64,
        sanitize::{clean_optional, clean_text},
    },
};

pub const MAX_SEARCH_RESULTS: i64 = 50;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobDto {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,

    pub category: Option<JobCategory>,

    #[validate(length(min = 1, max = 255, message = "Location is required"))]
    pub location: String,

    #[validate(range(
        min = 0.01,
        max = 9999999999.99,
        message = "Rate must be between 0.01 and 9999999999.99"
    ))]
    pub rate: f64,

    #[validate(length(max = 100, message = "Duration must not exceed 100 characters"))]
    pub duration: Option<String>,

    #[serde(default)]
    pub is_urgent: bool,
}

impl CreateJobDto {
    /// `None` when the sanitised title or description ends up empty.
    pub fn into_new_job(self) -> Option<NewJob> {
        let title = clean_text(&self.title);
        let description = clean_text(&self.description);
        if title.is_empty() || description.is_empty() {
            return None;
        }

        Some(NewJob {
            title,
            description,
            category: self.category.unwrap_or(JobCategory::Other),
            location: clean_text(&self.location),
            rate: money_from_f64(self.rate)?,
            duration: clean_optional(self.duration),
            is_urgent: self.is_urgent,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateJobDto {
    #[validate(length(min = 1, max = 100, message = "Title must be 1-100 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Description cannot be empty"))]
    pub description: Option<String>,

    pub category: Option<JobCategory>,

    #[validate(length(min = 1, max = 255, message = "Location cannot be empty"))]
    pub location: Option<String>,

    #[validate(range(
        min = 0.01,
        max = 9999999999.99,
        message = "Rate must be between 0.01 and 9999999999.99"
    ))]
    pub rate: Option<f64>,

    #[validate(length(max = 100, message = "Duration must not exceed 100 characters"))]
    pub duration: Option<String>,

    pub is_urgent: Option<bool>,
}

impl UpdateJobDto {
    pub fn into_update(self) -> JobUpdate {
        JobUpdate {
            title: clean_optional(self.title),
            description: clean_optional(self.description),
            category: self.category,
            location: clean_optional(self.location),
            rate: self.rate.and_then(money_from_f64),
            duration: clean_optional(self.duration),
            is_urgent: self.is_urgent,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SearchJobsDto {
    pub category: Option<JobCategory>,
    pub location: Option<String>,
    pub q: Option<String>,
    /// Defaults to `open`.
    pub status: Option<JobStatus>,
    #[validate(range(min = 1, max = 50, message = "Limit must be between 1 and 50"))]
    pub limit: Option<i64>,
}

impl SearchJobsDto {
    pub fn into_filter(self) -> JobFilter {
        let non_blank = |s: Option<String>| {
            s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };

        JobFilter {
            category: self.category,
            location: non_blank(self.location),
            text: non_blank(self.q),
            status: Some(self.status.unwrap_or(JobStatus::Open)),
            poster_id: None,
            assigned_to: None,
            limit: Some(self.limit.unwrap_or(MAX_SEARCH_RESULTS).min(MAX_SEARCH_RESULTS)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateApplicationDto {
    #[validate(length(max = 2000, message = "Message must not exceed 2000 characters"))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReviewDto {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,

    #[validate(length(max = 2000, message = "Comment must not exceed 2000 characters"))]
    pub comment: Option<String>,
}
