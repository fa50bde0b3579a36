// service/review_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{MarketStore, StoreError},
    dtos::userdtos::PublicProfile,
    models::{
        jobmodel::{JobStatus, NewReview, Review},
        usermodel::User,
    },
    service::{
        error::ServiceError,
        notification_service::{log_failure, NotificationService},
        realtime::{ChangeEvent, EventBus},
    },
};

#[derive(Debug, Clone)]
pub struct ReviewService {
    store: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
    events: EventBus,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn MarketStore>,
        notification_service: Arc<NotificationService>,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            notification_service,
            events,
        }
    }

    /// Leaves a review for the other party of a completed job and refreshes
    /// the reviewee's rating.
    pub async fn create_review(
        &self,
        reviewer: &User,
        job_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, ServiceError> {
        if !(1..=5).contains(&rating) {
            return Err(ServiceError::Validation(
                "Rating must be between 1 and 5".to_string(),
            ));
        }

        let job = self
            .store
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))?;
        if job.status != JobStatus::Completed {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let reviewee_id = job.counterparty_of(reviewer.id).ok_or_else(|| {
            ServiceError::Forbidden("Only the parties of this job can review it".to_string())
        })?;

        if self.has_reviewed(reviewer.id, job_id).await? {
            return Err(ServiceError::Conflict(
                "You have already reviewed this job".to_string(),
            ));
        }

        let review = self
            .store
            .create_review(NewReview {
                job_id,
                reviewer_id: reviewer.id,
                reviewee_id,
                rating,
                comment,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    ServiceError::Conflict("You have already reviewed this job".to_string())
                }
                other => other.into(),
            })?;

        tracing::info!(
            "review {} left by {} for {} on job {}",
            review.id,
            reviewer.id,
            reviewee_id,
            job_id
        );
        self.events.publish(ChangeEvent::Review {
            review: review.clone(),
        });

        let reviewee = self.store.refresh_user_rating(reviewee_id).await?;
        self.events.publish(ChangeEvent::Profile {
            user: PublicProfile::from_user(&reviewee),
        });

        log_failure(
            self.notification_service
                .notify_review_received(&review, &job)
                .await,
            "review_received",
        );

        Ok(review)
    }

    pub async fn reviews_for_job(&self, job_id: Uuid) -> Result<Vec<Review>, ServiceError> {
        Ok(self.store.get_reviews_by_job(job_id).await?)
    }

    pub async fn reviews_about(&self, user_id: Uuid) -> Result<Vec<Review>, ServiceError> {
        Ok(self.store.get_reviews_by_reviewee(user_id).await?)
    }

    async fn has_reviewed(&self, reviewer_id: Uuid, job_id: Uuid) -> Result<bool, ServiceError> {
        let reviews = self.store.get_reviews_by_job(job_id).await?;
        Ok(reviews.iter().any(|r| r.reviewer_id == reviewer_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db::UserExt, service::fixtures::market};

    #[tokio::test]
    async fn rating_is_the_rounded_mean_of_received_reviews() {
        let m = market().await;
        let service = &m.services.review_service;

        for (title, rating) in [("One", 5), ("Two", 4), ("Three", 4)] {
            let job = m.completed_job(title).await;
            service
                .create_review(&m.poster, job.id, rating, None)
                .await
                .unwrap();
        }

        let seeker = m.store.get_user(Some(m.seeker.id), None).await.unwrap().unwrap();
        assert_eq!(seeker.rating, Some(4.3));
        assert_eq!(service.reviews_about(m.seeker.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn each_party_reviews_the_other_once() {
        let m = market().await;
        let service = &m.services.review_service;
        let job = m.completed_job("Clean windows").await;

        let by_seeker = service
            .create_review(&m.seeker, job.id, 5, Some("Prompt payment".to_string()))
            .await
            .unwrap();
        assert_eq!(by_seeker.reviewee_id, m.poster.id);

        let err = service
            .create_review(&m.seeker, job.id, 4, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let err = service
            .create_review(&m.rival, job.id, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unfinished_jobs_cannot_be_reviewed() {
        let m = market().await;
        let job = m.open_job("Paint shed").await;

        let err = m
            .services
            .review_service
            .create_review(&m.poster, job.id, 5, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidJobStatus(_, JobStatus::Open)));
    }
}
