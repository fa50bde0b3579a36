// service/job_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    dtos::userdtos::PublicProfile,
    models::{
        jobmodel::{Job, JobFilter, JobStatus, JobUpdate, NewJob},
        usermodel::{User, UserRole},
    },
    service::{
        error::ServiceError,
        notification_service::{log_failure, NotificationService},
        realtime::{ChangeEvent, ChangeOp, EventBus},
    },
};

#[derive(Debug, Clone)]
pub struct JobService {
    store: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
    events: EventBus,
}

impl JobService {
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

    pub async fn create_job(&self, poster: &User, job: NewJob) -> Result<Job, ServiceError> {
        if poster.role != UserRole::Poster {
            return Err(ServiceError::Forbidden(
                "Only job posters can create jobs".to_string(),
            ));
        }

        let job = self.store.create_job(poster.id, job).await?;
        tracing::info!("job {} created by {}", job.id, poster.id);

        self.publish(ChangeOp::Created, &job);
        Ok(job)
    }

    pub async fn get_job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.store
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    pub async fn search_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, ServiceError> {
        Ok(self.store.search_jobs(filter).await?)
    }

    /// Every listing owned by the poster, whatever its status.
    pub async fn jobs_posted_by(&self, poster_id: Uuid) -> Result<Vec<Job>, ServiceError> {
        let filter = JobFilter {
            poster_id: Some(poster_id),
            ..Default::default()
        };
        Ok(self.store.search_jobs(&filter).await?)
    }

    pub async fn jobs_assigned_to(&self, seeker_id: Uuid) -> Result<Vec<Job>, ServiceError> {
        let filter = JobFilter {
            assigned_to: Some(seeker_id),
            ..Default::default()
        };
        Ok(self.store.search_jobs(&filter).await?)
    }

    pub async fn update_job(
        &self,
        user: &User,
        job_id: Uuid,
        update: JobUpdate,
    ) -> Result<Job, ServiceError> {
        let job = self.owned_job(user, job_id).await?;
        if job.status != JobStatus::Open {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let job = self
            .store
            .update_job_details(job_id, update)
            .await?
            .ok_or_else(|| ServiceError::Conflict("Job is no longer open".to_string()))?;

        self.publish(ChangeOp::Updated, &job);
        Ok(job)
    }

    pub async fn cancel_job(&self, user: &User, job_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.owned_job(user, job_id).await?;
        if !job.status.can_transition_to(JobStatus::Cancelled) {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let job = self
            .store
            .transition_job(job_id, JobStatus::Open, JobStatus::Cancelled)
            .await?
            .ok_or_else(|| ServiceError::Conflict("Job is no longer open".to_string()))?;

        tracing::info!("job {} cancelled", job_id);
        self.publish(ChangeOp::Updated, &job);
        Ok(job)
    }

    pub async fn delete_job(&self, user: &User, job_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.owned_job(user, job_id).await?;
        if job.status != JobStatus::Open {
            return Err(ServiceError::Conflict(format!(
                "Only open jobs can be deleted; this job is {}",
                job.status.to_str()
            )));
        }

        let job = self
            .store
            .delete_open_job(job_id)
            .await?
            .ok_or_else(|| ServiceError::Conflict("Job is no longer open".to_string()))?;

        tracing::info!("job {} deleted", job_id);
        self.publish(ChangeOp::Deleted, &job);
        Ok(job)
    }

    /// Poster or assignee closes an in-progress job. The assignee's completed
    /// count goes up and the other party is invited to review.
    pub async fn complete_job(&self, user: &User, job_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.get_job(job_id).await?;
        if !job.is_party(user.id) {
            return Err(ServiceError::Forbidden(
                "Only the poster or the assigned seeker can complete this job".to_string(),
            ));
        }
        if !job.status.can_transition_to(JobStatus::Completed) {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let job = self
            .store
            .transition_job(job_id, JobStatus::InProgress, JobStatus::Completed)
            .await?
            .ok_or_else(|| ServiceError::Conflict("Job is no longer in progress".to_string()))?;

        tracing::info!("job {} completed by {}", job_id, user.id);
        self.publish(ChangeOp::Updated, &job);

        if let Some(seeker_id) = job.assigned_to {
            match self.store.increment_completed_jobs(seeker_id).await {
                Ok(seeker) => self.events.publish(ChangeEvent::Profile {
                    user: PublicProfile::from_user(&seeker),
                }),
                Err(e) => tracing::warn!(
                    "failed to count completed job {} for {}: {}",
                    job_id,
                    seeker_id,
                    e
                ),
            }
        }

        log_failure(
            self.notification_service.notify_job_completed(&job, user).await,
            "job_completed",
        );

        Ok(job)
    }

    async fn owned_job(&self, user: &User, job_id: Uuid) -> Result<Job, ServiceError> {
        let job = self.get_job(job_id).await?;
        if job.poster_id != user.id {
            return Err(ServiceError::Forbidden(
                "Only the poster of this job can do that".to_string(),
            ));
        }
        Ok(job)
    }

    fn publish(&self, op: ChangeOp, job: &Job) {
        self.events.publish(ChangeEvent::Job {
            op,
            job: job.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::BigDecimal;

    use crate::{
        db::UserExt,
        service::fixtures::{market, new_job},
    };

    #[tokio::test]
    async fn seekers_cannot_post_jobs() {
        let m = market().await;
        let err = m
            .services
            .job_service
            .create_job(&m.seeker, new_job("Walk the dog"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn completing_an_open_job_is_rejected() {
        let m = market().await;
        let job = m.open_job("Collect parcel").await;

        let err = m
            .services
            .job_service
            .complete_job(&m.poster, job.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidJobStatus(_, JobStatus::Open)));
    }

    #[tokio::test]
    async fn completion_counts_for_the_assignee() {
        let m = market().await;
        let job = m.completed_job("Deliver sofa").await;

        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.completed_at.is_some());

        let seeker = m.store.get_user(Some(m.seeker.id), None).await.unwrap().unwrap();
        assert_eq!(seeker.completed_jobs, 1);
    }

    #[tokio::test]
    async fn only_open_jobs_can_be_deleted_or_edited() {
        let m = market().await;
        let job = m.completed_job("Hang shelves").await;

        let err = m
            .services
            .job_service
            .delete_job(&m.poster, job.id)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::CONFLICT);

        let err = m
            .services
            .job_service
            .update_job(&m.poster, job.id, JobUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidJobStatus(_, _)));
    }

    #[tokio::test]
    async fn posters_edit_their_open_jobs() {
        let m = market().await;
        let job = m.open_job("Old title").await;
        let mut feed = m.services.job_service.events.subscribe();

        let edited = m
            .services
            .job_service
            .update_job(
                &m.poster,
                job.id,
                JobUpdate {
                    title: Some("New title".to_string()),
                    rate: Some(BigDecimal::from(35)),
                    is_urgent: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(edited.title, "New title");
        assert_eq!(edited.rate, BigDecimal::from(35));
        assert!(edited.is_urgent);
        assert_eq!(edited.description, job.description);
        assert_eq!(edited.location, job.location);
        assert_eq!(edited.status, JobStatus::Open);

        let stored = m.services.job_service.get_job(job.id).await.unwrap();
        assert_eq!(stored.title, "New title");
        assert!(matches!(
            feed.try_recv().unwrap(),
            ChangeEvent::Job { op: ChangeOp::Updated, .. }
        ));

        let err = m
            .services
            .job_service
            .update_job(&m.seeker, job.id, JobUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn strangers_cannot_cancel() {
        let m = market().await;
        let job = m.open_job("Sort garage").await;

        let err = m
            .services
            .job_service
            .cancel_job(&m.seeker, job.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let cancelled = m
            .services
            .job_service
            .cancel_job(&m.poster, job.id)
            .await
            .unwrap();
        assert_eq!(cancelled.status, JobStatus::Cancelled);
    }
}
