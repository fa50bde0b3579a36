// service/application_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        jobmodel::{AcceptOutcome, Application, ApplicationStatus, Job, JobStatus},
        usermodel::{User, UserRole},
    },
    service::{
        error::ServiceError,
        notification_service::{log_failure, NotificationService},
        realtime::{ChangeEvent, ChangeOp, EventBus},
    },
};

#[derive(Debug, Clone)]
pub struct ApplicationService {
    store: Arc<dyn MarketStore>,
    notification_service: Arc<NotificationService>,
    events: EventBus,
}

impl ApplicationService {
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

    pub async fn apply(
        &self,
        seeker: &User,
        job_id: Uuid,
        message: Option<String>,
    ) -> Result<Application, ServiceError> {
        if seeker.role != UserRole::Seeker {
            return Err(ServiceError::Forbidden(
                "Only job seekers can apply for jobs".to_string(),
            ));
        }

        let job = self.job(job_id).await?;
        if job.poster_id == seeker.id {
            return Err(ServiceError::Forbidden(
                "You cannot apply to your own job".to_string(),
            ));
        }
        if job.status != JobStatus::Open {
            return Err(ServiceError::InvalidJobStatus(job_id, job.status));
        }

        let existing = self.store.get_applications_by_seeker(seeker.id).await?;
        let duplicate = existing.iter().any(|a| {
            a.job_id == job_id
                && matches!(
                    a.status,
                    ApplicationStatus::Pending | ApplicationStatus::Accepted
                )
        });
        if duplicate {
            return Err(ServiceError::Conflict(
                "You have already applied for this job".to_string(),
            ));
        }

        let application = self
            .store
            .create_application(job_id, seeker.id, message)
            .await?;
        tracing::info!(
            "seeker {} applied to job {} ({})",
            seeker.id,
            job_id,
            application.id
        );

        self.publish(ChangeOp::Created, &application, &job);
        log_failure(
            self.notification_service
                .notify_new_application(&job, seeker)
                .await,
            "new_application",
        );

        Ok(application)
    }

    /// Applications for a job the caller posted.
    pub async fn applications_for_job(
        &self,
        poster: &User,
        job_id: Uuid,
    ) -> Result<Vec<Application>, ServiceError> {
        let job = self.job(job_id).await?;
        if job.poster_id != poster.id {
            return Err(ServiceError::Forbidden(
                "Only the poster of this job can view its applications".to_string(),
            ));
        }
        Ok(self.store.get_applications_by_job(job_id).await?)
    }

    pub async fn applications_by_seeker(
        &self,
        seeker_id: Uuid,
    ) -> Result<Vec<Application>, ServiceError> {
        Ok(self.store.get_applications_by_seeker(seeker_id).await?)
    }

    pub async fn pending_for_poster(
        &self,
        poster_id: Uuid,
    ) -> Result<Vec<Application>, ServiceError> {
        Ok(self
            .store
            .get_pending_applications_for_poster(poster_id)
            .await?)
    }

    /// Hires the applicant. The job moves to in progress and every rival pending
    /// application is rejected in the same store operation.
    pub async fn accept(
        &self,
        poster: &User,
        application_id: Uuid,
    ) -> Result<AcceptOutcome, ServiceError> {
        let (application, job) = self.owned_application(poster, application_id).await?;
        if !application
            .status
            .can_transition_to(ApplicationStatus::Accepted)
        {
            return Err(ServiceError::InvalidApplicationStatus(
                application_id,
                application.status,
            ));
        }
        if job.status != JobStatus::Open {
            return Err(ServiceError::InvalidJobStatus(job.id, job.status));
        }

        let outcome = self.store.accept_application(application_id).await?;
        tracing::info!(
            "application {} accepted for job {}, {} rivals rejected",
            application_id,
            outcome.job.id,
            outcome.rejected.len()
        );

        self.events.publish(ChangeEvent::Job {
            op: ChangeOp::Updated,
            job: outcome.job.clone(),
        });
        self.publish(ChangeOp::Updated, &outcome.accepted, &outcome.job);
        for rival in &outcome.rejected {
            self.publish(ChangeOp::Updated, rival, &outcome.job);
        }

        log_failure(
            self.notification_service
                .notify_application_accepted(outcome.accepted.seeker_id, &outcome.job)
                .await,
            "application_accepted",
        );
        for rival in &outcome.rejected {
            log_failure(
                self.notification_service
                    .notify_application_rejected(rival.seeker_id, &outcome.job, true)
                    .await,
                "application_rejected",
            );
        }

        Ok(outcome)
    }

    pub async fn reject(
        &self,
        poster: &User,
        application_id: Uuid,
    ) -> Result<Application, ServiceError> {
        let (application, job) = self.owned_application(poster, application_id).await?;
        let application = self
            .transition(application, ApplicationStatus::Rejected)
            .await?;

        self.publish(ChangeOp::Updated, &application, &job);
        log_failure(
            self.notification_service
                .notify_application_rejected(application.seeker_id, &job, false)
                .await,
            "application_rejected",
        );
        Ok(application)
    }

    pub async fn withdraw(
        &self,
        seeker: &User,
        application_id: Uuid,
    ) -> Result<Application, ServiceError> {
        let application = self.application(application_id).await?;
        if application.seeker_id != seeker.id {
            return Err(ServiceError::Forbidden(
                "Only the applicant can withdraw this application".to_string(),
            ));
        }
        let job = self.job(application.job_id).await?;

        let application = self
            .transition(application, ApplicationStatus::Withdrawn)
            .await?;

        self.publish(ChangeOp::Updated, &application, &job);
        log_failure(
            self.notification_service
                .notify_application_withdrawn(&job, seeker)
                .await,
            "application_withdrawn",
        );
        Ok(application)
    }

    async fn transition(
        &self,
        application: Application,
        to: ApplicationStatus,
    ) -> Result<Application, ServiceError> {
        if !application.status.can_transition_to(to) {
            return Err(ServiceError::InvalidApplicationStatus(
                application.id,
                application.status,
            ));
        }

        self.store
            .transition_application(application.id, application.status, to)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict("Application was updated by someone else".to_string())
            })
    }

    async fn owned_application(
        &self,
        poster: &User,
        application_id: Uuid,
    ) -> Result<(Application, Job), ServiceError> {
        let application = self.application(application_id).await?;
        let job = self.job(application.job_id).await?;
        if job.poster_id != poster.id {
            return Err(ServiceError::Forbidden(
                "Only the poster of this job can respond to applications".to_string(),
            ));
        }
        Ok((application, job))
    }

    async fn application(&self, application_id: Uuid) -> Result<Application, ServiceError> {
        self.store
            .get_application_by_id(application_id)
            .await?
            .ok_or(ServiceError::ApplicationNotFound(application_id))
    }

    async fn job(&self, job_id: Uuid) -> Result<Job, ServiceError> {
        self.store
            .get_job_by_id(job_id)
            .await?
            .ok_or(ServiceError::JobNotFound(job_id))
    }

    fn publish(&self, op: ChangeOp, application: &Application, job: &Job) {
        self.events.publish(ChangeEvent::Application {
            op,
            application: application.clone(),
            poster_id: job.poster_id,
        });
    }
}
