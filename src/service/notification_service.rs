// service/notification_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::MarketStore,
    models::{
        jobmodel::{Job, Review},
        notificationmodel::{NewNotification, Notification},
        usermodel::User,
    },
    service::{
        error::ServiceError,
        realtime::{ChangeEvent, ChangeOp, EventBus},
    },
};

pub const NEW_APPLICATION: &str = "new_application";
pub const APPLICATION_ACCEPTED: &str = "application_accepted";
pub const APPLICATION_REJECTED: &str = "application_rejected";
pub const APPLICATION_WITHDRAWN: &str = "application_withdrawn";
pub const JOB_COMPLETED: &str = "job_completed";
pub const REVIEW_RECEIVED: &str = "review_received";

#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Arc<dyn MarketStore>,
    events: EventBus,
}

impl NotificationService {
    pub fn new(store: Arc<dyn MarketStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    pub async fn notify_new_application(
        &self,
        job: &Job,
        applicant: &User,
    ) -> Result<Notification, ServiceError> {
        self.store_notification(
            job.poster_id,
            NEW_APPLICATION,
            "New Application",
            format!("{} applied for \"{}\"", applicant.username, job.title),
            job,
        )
        .await
    }

    pub async fn notify_application_accepted(
        &self,
        seeker_id: Uuid,
        job: &Job,
    ) -> Result<Notification, ServiceError> {
        self.store_notification(
            seeker_id,
            APPLICATION_ACCEPTED,
            "Application Accepted!",
            format!("Congratulations! You've been hired for \"{}\"", job.title),
            job,
        )
        .await
    }

    /// `filled` is true when the job went to another applicant.
    pub async fn notify_application_rejected(
        &self,
        seeker_id: Uuid,
        job: &Job,
        filled: bool,
    ) -> Result<Notification, ServiceError> {
        let message = if filled {
            format!(
                "Your application for \"{}\" was not selected. Keep applying!",
                job.title
            )
        } else {
            format!("Your application for \"{}\" was not selected.", job.title)
        };

        self.store_notification(
            seeker_id,
            APPLICATION_REJECTED,
            "Application Update",
            message,
            job,
        )
        .await
    }

    pub async fn notify_application_withdrawn(
        &self,
        job: &Job,
        applicant: &User,
    ) -> Result<Notification, ServiceError> {
        self.store_notification(
            job.poster_id,
            APPLICATION_WITHDRAWN,
            "Application Withdrawn",
            format!(
                "{} withdrew their application for \"{}\"",
                applicant.username, job.title
            ),
            job,
        )
        .await
    }

    /// Tells the other party that `completed_by` closed the job and invites a review.
    pub async fn notify_job_completed(
        &self,
        job: &Job,
        completed_by: &User,
    ) -> Result<Option<Notification>, ServiceError> {
        let Some(recipient) = job.counterparty_of(completed_by.id) else {
            return Ok(None);
        };

        let (title, message) = if completed_by.id == job.poster_id {
            (
                "Job Marked Complete",
                format!(
                    "The client has marked \"{}\" as completed. You can now leave a review.",
                    job.title
                ),
            )
        } else {
            (
                "Job Completed",
                format!(
                    "{} has marked \"{}\" as completed. You can now leave a review.",
                    completed_by.username, job.title
                ),
            )
        };

        self.store_notification(recipient, JOB_COMPLETED, title, message, job)
            .await
            .map(Some)
    }

    pub async fn notify_review_received(
        &self,
        review: &Review,
        job: &Job,
    ) -> Result<Notification, ServiceError> {
        self.store_notification(
            review.reviewee_id,
            REVIEW_RECEIVED,
            "New Review Received",
            format!(
                "You received a {}-star review for \"{}\"",
                review.rating, job.title
            ),
            job,
        )
        .await
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, ServiceError> {
        Ok(self
            .store
            .get_notifications(user_id, unread_only, limit, offset)
            .await?)
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, ServiceError> {
        Ok(self.store.count_unread_notifications(user_id).await?)
    }

    pub async fn mark_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<Notification, ServiceError> {
        let notification = self
            .store
            .mark_notification_read(notification_id, user_id)
            .await?
            .ok_or(ServiceError::NotificationNotFound(notification_id))?;

        self.events.publish(ChangeEvent::Notification {
            op: ChangeOp::Updated,
            notification: notification.clone(),
        });
        Ok(notification)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let updated = self.store.mark_all_notifications_read(user_id).await?;
        self.events
            .publish(ChangeEvent::NotificationsRead { user_id });
        Ok(updated)
    }

    pub async fn clear_all(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        let removed = self.store.clear_notifications(user_id).await?;
        self.events
            .publish(ChangeEvent::NotificationsCleared { user_id });
        Ok(removed)
    }

    async fn store_notification(
        &self,
        user_id: Uuid,
        notification_type: &str,
        title: &str,
        message: String,
        job: &Job,
    ) -> Result<Notification, ServiceError> {
        tracing::info!(
            "{} notification for user {} on job {}",
            notification_type,
            user_id,
            job.id
        );

        let notification = self
            .store
            .create_notification(NewNotification {
                user_id,
                notification_type: notification_type.to_string(),
                title: title.to_string(),
                message,
                data: Some(serde_json::json!({ "job_id": job.id })),
            })
            .await?;

        self.events.publish(ChangeEvent::Notification {
            op: ChangeOp::Created,
            notification: notification.clone(),
        });
        Ok(notification)
    }
}

/// Logs a failed side-effect notification without failing the caller.
pub fn log_failure<T>(result: Result<T, ServiceError>, what: &str) {
    if let Err(e) = result {
        tracing::warn!("failed to send {} notification: {}", what, e);
    }
}
