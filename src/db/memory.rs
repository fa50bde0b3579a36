// db/memory.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    applicationdb::ApplicationExt, error::StoreError, jobdb::JobExt,
    notificationdb::NotificationExt, reviewdb::ReviewExt, userdb::UserExt,
};
use crate::models::{
    jobmodel::{
        mean_rating, AcceptOutcome, Application, ApplicationStatus, Job, JobFilter, JobStatus,
        JobUpdate, NewJob, NewReview, Review,
    },
    notificationmodel::{NewNotification, Notification},
    usermodel::{NewUser, ProfileUpdate, User},
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    jobs: HashMap<Uuid, Job>,
    applications: HashMap<Uuid, Application>,
    reviews: HashMap<Uuid, Review>,
    notifications: HashMap<Uuid, Notification>,
}

/// Process-local store used when no `DATABASE_URL` is configured and by tests.
/// Every operation takes the single table lock, so multi-row updates are atomic.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<Utc>,
{
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    rows
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;

        if let Some(user_id) = user_id {
            return Ok(tables.users.get(&user_id).cloned());
        }
        if let Some(email) = email {
            return Ok(tables.users.values().find(|u| u.email == email).cloned());
        }
        Ok(None)
    }

    async fn save_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {}", user.email)));
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password: user.password_hash,
            role: user.role,
            bio: None,
            skills: Vec::new(),
            hourly_rate: None,
            location: None,
            phone: user.phone,
            photo: None,
            rating: None,
            completed_jobs: 0,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;

        update.apply_to(user);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn increment_completed_jobs(&self, user_id: Uuid) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;

        user.completed_jobs += 1;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl JobExt for MemoryStore {
    async fn create_job(&self, poster_id: Uuid, job: NewJob) -> Result<Job, StoreError> {
        let mut tables = self.tables.write().await;

        let now = Utc::now();
        let record = Job {
            id: Uuid::new_v4(),
            poster_id,
            title: job.title,
            description: job.description,
            category: job.category,
            location: job.location,
            rate: job.rate,
            duration: job.duration,
            is_urgent: job.is_urgent,
            status: JobStatus::Open,
            assigned_to: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        tables.jobs.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_job_by_id(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        Ok(self.tables.read().await.jobs.get(&job_id).cloned())
    }

    async fn search_jobs(&self, filter: &JobFilter) -> Result<Vec<Job>, StoreError> {
        let tables = self.tables.read().await;

        let matching: Vec<Job> = tables
            .jobs
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();

        let mut jobs = newest_first(matching, |job| job.created_at);
        if let Some(limit) = filter.limit {
            jobs.truncate(limit.max(0) as usize);
        }
        Ok(jobs)
    }

    async fn update_job_details(
        &self,
        job_id: Uuid,
        update: JobUpdate,
    ) -> Result<Option<Job>, StoreError> {
        let mut tables = self.tables.write().await;

        match tables.jobs.get_mut(&job_id) {
            Some(job) if job.status == JobStatus::Open => {
                update.apply_to(job);
                job.updated_at = Utc::now();
                Ok(Some(job.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn transition_job(
        &self,
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    ) -> Result<Option<Job>, StoreError> {
        let mut tables = self.tables.write().await;

        match tables.jobs.get_mut(&job_id) {
            Some(job) if job.status == from => {
                let now = Utc::now();
                job.status = to;
                job.updated_at = now;
                if to == JobStatus::Completed {
                    job.completed_at = Some(now);
                }
                Ok(Some(job.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_open_job(&self, job_id: Uuid) -> Result<Option<Job>, StoreError> {
        let mut tables = self.tables.write().await;

        let is_open = tables
            .jobs
            .get(&job_id)
            .is_some_and(|job| job.status == JobStatus::Open);
        if !is_open {
            return Ok(None);
        }

        let removed = tables.jobs.remove(&job_id);
        tables.applications.retain(|_, a| a.job_id != job_id);
        Ok(removed)
    }
}

#[async_trait]
impl ApplicationExt for MemoryStore {
    async fn create_application(
        &self,
        job_id: Uuid,
        seeker_id: Uuid,
        message: Option<String>,
    ) -> Result<Application, StoreError> {
        let mut tables = self.tables.write().await;

        if !tables.jobs.contains_key(&job_id) {
            return Err(StoreError::NotFound);
        }

        let record = Application {
            id: Uuid::new_v4(),
            job_id,
            seeker_id,
            message,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        };
        tables.applications.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_application_by_id(
        &self,
        application_id: Uuid,
    ) -> Result<Option<Application>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .applications
            .get(&application_id)
            .cloned())
    }

    async fn get_applications_by_job(&self, job_id: Uuid) -> Result<Vec<Application>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .applications
            .values()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |a| a.created_at))
    }

    async fn get_applications_by_seeker(
        &self,
        seeker_id: Uuid,
    ) -> Result<Vec<Application>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .applications
            .values()
            .filter(|a| a.seeker_id == seeker_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |a| a.created_at))
    }

    async fn get_pending_applications_for_poster(
        &self,
        poster_id: Uuid,
    ) -> Result<Vec<Application>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .applications
            .values()
            .filter(|a| a.status == ApplicationStatus::Pending)
            .filter(|a| {
                tables
                    .jobs
                    .get(&a.job_id)
                    .is_some_and(|job| job.poster_id == poster_id)
            })
            .cloned()
            .collect();
        Ok(newest_first(rows, |a| a.created_at))
    }

    async fn transition_application(
        &self,
        application_id: Uuid,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> Result<Option<Application>, StoreError> {
        let mut tables = self.tables.write().await;

        match tables.applications.get_mut(&application_id) {
            Some(application) if application.status == from => {
                application.status = to;
                application.responded_at = Some(Utc::now());
                Ok(Some(application.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn accept_application(&self, application_id: Uuid) -> Result<AcceptOutcome, StoreError> {
        let mut tables = self.tables.write().await;

        let application = tables
            .applications
            .get(&application_id)
            .cloned()
            .ok_or(StoreError::NotFound)?;
        if application.status != ApplicationStatus::Pending {
            return Err(StoreError::Conflict(
                "application is no longer pending".to_string(),
            ));
        }

        let now = Utc::now();
        let job = {
            let job = tables
                .jobs
                .get_mut(&application.job_id)
                .ok_or(StoreError::NotFound)?;
            if job.status != JobStatus::Open {
                return Err(StoreError::Conflict("job is no longer open".to_string()));
            }
            job.status = JobStatus::InProgress;
            job.assigned_to = Some(application.seeker_id);
            job.updated_at = now;
            job.clone()
        };

        let mut accepted = application;
        let mut rejected = Vec::new();
        for row in tables.applications.values_mut() {
            if row.job_id != job.id || row.status != ApplicationStatus::Pending {
                continue;
            }
            row.responded_at = Some(now);
            if row.id == accepted.id {
                row.status = ApplicationStatus::Accepted;
                accepted = row.clone();
            } else {
                row.status = ApplicationStatus::Rejected;
                rejected.push(row.clone());
            }
        }

        Ok(AcceptOutcome {
            job,
            accepted,
            rejected,
        })
    }
}

#[async_trait]
impl ReviewExt for MemoryStore {
    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let mut tables = self.tables.write().await;

        let duplicate = tables
            .reviews
            .values()
            .any(|r| r.job_id == review.job_id && r.reviewer_id == review.reviewer_id);
        if duplicate {
            return Err(StoreError::Conflict("review for this job".to_string()));
        }

        let record = Review {
            id: Uuid::new_v4(),
            job_id: review.job_id,
            reviewer_id: review.reviewer_id,
            reviewee_id: review.reviewee_id,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        tables.reviews.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_reviews_by_job(&self, job_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .reviews
            .values()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |r| r.created_at))
    }

    async fn get_reviews_by_reviewee(&self, reviewee_id: Uuid) -> Result<Vec<Review>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .reviews
            .values()
            .filter(|r| r.reviewee_id == reviewee_id)
            .cloned()
            .collect();
        Ok(newest_first(rows, |r| r.created_at))
    }

    async fn refresh_user_rating(&self, user_id: Uuid) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;

        let rating = mean_rating(
            tables
                .reviews
                .values()
                .filter(|r| r.reviewee_id == user_id)
                .map(|r| r.rating),
        );

        let user = tables.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        user.rating = rating;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl NotificationExt for MemoryStore {
    async fn create_notification(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, StoreError> {
        let mut tables = self.tables.write().await;

        let record = Notification {
            id: Uuid::new_v4(),
            user_id: notification.user_id,
            notification_type: notification.notification_type,
            title: notification.title,
            message: notification.message,
            is_read: false,
            data: notification.data,
            created_at: Utc::now(),
        };
        tables.notifications.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Notification>, StoreError> {
        let tables = self.tables.read().await;
        let rows = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();

        Ok(newest_first(rows, |n| n.created_at)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_unread_notifications(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        let count = tables
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count();
        Ok(count as i64)
    }

    async fn mark_notification_read(
        &self,
        notification_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Notification>, StoreError> {
        let mut tables = self.tables.write().await;

        match tables.notifications.get_mut(&notification_id) {
            Some(n) if n.user_id == user_id => {
                n.is_read = true;
                Ok(Some(n.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;

        let mut updated = 0;
        for n in tables.notifications.values_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn clear_notifications(&self, user_id: Uuid) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;

        let before = tables.notifications.len();
        tables.notifications.retain(|_, n| n.user_id != user_id);
        Ok((before - tables.notifications.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{jobmodel::JobCategory, usermodel::UserRole};
    use sqlx::types::BigDecimal;

    async fn user(store: &MemoryStore, email: &str, role: UserRole) -> User {
        store
            .save_user(NewUser {
                username: email.split('@').next().unwrap_or(email).to_string(),
                email: email.to_string(),
                password_hash: "hash".to_string(),
                role,
                phone: None,
            })
            .await
            .unwrap()
    }

    async fn job(store: &MemoryStore, poster_id: Uuid, title: &str) -> Job {
        store
            .create_job(
                poster_id,
                NewJob {
                    title: title.to_string(),
                    description: "Front and back garden".to_string(),
                    category: JobCategory::Gardening,
                    location: "Bristol".to_string(),
                    rate: BigDecimal::from(25),
                    duration: Some("2 hours".to_string()),
                    is_urgent: false,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        user(&store, "ada@example.com", UserRole::Poster).await;

        let err = store
            .save_user(NewUser {
                username: "ada2".to_string(),
                email: "ada@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: UserRole::Seeker,
                phone: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn accept_assigns_job_and_rejects_rivals() {
        let store = MemoryStore::new();
        let poster = user(&store, "poster@example.com", UserRole::Poster).await;
        let first = user(&store, "first@example.com", UserRole::Seeker).await;
        let second = user(&store, "second@example.com", UserRole::Seeker).await;
        let job = job(&store, poster.id, "Mow the lawn").await;

        let winner = store
            .create_application(job.id, first.id, Some("I have a mower".to_string()))
            .await
            .unwrap();
        let rival = store
            .create_application(job.id, second.id, None)
            .await
            .unwrap();

        let outcome = store.accept_application(winner.id).await.unwrap();
        assert_eq!(outcome.job.status, JobStatus::InProgress);
        assert_eq!(outcome.job.assigned_to, Some(first.id));
        assert_eq!(outcome.accepted.status, ApplicationStatus::Accepted);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].id, rival.id);

        let rival = store.get_application_by_id(rival.id).await.unwrap().unwrap();
        assert_eq!(rival.status, ApplicationStatus::Rejected);
        assert!(rival.responded_at.is_some());

        let err = store.accept_application(winner.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn accept_on_closed_job_leaves_application_pending() {
        let store = MemoryStore::new();
        let poster = user(&store, "poster@example.com", UserRole::Poster).await;
        let seeker = user(&store, "seeker@example.com", UserRole::Seeker).await;
        let job = job(&store, poster.id, "Prune hedges").await;
        let application = store
            .create_application(job.id, seeker.id, None)
            .await
            .unwrap();

        store
            .transition_job(job.id, JobStatus::Open, JobStatus::Cancelled)
            .await
            .unwrap();

        let err = store.accept_application(application.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let application = store
            .get_application_by_id(application.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(application.status, ApplicationStatus::Pending);
    }

    #[tokio::test]
    async fn transition_only_applies_from_expected_status() {
        let store = MemoryStore::new();
        let poster = user(&store, "poster@example.com", UserRole::Poster).await;
        let job = job(&store, poster.id, "Weed the beds").await;

        let skipped = store
            .transition_job(job.id, JobStatus::InProgress, JobStatus::Completed)
            .await
            .unwrap();
        assert!(skipped.is_none());

        store
            .transition_job(job.id, JobStatus::Open, JobStatus::InProgress)
            .await
            .unwrap();
        let done = store
            .transition_job(job.id, JobStatus::InProgress, JobStatus::Completed)
            .await
            .unwrap()
            .unwrap();
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn deleting_open_job_drops_its_applications() {
        let store = MemoryStore::new();
        let poster = user(&store, "poster@example.com", UserRole::Poster).await;
        let seeker = user(&store, "seeker@example.com", UserRole::Seeker).await;
        let job = job(&store, poster.id, "Rake leaves").await;
        store
            .create_application(job.id, seeker.id, None)
            .await
            .unwrap();

        let removed = store.delete_open_job(job.id).await.unwrap();
        assert!(removed.is_some());
        assert!(store.get_job_by_id(job.id).await.unwrap().is_none());
        assert!(store
            .get_applications_by_seeker(seeker.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn review_refreshes_rating_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let poster = user(&store, "poster@example.com", UserRole::Poster).await;
        let seeker = user(&store, "seeker@example.com", UserRole::Seeker).await;
        let first = job(&store, poster.id, "Job one").await;
        let second = job(&store, poster.id, "Job two").await;

        for (job_id, rating) in [(first.id, 5), (second.id, 4)] {
            store
                .create_review(NewReview {
                    job_id,
                    reviewer_id: poster.id,
                    reviewee_id: seeker.id,
                    rating,
                    comment: None,
                })
                .await
                .unwrap();
        }

        let refreshed = store.refresh_user_rating(seeker.id).await.unwrap();
        assert_eq!(refreshed.rating, Some(4.5));

        let err = store
            .create_review(NewReview {
                job_id: first.id,
                reviewer_id: poster.id,
                reviewee_id: seeker.id,
                rating: 1,
                comment: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn notifications_are_scoped_to_their_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let note = store
            .create_notification(NewNotification {
                user_id: owner,
                notification_type: "new_application".to_string(),
                title: "New Application".to_string(),
                message: "Someone applied".to_string(),
                data: None,
            })
            .await
            .unwrap();

        assert!(store
            .mark_notification_read(note.id, other)
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.count_unread_notifications(owner).await.unwrap(), 1);

        assert_eq!(store.mark_all_notifications_read(owner).await.unwrap(), 1);
        assert_eq!(store.count_unread_notifications(owner).await.unwrap(), 0);
        assert!(store
            .get_notifications(owner, true, 20, 0)
            .await
            .unwrap()
            .is_empty());

        assert_eq!(store.clear_notifications(other).await.unwrap(), 0);
        assert_eq!(store.clear_notifications(owner).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn notification_pages_run_newest_first() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        let mut created = Vec::new();
        for title in ["first", "second", "third"] {
            let note = store
                .create_notification(NewNotification {
                    user_id: owner,
                    notification_type: "new_application".to_string(),
                    title: title.to_string(),
                    message: "Someone applied".to_string(),
                    data: None,
                })
                .await
                .unwrap();
            created.push(note);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        store
            .mark_notification_read(created[2].id, owner)
            .await
            .unwrap();

        let titles = |page: Vec<Notification>| -> Vec<String> {
            page.into_iter().map(|n| n.title).collect()
        };
        assert_eq!(
            titles(store.get_notifications(owner, false, 2, 0).await.unwrap()),
            vec!["third", "second"]
        );
        assert_eq!(
            titles(store.get_notifications(owner, false, 2, 2).await.unwrap()),
            vec!["first"]
        );
        assert_eq!(
            titles(store.get_notifications(owner, true, 1, 1).await.unwrap()),
            vec!["first"]
        );
        assert!(store
            .get_notifications(owner, false, 2, 5)
            .await
            .unwrap()
            .is_empty());
    }
}
