// client/cache.rs
use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    dtos::userdtos::PublicProfile,
    models::{
        jobmodel::{Application, ApplicationStatus, Job, JobStatus, Review},
        notificationmodel::Notification,
    },
    service::realtime::{ChangeEvent, ChangeOp},
};

/// Local copy of the marketplace as seen by one signed-in user, kept current
/// by applying feed events.
#[derive(Debug, Clone)]
pub struct DataCache {
    owner: Uuid,
    jobs: HashMap<Uuid, Job>,
    applications: HashMap<Uuid, Application>,
    /// job id -> poster id, also learned from application events for jobs
    /// that are not cached.
    job_posters: HashMap<Uuid, Uuid>,
    reviews: HashMap<Uuid, Review>,
    notifications: HashMap<Uuid, Notification>,
    profiles: HashMap<Uuid, PublicProfile>,
}

impl DataCache {
    pub fn new(owner: Uuid) -> Self {
        Self {
            owner,
            jobs: HashMap::new(),
            applications: HashMap::new(),
            job_posters: HashMap::new(),
            reviews: HashMap::new(),
            notifications: HashMap::new(),
            profiles: HashMap::new(),
        }
    }

    pub fn owner(&self) -> Uuid {
        self.owner
    }

    pub fn apply(&mut self, event: &ChangeEvent) {
        match event {
            ChangeEvent::Job { op, job } => match op {
                ChangeOp::Deleted => {
                    self.jobs.remove(&job.id);
                    self.applications.retain(|_, a| a.job_id != job.id);
                }
                ChangeOp::Created | ChangeOp::Updated => {
                    self.job_posters.insert(job.id, job.poster_id);
                    self.jobs.insert(job.id, job.clone());
                }
            },
            ChangeEvent::Application {
                op,
                application,
                poster_id,
            } => {
                self.job_posters.insert(application.job_id, *poster_id);
                match op {
                    ChangeOp::Deleted => {
                        self.applications.remove(&application.id);
                    }
                    ChangeOp::Created | ChangeOp::Updated => {
                        self.applications
                            .insert(application.id, application.clone());
                    }
                }
            }
            ChangeEvent::Review { review } => {
                self.reviews.insert(review.id, review.clone());
            }
            ChangeEvent::Notification { op, notification } => {
                if notification.user_id != self.owner {
                    return;
                }
                match op {
                    ChangeOp::Deleted => {
                        self.notifications.remove(&notification.id);
                    }
                    ChangeOp::Created | ChangeOp::Updated => {
                        self.notifications
                            .insert(notification.id, notification.clone());
                    }
                }
            }
            ChangeEvent::NotificationsRead { user_id } => {
                if *user_id == self.owner {
                    for notification in self.notifications.values_mut() {
                        notification.is_read = true;
                    }
                }
            }
            ChangeEvent::NotificationsCleared { user_id } => {
                if *user_id == self.owner {
                    self.notifications.clear();
                }
            }
            ChangeEvent::Profile { user } => {
                self.profiles.insert(user.user_id, user.clone());
            }
        }
    }

    pub fn replace_jobs(&mut self, jobs: Vec<Job>) {
        self.jobs = jobs.into_iter().map(|job| (job.id, job)).collect();
        for job in self.jobs.values() {
            self.job_posters.insert(job.id, job.poster_id);
        }
    }

    pub fn replace_applications(&mut self, applications: Vec<Application>) {
        self.applications = applications.into_iter().map(|a| (a.id, a)).collect();
    }

    pub fn replace_reviews(&mut self, reviews: Vec<Review>) {
        self.reviews = reviews.into_iter().map(|r| (r.id, r)).collect();
    }

    pub fn replace_notifications(&mut self, notifications: Vec<Notification>) {
        self.notifications = notifications
            .into_iter()
            .filter(|n| n.user_id == self.owner)
            .map(|n| (n.id, n))
            .collect();
    }

    pub fn job(&self, job_id: Uuid) -> Option<&Job> {
        self.jobs.get(&job_id)
    }

    pub fn application(&self, application_id: Uuid) -> Option<&Application> {
        self.applications.get(&application_id)
    }

    pub fn profile(&self, user_id: Uuid) -> Option<&PublicProfile> {
        self.profiles.get(&user_id)
    }

    /// Newest first.
    pub fn open_jobs(&self) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Open)
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    pub fn jobs_by_poster(&self, poster_id: Uuid) -> Vec<&Job> {
        let mut jobs: Vec<&Job> = self
            .jobs
            .values()
            .filter(|job| job.poster_id == poster_id)
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    pub fn applications_by_job(&self, job_id: Uuid) -> Vec<&Application> {
        self.sorted_applications(|a| a.job_id == job_id)
    }

    pub fn applications_by_seeker(&self, seeker_id: Uuid) -> Vec<&Application> {
        self.sorted_applications(|a| a.seeker_id == seeker_id)
    }

    pub fn pending_applications_for_poster(&self, poster_id: Uuid) -> Vec<&Application> {
        self.sorted_applications(|a| {
            a.status == ApplicationStatus::Pending
                && self.job_posters.get(&a.job_id) == Some(&poster_id)
        })
    }

    pub fn reviews_by_reviewee(&self, reviewee_id: Uuid) -> Vec<&Review> {
        self.sorted_reviews(|r| r.reviewee_id == reviewee_id)
    }

    pub fn reviews_by_job(&self, job_id: Uuid) -> Vec<&Review> {
        self.sorted_reviews(|r| r.job_id == job_id)
    }

    pub fn has_reviewed(&self, reviewer_id: Uuid, job_id: Uuid) -> bool {
        self.reviews
            .values()
            .any(|r| r.reviewer_id == reviewer_id && r.job_id == job_id)
    }

    /// Newest first.
    pub fn notifications(&self) -> Vec<&Notification> {
        let mut notifications: Vec<&Notification> = self.notifications.values().collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications
    }

    pub fn unread_count(&self) -> usize {
        self.notifications.values().filter(|n| !n.is_read).count()
    }

    fn sorted_applications<F>(&self, keep: F) -> Vec<&Application>
    where
        F: Fn(&Application) -> bool,
    {
        let mut applications: Vec<&Application> =
            self.applications.values().filter(|a| keep(a)).collect();
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        applications
    }

    fn sorted_reviews<F>(&self, keep: F) -> Vec<&Review>
    where
        F: Fn(&Review) -> bool,
    {
        let mut reviews: Vec<&Review> = self.reviews.values().filter(|r| keep(r)).collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        reviews
    }
}
