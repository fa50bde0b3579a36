// service/realtime.rs
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    dtos::userdtos::PublicProfile,
    models::{
        jobmodel::{Application, Job, Review},
        notificationmodel::Notification,
    },
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    Created,
    Updated,
    Deleted,
}

/// One committed write, carrying a snapshot of the record after the change
/// (or before it, for deletes).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    Job {
        op: ChangeOp,
        job: Job,
    },
    Application {
        op: ChangeOp,
        application: Application,
        poster_id: Uuid,
    },
    Review {
        review: Review,
    },
    Notification {
        op: ChangeOp,
        notification: Notification,
    },
    NotificationsRead {
        user_id: Uuid,
    },
    NotificationsCleared {
        user_id: Uuid,
    },
    Profile {
        user: PublicProfile,
    },
}

impl ChangeEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            ChangeEvent::Job { .. } => "job",
            ChangeEvent::Application { .. } => "application",
            ChangeEvent::Review { .. } => "review",
            ChangeEvent::Notification { .. } => "notification",
            ChangeEvent::NotificationsRead { .. } => "notifications_read",
            ChangeEvent::NotificationsCleared { .. } => "notifications_cleared",
            ChangeEvent::Profile { .. } => "profile",
        }
    }

    pub fn visible_to(&self, user_id: Uuid) -> bool {
        match self {
            ChangeEvent::Job { .. } | ChangeEvent::Review { .. } | ChangeEvent::Profile { .. } => {
                true
            }
            ChangeEvent::Application {
                application,
                poster_id,
                ..
            } => application.seeker_id == user_id || *poster_id == user_id,
            ChangeEvent::Notification { notification, .. } => notification.user_id == user_id,
            ChangeEvent::NotificationsRead { user_id: owner }
            | ChangeEvent::NotificationsCleared { user_id: owner } => *owner == user_id,
        }
    }
}

/// Fan-out of committed changes to every live feed subscriber.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: ChangeEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => tracing::debug!("published {} event to {} subscribers", name, receivers),
            Err(_) => tracing::trace!("no subscribers for {} event", name),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
