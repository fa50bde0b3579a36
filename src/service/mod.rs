pub mod application_service;
pub mod error;
pub mod job_service;
pub mod notification_service;
pub mod realtime;
pub mod review_service;

use std::sync::Arc;

use crate::db::MarketStore;
use application_service::ApplicationService;
use job_service::JobService;
use notification_service::NotificationService;
use realtime::EventBus;
use review_service::ReviewService;

#[derive(Debug, Clone)]
pub struct Services {
    pub job_service: Arc<JobService>,
    pub application_service: Arc<ApplicationService>,
    pub review_service: Arc<ReviewService>,
    pub notification_service: Arc<NotificationService>,
}

impl Services {
    pub fn new(store: Arc<dyn MarketStore>, events: EventBus) -> Self {
        let notification_service =
            Arc::new(NotificationService::new(store.clone(), events.clone()));

        let job_service = Arc::new(JobService::new(
            store.clone(),
            notification_service.clone(),
            events.clone(),
        ));
        let application_service = Arc::new(ApplicationService::new(
            store.clone(),
            notification_service.clone(),
            events.clone(),
        ));
        let review_service = Arc::new(ReviewService::new(
            store,
            notification_service.clone(),
            events,
        ));

        Self {
            job_service,
            application_service,
            review_service,
            notification_service,
        }
    }
}
