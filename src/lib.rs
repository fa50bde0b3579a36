pub mod client;
pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod utils;

use std::sync::Arc;

use config::Config;
use db::MarketStore;
use service::{realtime::EventBus, Services};

#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub store: Arc<dyn MarketStore>,
    pub services: Services,
    pub events: EventBus,
}

impl AppState {
    pub fn new(env: Config, store: Arc<dyn MarketStore>) -> Self {
        let events = EventBus::new(env.event_buffer);
        let services = Services::new(store.clone(), events.clone());

        Self {
            env,
            store,
            services,
            events,
        }
    }
}
