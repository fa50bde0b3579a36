pub mod applications;
pub mod auth;
pub mod events;
pub mod jobs;
pub mod notifications;
pub mod reviews;
pub mod users;
