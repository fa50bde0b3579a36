use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    db::StoreError,
    error::{ErrorMessage, HttpError},
    models::jobmodel::{ApplicationStatus, JobStatus},
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email or password is wrong")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Job {0} not found")]
    JobNotFound(Uuid),

    #[error("Application {0} not found")]
    ApplicationNotFound(Uuid),

    #[error("Notification {0} not found")]
    NotificationNotFound(Uuid),

    #[error("Job {0} is {status}", status = .1.to_str())]
    InvalidJobStatus(Uuid, JobStatus),

    #[error("Application {0} is already {status}", status = .1.to_str())]
    InvalidApplicationStatus(Uuid, ApplicationStatus),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Other error: {0}")]
    Other(String),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_)
            | ServiceError::InvalidJobStatus(_, _)
            | ServiceError::InvalidApplicationStatus(_, _) => StatusCode::BAD_REQUEST,

            ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,

            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,

            ServiceError::UserNotFound(_)
            | ServiceError::JobNotFound(_)
            | ServiceError::ApplicationNotFound(_)
            | ServiceError::NotificationNotFound(_) => StatusCode::NOT_FOUND,

            ServiceError::Conflict(_) => StatusCode::CONFLICT,

            ServiceError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            ServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            ServiceError::Store(StoreError::Database(_)) | ServiceError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{}", error);
            return HttpError::server_error(ErrorMessage::ServerError.to_string());
        }
        HttpError::new(error.to_string(), status)
    }
}

impl From<String> for ServiceError {
    fn from(err: String) -> Self {
        ServiceError::Other(err)
    }
}
