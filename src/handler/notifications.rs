use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        notificationdtos::{AffectedDto, NotificationListDto, NotificationQueryDto, UnreadCountDto},
        validation_message, ApiResponse,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    AppState,
};

pub fn notifications_handler() -> Router {
    Router::new()
        .route("/", get(get_notifications).delete(clear_notifications))
        .route("/unread-count", get(get_unread_count))
        .route("/read-all", put(mark_all_read))
        .route("/:notification_id/read", put(mark_read))
}

pub async fn get_notifications(
    Query(query_params): Query<NotificationQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let (limit, offset) = query_params.window();
    let service = &app_state.services.notification_service;

    let notifications = service
        .list(user.user.id, query_params.unread_only, limit, offset)
        .await?;
    let unread_count = service.unread_count(user.user.id).await?;

    Ok(Json(ApiResponse::success(
        "Notifications retrieved",
        NotificationListDto {
            notifications,
            unread_count,
            page: offset / limit + 1,
            limit,
        },
    )))
}

pub async fn get_unread_count(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let unread_count = app_state
        .services
        .notification_service
        .unread_count(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Unread count retrieved",
        UnreadCountDto { unread_count },
    )))
}

pub async fn mark_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let notification = app_state
        .services
        .notification_service
        .mark_read(notification_id, user.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Notification marked as read",
        notification,
    )))
}

pub async fn mark_all_read(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let affected = app_state
        .services
        .notification_service
        .mark_all_read(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "All notifications marked as read",
        AffectedDto { affected },
    )))
}

pub async fn clear_notifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let affected = app_state
        .services
        .notification_service
        .clear_all(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Notifications cleared",
        AffectedDto { affected },
    )))
}
