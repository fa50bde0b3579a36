use std::sync::Arc;

use axum::{
    extract::Path,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        userdtos::{FilterUserDto, PublicProfile, UpdateProfileDto, UserData},
        validation_message, ApiResponse,
    },
    error::HttpError,
    middleware::JWTAuthMiddeware,
    service::{error::ServiceError, realtime::ChangeEvent},
    AppState,
};

pub fn users_handler() -> Router {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/profile", put(update_profile))
        .route("/:user_id", get(get_profile))
        .route("/:user_id/reviews", get(get_user_reviews))
}

pub async fn get_me(
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let filtered_user = FilterUserDto::filter_user(&user.user);

    Ok(Json(ApiResponse::success(
        "Current user",
        UserData {
            user: filtered_user,
        },
    )))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateProfileDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let updated = app_state
        .store
        .update_user_profile(user.user.id, body.into_update())
        .await?;

    tracing::info!("profile updated for {}", updated.id);
    app_state.events.publish(ChangeEvent::Profile {
        user: PublicProfile::from_user(&updated),
    });

    Ok(Json(ApiResponse::success(
        "Profile updated",
        UserData {
            user: FilterUserDto::filter_user(&updated),
        },
    )))
}

pub async fn get_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .store
        .get_user(Some(user_id), None)
        .await?
        .ok_or(ServiceError::UserNotFound(user_id))?;

    Ok(Json(ApiResponse::success(
        "User profile",
        PublicProfile::from_user(&user),
    )))
}

pub async fn get_user_reviews(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state
        .services
        .review_service
        .reviews_about(user_id)
        .await?;

    Ok(Json(ApiResponse::success("Reviews retrieved", reviews)))
}
