use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{jobdtos::CreateReviewDto, validation_message, ApiResponse},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    utils::sanitize::clean_optional,
    AppState,
};

pub async fn get_job_reviews(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let reviews = app_state
        .services
        .review_service
        .reviews_for_job(job_id)
        .await?;

    Ok(Json(ApiResponse::success("Reviews retrieved", reviews)))
}

pub async fn create_review(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<CreateReviewDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let review = app_state
        .services
        .review_service
        .create_review(&user.user, job_id, body.rating, clean_optional(body.comment))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Review submitted successfully", review)),
    ))
}
