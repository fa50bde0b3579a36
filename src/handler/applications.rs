use std::sync::Arc;

use axum::{
    extract::Path,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{jobdtos::CreateApplicationDto, validation_message, ApiResponse},
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    utils::sanitize::clean_optional,
    AppState,
};

pub fn applications_handler() -> Router {
    Router::new()
        .route(
            "/mine",
            get(get_my_applications).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Seeker])
            })),
        )
        .route(
            "/pending",
            get(get_pending_applications).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Poster])
            })),
        )
        .route("/:application_id/accept", put(accept_application))
        .route("/:application_id/reject", put(reject_application))
        .route("/:application_id/withdraw", put(withdraw_application))
}

pub async fn apply_for_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<CreateApplicationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let application = app_state
        .services
        .application_service
        .apply(&user.user, job_id, clean_optional(body.message))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Application submitted successfully",
            application,
        )),
    ))
}

pub async fn get_job_applications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let applications = app_state
        .services
        .application_service
        .applications_for_job(&user.user, job_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Applications retrieved",
        applications,
    )))
}

pub async fn get_my_applications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let applications = app_state
        .services
        .application_service
        .applications_by_seeker(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Applications retrieved",
        applications,
    )))
}

pub async fn get_pending_applications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let applications = app_state
        .services
        .application_service
        .pending_for_poster(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Pending applications retrieved",
        applications,
    )))
}

pub async fn accept_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let outcome = app_state
        .services
        .application_service
        .accept(&user.user, application_id)
        .await?;

    Ok(Json(ApiResponse::success("Application accepted", outcome)))
}

pub async fn reject_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state
        .services
        .application_service
        .reject(&user.user, application_id)
        .await?;

    Ok(Json(ApiResponse::success("Application rejected", application)))
}

pub async fn withdraw_application(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let application = app_state
        .services
        .application_service
        .withdraw(&user.user, application_id)
        .await?;

    Ok(Json(ApiResponse::success("Application withdrawn", application)))
}
