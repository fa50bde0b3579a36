use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        jobdtos::{CreateJobDto, SearchJobsDto, UpdateJobDto},
        validation_message, ApiResponse,
    },
    error::HttpError,
    handler::{applications, reviews},
    middleware::{auth, role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn jobs_handler() -> Router {
    let public_routes = Router::new()
        .route("/", get(search_jobs))
        .route("/:job_id", get(get_job))
        .route("/:job_id/reviews", get(reviews::get_job_reviews));

    let protected_routes = Router::new()
        .route(
            "/",
            post(create_job).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Poster])
            })),
        )
        .route(
            "/mine",
            get(get_my_jobs).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Poster])
            })),
        )
        .route(
            "/assigned",
            get(get_assigned_jobs).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Seeker])
            })),
        )
        .route("/:job_id", put(update_job).delete(delete_job))
        .route("/:job_id/cancel", put(cancel_job))
        .route("/:job_id/complete", put(complete_job))
        .route(
            "/:job_id/applications",
            post(applications::apply_for_job)
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Seeker])
                }))
                .get(applications::get_job_applications),
        )
        .route("/:job_id/reviews", post(reviews::create_review))
        .layer(middleware::from_fn(auth));

    Router::new().merge(public_routes).merge(protected_routes)
}

pub async fn search_jobs(
    Query(query_params): Query<SearchJobsDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let filter = query_params.into_filter();
    let jobs = app_state.services.job_service.search_jobs(&filter).await?;

    Ok(Json(ApiResponse::success("Jobs retrieved", jobs)))
}

pub async fn get_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state.services.job_service.get_job(job_id).await?;

    Ok(Json(ApiResponse::success("Job retrieved", job)))
}

pub async fn create_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let new_job = body
        .into_new_job()
        .ok_or_else(|| HttpError::bad_request("Title and description must contain text"))?;

    let job = app_state
        .services
        .job_service
        .create_job(&user.user, new_job)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Job created successfully", job)),
    ))
}

pub async fn get_my_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state
        .services
        .job_service
        .jobs_posted_by(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Jobs retrieved", jobs)))
}

pub async fn get_assigned_jobs(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let jobs = app_state
        .services
        .job_service
        .jobs_assigned_to(user.user.id)
        .await?;

    Ok(Json(ApiResponse::success("Assigned jobs retrieved", jobs)))
}

pub async fn update_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
    Json(body): Json<UpdateJobDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let job = app_state
        .services
        .job_service
        .update_job(&user.user, job_id, body.into_update())
        .await?;

    Ok(Json(ApiResponse::success("Job updated successfully", job)))
}

pub async fn delete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .services
        .job_service
        .delete_job(&user.user, job_id)
        .await?;

    Ok(Json(ApiResponse::success("Job deleted successfully", job)))
}

pub async fn cancel_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .services
        .job_service
        .cancel_job(&user.user, job_id)
        .await?;

    Ok(Json(ApiResponse::success("Job cancelled", job)))
}

pub async fn complete_job(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let job = app_state
        .services
        .job_service
        .complete_job(&user.user, job_id)
        .await?;

    Ok(Json(ApiResponse::success("Job marked as completed", job)))
}
