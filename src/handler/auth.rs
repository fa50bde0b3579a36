use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use validator::Validate;

use crate::{
    db::StoreError,
    dtos::{
        userdtos::{FilterUserDto, LoginUserDto, RegisterUserDto, Response, UserData, UserLoginResponseDto},
        validation_message, ApiResponse,
    },
    error::{ErrorMessage, HttpError},
    middleware::SESSION_COOKIE,
    models::usermodel::NewUser,
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<RegisterUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let email = body.email.trim().to_lowercase();
    let existing_user = app_state.store.get_user(None, Some(&email)).await?;
    if existing_user.is_some() {
        return Err(HttpError::unique_constraint_violation(
            ErrorMessage::EmailExist.to_string(),
        ));
    }

    let hashed_password =
        password::hash(&body.password).map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = app_state
        .store
        .save_user(NewUser {
            username: body.display_name(),
            email,
            password_hash: hashed_password,
            role: body.role,
            phone: body.phone.filter(|p| !p.is_empty()),
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => {
                HttpError::unique_constraint_violation(ErrorMessage::EmailExist.to_string())
            }
            other => other.into(),
        })?;

    tracing::info!("registered {} user {}", user.role.to_str(), user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "User registered successfully.",
            UserData {
                user: FilterUserDto::filter_user(&user),
            },
        )),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(validation_message(&e)))?;

    let result = app_state
        .store
        .get_user(None, Some(&body.email.trim().to_lowercase()))
        .await?;

    let user = result.ok_or_else(|| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        tracing::debug!("wrong password for {}", user.id);
        return Err(HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()));
    }

    let token = token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| HttpError::server_error(e.to_string()))?;

    let cookie_duration = time::Duration::minutes(app_state.env.jwt_maxage);
    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    let response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        token,
        user: FilterUserDto::filter_user(&user),
    });

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))?,
    );

    let mut response = response.into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}

pub async fn logout() -> Result<impl IntoResponse, HttpError> {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))?,
    );

    let mut response = Json(Response {
        status: "success",
        message: "Logout successful".to_string(),
    })
    .into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}
