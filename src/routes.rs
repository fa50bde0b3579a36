use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        applications::applications_handler, auth::auth_handler, events::events_handler,
        jobs::jobs_handler, notifications::notifications_handler, users::users_handler,
    },
    middleware::auth,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        // jobs mixes public listings with authenticated actions
        .nest("/jobs", jobs_handler())
        .nest(
            "/applications",
            applications_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/notifications",
            notifications_handler().layer(middleware::from_fn(auth)),
        )
        .nest("/events", events_handler().layer(middleware::from_fn(auth)))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, HeaderMap, Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{config::Config, db::MemoryStore};

    fn app() -> Router {
        let config = Config {
            database_url: None,
            jwt_secret: "router-test-secret".to_string(),
            jwt_maxage: 60,
            port: 0,
            cors_origins: vec![],
            event_buffer: 64,
        };
        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        create_router(Arc::new(state))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    async fn register(app: &Router, email: &str, role: &str) -> (StatusCode, Value) {
        let (status, _, body) = send(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "email": email, "password": "secret123", "role": role })),
        )
        .await;
        (status, body)
    }

    async fn login(app: &Router, email: &str) -> String {
        let (status, _, body) = send(
            app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    async fn signed_in(app: &Router, email: &str, role: &str) -> String {
        let (status, _) = register(app, email, role).await;
        assert_eq!(status, StatusCode::CREATED);
        login(app, email).await
    }

    async fn post_job(app: &Router, token: &str, title: &str) -> Value {
        let (status, _, body) = send(
            app,
            Method::POST,
            "/api/jobs",
            Some(token),
            Some(json!({
                "title": title,
                "description": "Two hours on Saturday",
                "category": "gardening",
                "location": "Leeds",
                "rate": 15.5
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"].clone()
    }

    #[tokio::test]
    async fn health_check_responds() {
        let app = app();
        let (status, _, body) = send(&app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() {
        let app = app();

        let (status, body) = register(&app, "ada@example.com", "seeker").await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["user"]["display_name"], "ada");

        let (status, body) = register(&app, "ada@example.com", "poster").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], "fail");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = app();
        register(&app, "bo@example.com", "seeker").await;

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "bo@example.com", "password": "not-it" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Email or password is wrong");
    }

    #[tokio::test]
    async fn login_sets_the_session_cookie() {
        let app = app();
        register(&app, "cy@example.com", "poster").await;

        let (status, headers, _) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "cy@example.com", "password": "secret123" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("session-token="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let app = app();
        let (status, _, _) = send(&app, Method::GET, "/api/users/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _, _) = send(&app, Method::GET, "/api/jobs", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn seekers_cannot_post_jobs() {
        let app = app();
        let token = signed_in(&app, "dee@example.com", "seeker").await;

        let (status, _, _) = send(
            &app,
            Method::POST,
            "/api/jobs",
            Some(&token),
            Some(json!({
                "title": "Mow lawn",
                "description": "Front and back",
                "location": "York",
                "rate": 10
            })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn accepting_hires_one_applicant() {
        let app = app();
        let poster = signed_in(&app, "poster@example.com", "poster").await;
        let seeker = signed_in(&app, "seeker@example.com", "seeker").await;
        let rival = signed_in(&app, "rival@example.com", "seeker").await;

        let job = post_job(&app, &poster, "Weed the borders").await;
        let job_id = job["id"].as_str().unwrap();
        let applications_uri = format!("/api/jobs/{}/applications", job_id);

        let (status, _, hired) = send(
            &app,
            Method::POST,
            &applications_uri,
            Some(&seeker),
            Some(json!({ "message": "I have my own tools" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _, _) = send(
            &app,
            Method::POST,
            &applications_uri,
            Some(&rival),
            Some(json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _, pending) =
            send(&app, Method::GET, "/api/applications/pending", Some(&poster), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending["data"].as_array().unwrap().len(), 2);

        let accept_uri = format!(
            "/api/applications/{}/accept",
            hired["data"]["id"].as_str().unwrap()
        );
        let (status, _, outcome) = send(&app, Method::PUT, &accept_uri, Some(&poster), None).await;
        assert_eq!(status, StatusCode::OK, "{}", outcome);
        assert_eq!(outcome["data"]["job"]["status"], "in_progress");
        assert_eq!(outcome["data"]["rejected"].as_array().unwrap().len(), 1);

        let (_, _, listed) = send(&app, Method::GET, &applications_uri, Some(&poster), None).await;
        let statuses: Vec<&str> = listed["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["status"].as_str().unwrap())
            .collect();
        assert_eq!(statuses.iter().filter(|s| **s == "accepted").count(), 1);
        assert_eq!(statuses.iter().filter(|s| **s == "rejected").count(), 1);

        let (status, _, _) = send(&app, Method::PUT, &accept_uri, Some(&poster), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, _, unread) = send(
            &app,
            Method::GET,
            "/api/notifications/unread-count",
            Some(&rival),
            None,
        )
        .await;
        assert_eq!(unread["data"]["unread_count"], 1);
    }

    #[tokio::test]
    async fn reviews_follow_completion() {
        let app = app();
        let poster = signed_in(&app, "p2@example.com", "poster").await;
        let seeker = signed_in(&app, "s2@example.com", "seeker").await;

        let job = post_job(&app, &poster, "Assemble wardrobe").await;
        let job_id = job["id"].as_str().unwrap().to_string();

        let (_, _, application) = send(
            &app,
            Method::POST,
            &format!("/api/jobs/{}/applications", job_id),
            Some(&seeker),
            Some(json!({})),
        )
        .await;
        send(
            &app,
            Method::PUT,
            &format!(
                "/api/applications/{}/accept",
                application["data"]["id"].as_str().unwrap()
            ),
            Some(&poster),
            None,
        )
        .await;

        let reviews_uri = format!("/api/jobs/{}/reviews", job_id);
        let review = json!({ "rating": 5, "comment": "<b>Quick</b> and tidy" });

        let (status, _, _) =
            send(&app, Method::POST, &reviews_uri, Some(&poster), Some(review.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(
            &app,
            Method::PUT,
            &format!("/api/jobs/{}/complete", job_id),
            Some(&seeker),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _, created) =
            send(&app, Method::POST, &reviews_uri, Some(&poster), Some(review.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["data"]["comment"], "Quick and tidy");

        let (status, _, _) =
            send(&app, Method::POST, &reviews_uri, Some(&poster), Some(review)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _, listed) = send(&app, Method::GET, &reviews_uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn in_progress_jobs_cannot_be_deleted() {
        let app = app();
        let poster = signed_in(&app, "p3@example.com", "poster").await;
        let seeker = signed_in(&app, "s3@example.com", "seeker").await;

        let job = post_job(&app, &poster, "Paint fence").await;
        let job_id = job["id"].as_str().unwrap().to_string();
        let (_, _, application) = send(
            &app,
            Method::POST,
            &format!("/api/jobs/{}/applications", job_id),
            Some(&seeker),
            Some(json!({})),
        )
        .await;
        send(
            &app,
            Method::PUT,
            &format!(
                "/api/applications/{}/accept",
                application["data"]["id"].as_str().unwrap()
            ),
            Some(&poster),
            None,
        )
        .await;

        let (status, _, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/jobs/{}", job_id),
            Some(&poster),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn posters_edit_open_jobs() {
        let app = app();
        let poster = signed_in(&app, "p4@example.com", "poster").await;
        let seeker = signed_in(&app, "s4@example.com", "seeker").await;

        let job = post_job(&app, &poster, "Clear gutters").await;
        let job_uri = format!("/api/jobs/{}", job["id"].as_str().unwrap());

        let (status, _, edited) = send(
            &app,
            Method::PUT,
            &job_uri,
            Some(&poster),
            Some(json!({ "title": "Clear <b>gutters</b> and drains", "is_urgent": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", edited);
        assert_eq!(edited["data"]["title"], "Clear gutters and drains");
        assert_eq!(edited["data"]["is_urgent"], true);
        assert_eq!(edited["data"]["description"], job["description"]);

        let (_, _, fetched) = send(&app, Method::GET, &job_uri, None, None).await;
        assert_eq!(fetched["data"]["title"], "Clear gutters and drains");

        let (status, _, _) = send(
            &app,
            Method::PUT,
            &job_uri,
            Some(&seeker),
            Some(json!({ "title": "Mine now" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _, _) = send(
            &app,
            Method::PUT,
            &job_uri,
            Some(&poster),
            Some(json!({ "rate": 1e10 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn notifications_page_and_clear() {
        let app = app();
        let poster = signed_in(&app, "p5@example.com", "poster").await;
        let job = post_job(&app, &poster, "Walk the dog").await;
        let applications_uri = format!("/api/jobs/{}/applications", job["id"].as_str().unwrap());

        for email in ["s5a@example.com", "s5b@example.com", "s5c@example.com"] {
            let seeker = signed_in(&app, email, "seeker").await;
            let (status, _, _) = send(
                &app,
                Method::POST,
                &applications_uri,
                Some(&seeker),
                Some(json!({})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, _, listed) = send(
            &app,
            Method::GET,
            "/api/notifications?limit=2&page=2",
            Some(&poster),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["data"]["page"], 2);
        assert_eq!(listed["data"]["limit"], 2);
        assert_eq!(listed["data"]["unread_count"], 3);
        let second_page = listed["data"]["notifications"].as_array().unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0]["type"], "new_application");
        assert_eq!(second_page[0]["read"], false);

        let read_uri = format!(
            "/api/notifications/{}/read",
            second_page[0]["id"].as_str().unwrap()
        );
        let (status, _, read) = send(&app, Method::PUT, &read_uri, Some(&poster), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(read["data"]["read"], true);

        let (_, _, unread) = send(
            &app,
            Method::GET,
            "/api/notifications?unread_only=true",
            Some(&poster),
            None,
        )
        .await;
        assert_eq!(unread["data"]["notifications"].as_array().unwrap().len(), 2);
        assert_eq!(unread["data"]["unread_count"], 2);

        let (status, _, _) = send(
            &app,
            Method::GET,
            "/api/notifications?limit=0",
            Some(&poster),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, marked) =
            send(&app, Method::PUT, "/api/notifications/read-all", Some(&poster), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(marked["data"]["affected"], 2);

        let (_, _, count) = send(
            &app,
            Method::GET,
            "/api/notifications/unread-count",
            Some(&poster),
            None,
        )
        .await;
        assert_eq!(count["data"]["unread_count"], 0);

        let (status, _, cleared) =
            send(&app, Method::DELETE, "/api/notifications", Some(&poster), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cleared["data"]["affected"], 3);

        let (status, _, _) = send(&app, Method::PUT, &read_uri, Some(&poster), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
