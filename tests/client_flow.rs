use std::{sync::Arc, time::Duration};

use gigmarket::{
    client::{cache::DataCache, ClientError, FeedMessage, FeedStream, MarketClient},
    config::Config,
    db::MemoryStore,
    dtos::{jobdtos::CreateJobDto, userdtos::RegisterUserDto},
    models::{
        jobmodel::{ApplicationStatus, JobCategory, JobStatus},
        usermodel::UserRole,
    },
    routes::create_router,
    service::realtime::ChangeEvent,
    AppState,
};
use reqwest::StatusCode;
use tokio::net::TcpListener;

async fn spawn_server() -> String {
    let config = Config {
        database_url: None,
        jwt_secret: "integration-secret".to_string(),
        jwt_maxage: 60,
        port: 0,
        cors_origins: vec![],
        event_buffer: 128,
    };
    let state = AppState::new(config, Arc::new(MemoryStore::new()));
    let app = create_router(Arc::new(state));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

async fn signed_in(base_url: &str, email: &str, role: UserRole) -> MarketClient {
    let mut client = MarketClient::new(base_url);
    client
        .register(&RegisterUserDto {
            username: None,
            email: email.to_string(),
            password: "hunter22".to_string(),
            phone: None,
            role,
        })
        .await
        .unwrap();
    client.login(email, "hunter22").await.unwrap();
    client
}

async fn next_change(feed: &mut FeedStream) -> ChangeEvent {
    let message = tokio::time::timeout(Duration::from_secs(5), feed.next())
        .await
        .expect("feed went quiet")
        .unwrap()
        .expect("feed closed");
    match message {
        FeedMessage::Change(event) => event,
        FeedMessage::Resync => panic!("unexpected resync"),
    }
}

fn gutter_job() -> CreateJobDto {
    CreateJobDto {
        title: "Clear the gutters".to_string(),
        description: "Single storey, ladder provided".to_string(),
        category: Some(JobCategory::Repairs),
        location: "Sheffield".to_string(),
        rate: 40.0,
        duration: Some("2 hours".to_string()),
        is_urgent: true,
    }
}

#[tokio::test]
async fn hiring_flow_reaches_the_seekers_feed_and_cache() {
    let base_url = spawn_server().await;
    let poster = signed_in(&base_url, "poster@example.com", UserRole::Poster).await;
    let seeker = signed_in(&base_url, "seeker@example.com", UserRole::Seeker).await;

    let me = seeker.me().await.unwrap();
    let mut cache = DataCache::new(me.id);
    let mut feed = seeker.subscribe().await.unwrap();

    let job = poster.create_job(&gutter_job()).await.unwrap();
    match next_change(&mut feed).await {
        ChangeEvent::Job { job: seen, .. } => assert_eq!(seen.id, job.id),
        other => panic!("expected the new job, got {:?}", other),
    }

    let application = seeker
        .apply(job.id, Some("Free this afternoon".to_string()))
        .await
        .unwrap();
    poster.accept_application(application.id).await.unwrap();

    loop {
        let event = next_change(&mut feed).await;
        let done = matches!(event, ChangeEvent::Notification { .. });
        cache.apply(&event);
        if done {
            break;
        }
    }

    let mine = cache.applications_by_seeker(me.id);
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].status, ApplicationStatus::Accepted);
    assert_eq!(cache.job(job.id).unwrap().status, JobStatus::InProgress);
    assert_eq!(cache.unread_count(), 1);

    let mut refreshed = DataCache::new(me.id);
    seeker.refresh(&mut refreshed).await.unwrap();
    assert_eq!(refreshed.unread_count(), 1);
    assert_eq!(refreshed.job(job.id).unwrap().assigned_to, Some(me.id));
}

#[tokio::test]
async fn reviews_and_errors_over_http() {
    let base_url = spawn_server().await;
    let poster = signed_in(&base_url, "p@example.com", UserRole::Poster).await;
    let seeker = signed_in(&base_url, "s@example.com", UserRole::Seeker).await;

    let err = seeker.create_job(&gutter_job()).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));

    let job = poster.create_job(&gutter_job()).await.unwrap();
    let application = seeker.apply(job.id, None).await.unwrap();

    let err = seeker.apply(job.id, None).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::CONFLICT));

    poster.accept_application(application.id).await.unwrap();
    poster.complete_job(job.id).await.unwrap();

    seeker
        .create_review(job.id, 4, Some("Clear instructions".to_string()))
        .await
        .unwrap();
    let err = seeker.create_review(job.id, 5, None).await.unwrap_err();
    match err {
        ClientError::Api { status, .. } => assert_eq!(status, StatusCode::CONFLICT),
        other => panic!("expected an API error, got {:?}", other),
    }

    let poster_id = poster.me().await.unwrap().id;
    let profile = seeker.user_profile(poster_id).await.unwrap();
    assert_eq!(profile.rating, Some(4.0));

    let seeker_me = seeker.me().await.unwrap();
    assert_eq!(seeker_me.profile.completed_jobs, 1);
    assert_eq!(seeker_me.profile.rating, None);
}
