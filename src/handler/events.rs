use std::{convert::Infallible, sync::Arc};

use axum::{
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Extension, Router,
};
use futures::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;

use crate::{middleware::JWTAuthMiddeware, AppState};

/// Name of the event sent when a subscriber fell behind and must refetch.
pub const RESYNC_EVENT: &str = "resync";

pub fn events_handler() -> Router {
    Router::new().route("/", get(change_feed))
}

/// Server-sent stream of every committed change the caller is allowed to see.
pub async fn change_feed(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = user.user.id;
    let receiver = app_state.events.subscribe();
    tracing::debug!(
        "user {} subscribed to the change feed ({} live)",
        user_id,
        app_state.events.subscriber_count()
    );

    let stream = stream::unfold(receiver, move |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(change) => {
                    if !change.visible_to(user_id) {
                        continue;
                    }
                    match Event::default().event(change.name()).json_data(&change) {
                        Ok(event) => return Some((Ok(event), receiver)),
                        Err(e) => {
                            tracing::warn!("could not encode {} event: {}", change.name(), e);
                            continue;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("feed for {} lagged by {} events", user_id, skipped);
                    let event = Event::default()
                        .event(RESYNC_EVENT)
                        .data(serde_json::json!({ "skipped": skipped }).to_string());
                    return Some((Ok(event), receiver));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
