use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tokio::sync::mpsc::{error::TrySendError, Sender};
use tracing::{debug, warn};

use crate::{data::models::wppconnect_model::WebhookEventModel, entities::InboundMessage};

/// HTTP surface: health check and the transport webhook. The webhook only
/// enqueues; messages are processed by the worker pool.
pub(crate) fn webhook_router(queue: Sender<InboundMessage>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(receive_event))
        .with_state(queue)
}

async fn health() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

async fn receive_event(
    State(queue): State<Sender<InboundMessage>>,
    Json(event): Json<WebhookEventModel>,
) -> StatusCode {
    let Some(message) = event.into_inbound() else {
        return StatusCode::OK;
    };
    match queue.try_send(message) {
        Ok(()) => StatusCode::ACCEPTED,
        Err(TrySendError::Full(message)) => {
            warn!(address = %message.address, "work queue full, rejecting message");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(TrySendError::Closed(_)) => {
            debug!("work queue closed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
