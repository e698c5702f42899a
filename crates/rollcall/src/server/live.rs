use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tracing::{debug, warn};

use super::AppState;
use crate::broadcast::Subscription;

/// `GET /live`: stream `new_attendance` events over a WebSocket.
pub(super) async fn live_updates(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        let subscription = state.broadcaster().subscribe();
        stream_events(socket, subscription).await;
    })
}

async fn stream_events(mut socket: WebSocket, mut subscription: Subscription) {
    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else { break };
                let payload = match serde_json::to_string(&event) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!("Could not encode {} event: {err}", event.name());
                        continue;
                    }
                };
                if socket.send(Message::Text(payload.into())).await.is_err() {
                    debug!("Viewer {} went away mid-send", subscription.id());
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                // Viewers only listen; anything they send is ignored.
                Some(Ok(_)) => {}
            },
        }
    }
}
