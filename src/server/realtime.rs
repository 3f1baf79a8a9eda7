//! WebSocket change channels: `/realtime/{collection}`.
//!
//! Each connection follows exactly one collection. The server sends a
//! `subscribed` frame once the channel is attached to the hub, then one
//! `change` frame per mutation, or `resync` if the connection fell behind.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use tokio::sync::broadcast::{self, error::RecvError};

use super::error::ApiError;
use super::AppState;
use crate::models::{Collection, FeedMessage};

pub async fn subscribe(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Result<Response, ApiError> {
    let collection = Collection::parse(&collection)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown collection: {}", collection)))?;

    // Attach before the upgrade so nothing published after the ack is missed.
    let rx = state.hub.subscribe(collection);
    tracing::debug!(
        "Realtime channel on {} opening, {} subscriber(s)",
        collection,
        state.hub.subscriber_count(collection)
    );

    Ok(ws.on_upgrade(move |socket| forward_changes(socket, collection, rx)))
}

async fn forward_changes(
    mut socket: WebSocket,
    collection: Collection,
    mut rx: broadcast::Receiver<FeedMessage>,
) {
    let ack = FeedMessage::Subscribed { collection }.encode();
    if socket.send(Message::Text(ack.into())).await.is_err() {
        return;
    }
    tracing::debug!("Realtime subscriber attached to {}", collection);

    loop {
        tokio::select! {
            event = rx.recv() => {
                let msg = match event {
                    Ok(msg) => msg,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "Realtime subscriber on {} lagged by {} event(s)",
                            collection,
                            skipped
                        );
                        FeedMessage::Resync { collection }
                    }
                    Err(RecvError::Closed) => break,
                };
                if socket.send(Message::Text(msg.encode().into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Clients are not expected to send anything else.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!("Realtime subscriber detached from {}", collection);
}
