use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing_futures::Instrument;

use crate::notify::{Connection, ConnectionRegistry, until_draining};
use crate::web::AppState;

/// Handler for GET /ws.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let registry = state.notifier.clone();
    ws.on_upgrade(move |socket| {
        handle_socket(socket, registry).instrument(tracing::info_span!("websocket"))
    })
}

async fn handle_socket(mut socket: WebSocket, registry: Arc<ConnectionRegistry>) {
    let Some(connection) = registry.register().await else {
        tracing::info!("Refusing connection while draining");
        if let Err(err) = socket.send(Message::Close(None)).await {
            tracing::debug!("Failed to close refused socket: {}", err);
        }
        return;
    };
    let Connection {
        id,
        mut notifications,
        mut shutdown,
    } = connection;
    tracing::info!(%id, "WebSocket connected");

    let (mut sender, mut receiver) = socket.split();
    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if text.as_str() == "ping" && sender.send(Message::Text("pong!".into())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(err)) => {
                    tracing::debug!(%id, "WebSocket error: {}", err);
                    break;
                }
                Some(Ok(_)) => {}
            },
            notification = notifications.recv() => match notification {
                Ok(html) => {
                    if sender.send(Message::Text(html.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%id, "Connection fell behind, skipped {} notification(s)", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = until_draining(&mut shutdown) => {
                if let Err(err) = sender.send(Message::Close(None)).await {
                    tracing::debug!(%id, "Failed to send close frame: {}", err);
                }
                break;
            }
        }
    }

    registry.unregister(id).await;
    tracing::info!(%id, "WebSocket disconnected");
}

/// Creates and returns the notification router.
pub fn create_notify_router(state: Arc<AppState>) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}
