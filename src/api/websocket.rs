use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::api::handler::AppState;
use crate::notifications::Notification;

/// Live notification feed for panel clients
/// GET /notifications/stream
pub async fn stream_notifications(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let rx = state.notifications.subscribe();
    ws.on_upgrade(move |socket| handle_notification_stream(socket, rx))
}

async fn handle_notification_stream(socket: WebSocket, rx: broadcast::Receiver<Notification>) {
    let (sender, receiver) = socket.split();
    forward_notifications(sender, receiver, rx).await;
}

/// Pump notifications into the socket until either side goes away
async fn forward_notifications<S, R, E>(
    mut sender: S,
    mut receiver: R,
    mut rx: broadcast::Receiver<Notification>,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Send + 'static,
{
    // Client messages are ignored; we only watch for the close
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => break,
                _ => {}
            }
        }
    });

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    let Ok(json) = serde_json::to_string(&notification) else {
                        continue;
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Notification subscriber lagged, dropped {} messages", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    }

    debug!("📴 Notification stream closed");
}
