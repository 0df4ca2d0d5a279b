//! The bidirectional event-submission channel at `/ws` (spec.md §4.C,
//! §6). Each inbound frame is either an `event` frame (processed the same
//! way as the HTTP submit path) or a `ping` (answered with `pong`). Frame
//! ordering is preserved per connection; there is no ordering guarantee
//! across connections.
//!
//! Per spec.md §9's trust-boundary note: the channel has no
//! authentication, so every event submitted over it is stamped with a
//! fixed synthetic user id. That is the documented, preserved behavior —
//! not a bug — but production deployments should authenticate the
//! channel before exposing it.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::ingest::{self, EventSubmission};
use crate::AppState;

/// Documented trust-boundary placeholder identity for unauthenticated
/// websocket submissions.
pub const SYNTHETIC_WS_USER: &str = "ws-anonymous";

#[derive(Debug, Deserialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
enum InFrame {
    Event(EventSubmission),
    Ping,
}

#[derive(Debug, Serialize)]
#[serde(tag = "frame", rename_all = "snake_case")]
enum OutFrame {
    Ack { event_id: uuid::Uuid },
    Error { message: String },
    Pong,
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    tracing::warn!(
        "ingestion websocket channel is unauthenticated; submissions are \
         stamped with the synthetic user id '{SYNTHETIC_WS_USER}'"
    );

    while let Some(Ok(msg)) = socket.recv().await {
        let Message::Text(text) = msg else {
            continue;
        };
        let frame: InFrame = match serde_json::from_str(&text) {
            Ok(f) => f,
            Err(e) => {
                let _ = send(&mut socket, &OutFrame::Error { message: e.to_string() }).await;
                continue;
            }
        };

        let reply = match frame {
            InFrame::Ping => OutFrame::Pong,
            InFrame::Event(submission) => {
                match ingest::stamp_and_validate(submission, Some(SYNTHETIC_WS_USER)) {
                    Ok(event) => match ingest::enqueue(&state.pool, &event).await {
                        Ok(event_id) => OutFrame::Ack { event_id },
                        Err(e) => OutFrame::Error { message: e.to_string() },
                    },
                    Err(e) => OutFrame::Error { message: e.to_string() },
                }
            }
        };

        if send(&mut socket, &reply).await.is_err() {
            break;
        }
    }
}

async fn send(socket: &mut WebSocket, frame: &OutFrame) -> Result<(), axum::Error> {
    let text = serde_json::to_string(frame).unwrap_or_else(|_| "{}".to_string());
    socket.send(Message::Text(text.into())).await
}
