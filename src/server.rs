//! WebSocket transport for the session coordinator.
//!
//! Each connection gets one dispatch loop: inbound frames are decoded
//! into the closed [`ClientMessage`] schema and handed to the
//! coordinator; authoritative broadcasts drain from the connection's
//! outbound channel into the socket. Malformed frames are reported
//! back as `error` messages and the connection stays open.

use crate::coordinator::Coordinator;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::next_connection_id;
use anyhow::Result;
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc::unbounded_channel;
use tracing::{debug, info, instrument, warn};

/// Builds the router exposing the websocket endpoint at `/ws`.
pub fn router(coordinator: Coordinator) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(coordinator)
}

/// Binds the listener and serves connections until shutdown.
#[instrument(skip(coordinator))]
pub async fn serve(host: &str, port: u16, coordinator: Coordinator) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(host, port, "Session server listening");
    axum::serve(listener, router(coordinator)).await?;
    Ok(())
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(coordinator): State<Coordinator>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator))
}

/// Per-connection dispatch loop.
#[instrument(skip(socket, coordinator))]
async fn handle_socket(socket: WebSocket, coordinator: Coordinator) {
    let conn = next_connection_id();
    let (sender, mut outbound) = unbounded_channel::<ServerMessage>();
    coordinator.connect(conn, sender);
    info!(conn, "Connection opened");

    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(err) => {
                    warn!(error = %err, "Failed to encode outbound message");
                    continue;
                }
            };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = stream.next().await {
        match frame {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => {
                    debug!(conn, ?msg, "Dispatching client message");
                    if let Err(err) = coordinator.handle(conn, msg) {
                        coordinator.send_error(conn, err.to_string());
                    }
                }
                Err(err) => {
                    // Malformed input keeps the connection open.
                    warn!(conn, error = %err, "Malformed client message");
                    coordinator.send_error(conn, format!("Malformed message: {}", err));
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    coordinator.disconnect(conn);
    writer.abort();
    info!(conn, "Connection closed");
}
