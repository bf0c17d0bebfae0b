//! Axum WebSocket handler
//!
//! Upgrades `/asr-stream` connections and runs one session per socket. The
//! read half becomes the session's inbound frame stream; the write half is
//! wrapped in [`WsSink`].

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::core::session::{
    ClientSink, InboundFrame, OutputEvent, Session, SessionError, SessionResult,
};
use crate::state::AppState;

use super::error::WebSocketError;
use super::messages::{MessageRoute, inbound_frame};

/// WebSocket conversation handler
/// Upgrades the HTTP connection and starts a session on it
pub async fn asr_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Conversation connection upgrade requested");
    ws.on_upgrade(move |socket| handle_session_socket(socket, state))
}

async fn handle_session_socket(socket: WebSocket, state: Arc<AppState>) {
    let _active = state.track_session();
    let (sender, receiver) = socket.split();

    // A read error ends the session the same way a close frame does
    let inbound = Box::pin(receiver.filter_map(|message| async move {
        match message {
            Ok(message) => inbound_frame(message),
            Err(e) => {
                warn!("WebSocket read error: {}", e);
                Some(InboundFrame::Close)
            }
        }
    }));

    let session = Session::new(state.services.clone(), state.session_config.clone());
    info!("Conversation connection established, session {}", session.id());

    match session.run(inbound, WsSink::new(sender)).await {
        Ok(()) => info!("Conversation connection finished"),
        Err(e) => warn!("Conversation connection ended with error: {}", e),
    }
}

/// Write half of a client WebSocket
pub struct WsSink {
    sender: SplitSink<WebSocket, Message>,
}

impl WsSink {
    pub fn new(sender: SplitSink<WebSocket, Message>) -> Self {
        Self { sender }
    }

    async fn send_route(&mut self, route: MessageRoute) -> Result<(), WebSocketError> {
        let message = match route {
            MessageRoute::Outgoing(message) => {
                Message::Text(serde_json::to_string(&message)?.into())
            }
            MessageRoute::Binary(data) => Message::Binary(data),
        };
        self.sender.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl ClientSink for WsSink {
    async fn send_event(&mut self, event: OutputEvent) -> SessionResult<()> {
        self.send_route(MessageRoute::from(event))
            .await
            .map_err(SessionError::from)
    }

    async fn close(&mut self) {
        if let Err(e) = self.sender.close().await {
            debug!("WebSocket already closed: {}", e);
        }
    }
}
