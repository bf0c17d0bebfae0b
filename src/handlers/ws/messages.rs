//! WebSocket message types and routing

use axum::extract::ws::Message;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::core::session::{InboundFrame, OutputEvent};

/// JSON events sent to the client, distinguished by their single key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    Answer {
        answer: String,
    },
    AsrReturn {
        #[serde(rename = "asrReturn")]
        asr_return: String,
    },
}

/// Message routing for the write half: JSON text or raw audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRoute {
    Outgoing(OutgoingMessage),
    Binary(Bytes),
}

impl From<OutputEvent> for MessageRoute {
    fn from(event: OutputEvent) -> Self {
        match event {
            OutputEvent::Transcript(text) => {
                MessageRoute::Outgoing(OutgoingMessage::AsrReturn { asr_return: text })
            }
            OutputEvent::Answer(text) => {
                MessageRoute::Outgoing(OutgoingMessage::Answer { answer: text })
            }
            OutputEvent::Audio(data) => MessageRoute::Binary(data),
        }
    }
}

/// Map a client WebSocket message to a session frame
///
/// Ping and pong frames are answered by axum and yield nothing.
pub fn inbound_frame(message: Message) -> Option<InboundFrame> {
    match message {
        Message::Binary(data) => Some(InboundFrame::Audio(data)),
        Message::Text(text) => Some(InboundFrame::Control(text.as_str().to_owned())),
        Message::Close(_) => Some(InboundFrame::Close),
        Message::Ping(_) | Message::Pong(_) => None,
    }
}
