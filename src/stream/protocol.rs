//! Wire contract for the real-time prediction socket.
//!
//! Outbound control messages are JSON text frames; audio goes out as raw
//! binary frames. Inbound frames are JSON text discriminated by a `type`
//! field. The canonical transcript schema is the nested form, with
//! confidence and stability inside the `transcript` object.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Control message sent over the streaming socket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ControlMessage {
    Start {
        #[serde(rename = "sampleRate")]
        sample_rate: u32,
    },
    Stop,
}

/// One (label, confidence) pair from the intent classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub label: String,
    pub confidence: f32,
}

/// Transcript hypothesis for the current utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub confidence: f32,
    pub stability: f32,
}

/// A realtime recognition result. `intents` is ordered best-first; a
/// final result should carry at least one intent, but the server has
/// been observed to violate that, so consumers must guard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub transcript: Transcript,
    #[serde(rename = "isFinal")]
    pub is_final: bool,
    #[serde(default)]
    pub intents: Vec<Intent>,
}

/// Inbound server message, classified by its `type` discriminator.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Ready { server_id: String },
    Failure { server_id: String },
    Intent(IntentResult),
}

#[derive(Debug, Deserialize)]
struct ServerStatus {
    id: String,
}

/// Classify an inbound text frame.
///
/// Unknown discriminators are ignored for forward compatibility;
/// malformed payloads are logged and dropped. Neither tears down the
/// session.
pub fn classify(text: &str) -> Option<ServerMessage> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("dropping malformed server message: {}", e);
            return None;
        }
    };

    let kind = match value.get("type").and_then(|t| t.as_str()) {
        Some(kind) => kind.to_string(),
        None => {
            warn!("dropping server message without a type field");
            return None;
        }
    };

    let parsed = match kind.as_str() {
        "ready" => serde_json::from_value::<ServerStatus>(value)
            .map(|s| ServerMessage::Ready { server_id: s.id }),
        "failure" => serde_json::from_value::<ServerStatus>(value)
            .map(|s| ServerMessage::Failure { server_id: s.id }),
        "intent" => serde_json::from_value::<IntentResult>(value).map(ServerMessage::Intent),
        other => {
            debug!("ignoring server message with unknown type {:?}", other);
            return None;
        }
    };

    match parsed {
        Ok(message) => Some(message),
        Err(e) => {
            warn!("dropping malformed {:?} message: {}", kind, e);
            None
        }
    }
}

/// Build the realtime prediction endpoint URL.
pub fn streaming_url(host: &str, model_id: &str, token: &str, user_id: &str) -> String {
    format!(
        "wss://{}/model/{}/predict-rt?token={}&interim=true&user_id={}",
        host, model_id, token, user_id
    )
}
