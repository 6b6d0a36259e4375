use serde::{Deserialize, Serialize};

/// Frames a WebSocket listener may send back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Status { status: String },
    Log { message: String },
}

/// Body of `POST /api/ping`; everything optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PingRequest {
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PingRecord {
    pub source: String,
    pub timestamp: String,
}
