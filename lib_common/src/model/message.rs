use serde::{Deserialize, Serialize};

/// # Inbound Message
///
/// A chat message as delivered by the platform's real-time gateway. Only the
/// parts the relay reads are modelled; everything defaults when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundMessage {
    pub id: Option<String>,
    pub channel_id: String,
    pub content: String,
    pub author: Option<Author>,
    pub embeds: Vec<Embed>,
    /// Forwarded-message wrapper; carries the real payload when the top-level
    /// envelope is empty.
    pub message_snapshots: Vec<MessageSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageSnapshot {
    pub message: SnapshotMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotMessage {
    pub content: String,
    pub embeds: Vec<Embed>,
}

impl InboundMessage {
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map(|a| a.username.as_str())
            .unwrap_or("Unknown")
    }

    /// Iterates every embed field value, in order.
    pub fn field_values(embeds: &[Embed]) -> impl Iterator<Item = &str> {
        embeds
            .iter()
            .flat_map(|e| e.fields.iter())
            .map(|f| f.value.as_str())
    }
}
