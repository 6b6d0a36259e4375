//! # Shared Fixtures
//!
//! Sample messages in every dialect the relay understands, plus a pipeline
//! builder wired the way the server wires it.

use lib_common::configs::RelayConfig;
use lib_common::core::{Dispatcher, RelayPipeline, RelayQueue, RelayStats};
use lib_common::model::{Embed, EmbedField, InboundMessage, MessageSnapshot, SnapshotMessage};
use std::sync::Arc;

pub const WATCHED_CHANNEL: &str = "1266358579934269463";
pub const JOB_ID: &str = "8f4eee40-8091-45fd-86a2-14820a64c502";

/// A notifier post in the emoji dialect, as it appears in the wild.
pub fn chilli_hub_content() -> String {
    format!(
        "Brainrot Notify | Chilli Hub
🏷️ Name
La Karkerkar Combinasion
💰 Money per sec
$600K/s
👥 Players
5/8
🆔 Job ID (Mobile)
{JOB_ID}
🆔 Job ID (PC)
{JOB_ID}
🌐 Join Link
Click to Join
📜 Join Script (PC)
game:GetService(\"TeleportService\"):TeleportToPlaceInstance(109983668079237,\"{JOB_ID}\",game.Players.LocalPlayer)
Made by Chilli Hub"
    )
}

/// A post in the positional dialect; `income` goes into both the summary line
/// and the Server Info block.
pub fn positional_content(players: &str, income: &str) -> String {
    format!(
        "Ice Hub Finder - Target Located
{JOB_ID}
{players}/18 | {income} | Tralalero Tralala
Server Info
Job ID:
{JOB_ID}
Players:
{players}
Total Income:
{income}"
    )
}

pub fn text_message(content: impl Into<String>) -> InboundMessage {
    InboundMessage {
        id: Some("1".into()),
        channel_id: WATCHED_CHANNEL.into(),
        content: content.into(),
        ..Default::default()
    }
}

pub fn structured_embed(name: &str, money: &str, players: &str) -> Embed {
    let field = |name: &str, value: &str| EmbedField {
        name: name.into(),
        value: value.into(),
    };
    Embed {
        title: Some("Server found".into()),
        description: None,
        fields: vec![
            field("Name", name),
            field("Money per sec", money),
            field("Players", players),
            field("Job ID", &format!("`{JOB_ID}`")),
        ],
    }
}

pub fn embed_message(embed: Embed) -> InboundMessage {
    InboundMessage {
        channel_id: WATCHED_CHANNEL.into(),
        embeds: vec![embed],
        ..Default::default()
    }
}

/// A forwarded message: the envelope is empty, the payload sits in the snapshot.
pub fn forwarded_message(embed: Embed) -> InboundMessage {
    InboundMessage {
        channel_id: WATCHED_CHANNEL.into(),
        message_snapshots: vec![MessageSnapshot {
            message: SnapshotMessage {
                content: String::new(),
                embeds: vec![embed],
            },
        }],
        ..Default::default()
    }
}

pub fn pipeline(config: RelayConfig) -> Arc<RelayPipeline> {
    let queue = Arc::new(RelayQueue::new(config.queue.capacity, config.queue.ttl()));
    Arc::new(RelayPipeline::new(
        Arc::new(config),
        queue,
        Arc::new(Dispatcher::new()),
        Arc::new(RelayStats::new()),
    ))
}
