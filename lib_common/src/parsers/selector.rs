use super::labelled;
use super::DialectKind;
use crate::configs::PositionalConfig;
use crate::model::{Embed, InboundMessage};

/// The text and embeds a dialect parser actually reads, after content rescue.
#[derive(Debug, Clone, Copy)]
pub struct SelectedContent<'a> {
    pub content: &'a str,
    pub embeds: &'a [Embed],
}

/// Unwraps forwarded messages: when the envelope has no embeds, the first
/// snapshot's embeds are used, and its content too if the envelope's is empty.
pub fn rescue(message: &InboundMessage) -> SelectedContent<'_> {
    let mut selected = SelectedContent {
        content: &message.content,
        embeds: &message.embeds,
    };

    if selected.embeds.is_empty() {
        if let Some(snapshot) = message.message_snapshots.first() {
            selected.embeds = &snapshot.message.embeds;
            if selected.content.is_empty() {
                selected.content = &snapshot.message.content;
            }
        }
    }

    selected
}

/// Picks the single dialect for a message, first match wins:
/// positional marker phrase, emoji field markers, plain text without embeds,
/// embeds. `None` means the message is not a discovery announcement.
pub fn select(selected: &SelectedContent<'_>, positional: &PositionalConfig) -> Option<DialectKind> {
    let content = selected.content;

    if !positional.marker_phrase.is_empty() && content.contains(&positional.marker_phrase) {
        Some(DialectKind::Positional)
    } else if labelled::has_emoji_marker(content) {
        Some(DialectKind::Emoji)
    } else if selected.embeds.is_empty() && !content.trim().is_empty() {
        Some(DialectKind::Plain)
    } else if !selected.embeds.is_empty() {
        Some(DialectKind::Structured)
    } else {
        None
    }
}
