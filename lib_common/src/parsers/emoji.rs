//! Emoji dialect: headers carry a pictograph plus a keyword
//! (`🏷️ Name`, `💰 Money per sec`, `🆔 Job ID (PC)`, ...).

use super::labelled::{self, Header};
use crate::model::{ServerEvent, SourceDialect};

fn classify(line: &str) -> Option<Header> {
    let has = |emoji: &str, keyword: &str| line.contains(emoji) && line.contains(keyword);

    if has("🏷", "Name") {
        Some(Header::Name)
    } else if has("💰", "Money") {
        Some(Header::Money)
    } else if has("👥", "Players") {
        Some(Header::Players)
    } else if line.contains("🆔") {
        Some(Header::JobId)
    } else if has("🌐", "Join Link") {
        Some(Header::JoinLink)
    } else if has("📜", "Join Script") {
        Some(Header::Script)
    } else {
        None
    }
}

pub fn parse(content: &str) -> ServerEvent {
    labelled::scan(content, SourceDialect::Emoji, classify)
}
