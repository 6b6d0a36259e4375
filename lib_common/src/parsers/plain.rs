//! Plain-text dialect: keyword headers (`Name`, `Money`, `Players`, `Job ID`,
//! `Join Script`, `Join Link`) each followed by the value on the next line.

use super::labelled::{self, Header};
use crate::model::{ServerEvent, SourceDialect};

fn classify(line: &str) -> Option<Header> {
    if line.contains("Name") || line.contains("🏷") {
        Some(Header::Name)
    } else if line.contains("Money") || line.contains("💰") {
        Some(Header::Money)
    } else if line.contains("Players") || line.contains("👥") {
        Some(Header::Players)
    } else if line.contains("Job ID") || line.contains("🆔") {
        Some(Header::JobId)
    } else if line.contains("Join Script") || line.contains("📜") {
        Some(Header::Script)
    } else if line.contains("Join Link") || line.contains("🌐") {
        Some(Header::JoinLink)
    } else {
        None
    }
}

pub fn parse(content: &str) -> ServerEvent {
    labelled::scan(content, SourceDialect::Plain, classify)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";

    #[test]
    fn test_full_plain_message() {
        let text = format!(
            "New server found!\nName\nTralalero Tralala\nMoney\n$1.5M/s\nPlayers\n6/8\nJob ID\n{ID}\nJoin Script\ngame:GetService(\"TeleportService\"):TeleportToPlaceInstance(1, \"{ID}\")\nJoin Link\nhttps://x.test/?gameInstanceId={ID}"
        );
        let event = parse(&text);
        assert_eq!(event.source_dialect, SourceDialect::Plain);
        assert_eq!(event.name.as_deref(), Some("Tralalero Tralala"));
        assert_eq!(event.money_rate, Some(1.5));
        assert_eq!(event.money_raw.as_deref(), Some("$1.5M/s"));
        assert_eq!(event.players.as_deref(), Some("6/8"));
        assert_eq!(event.job_id.as_deref(), Some(ID));
        assert!(event.script.as_deref().unwrap().contains("TeleportService"));
        assert!(event.join_link.as_deref().unwrap().starts_with("https://"));
        assert!(!event.is_high_value);
    }

    #[test]
    fn test_prose_after_script_header_is_rejected() {
        let event = parse("Join Script\nUse the button below");
        assert_eq!(event.script, None);
    }

    #[test]
    fn test_players_with_extra_slash_is_dropped() {
        let event = parse("Players\n1/2/3");
        assert_eq!(event.players, None);
    }

    #[test]
    fn test_no_headers_yields_empty_event() {
        assert!(parse("just chatting\nnothing here").is_empty());
    }
}
