//! Header-then-value scanning shared by the two line-labelled text dialects.
//!
//! Both dialects put a header on its own line (`Money`, `💰 Money per sec`, ...)
//! and the value on the following line(s). They differ only in how a header line
//! is recognised, which each dialect supplies as a classifier.

use super::cursor::LineCursor;
use super::fields::{self, JOB_ID_WINDOW};
use super::money;
use crate::model::{ServerEvent, SourceDialect};

/// Field a header line introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Header {
    Name,
    Money,
    Players,
    JobId,
    Script,
    JoinLink,
}

/// Pictographs that mark a field header in announcement text. The name marker
/// is matched without its variation selector so both renderings hit.
pub const EMOJI_MARKERS: [&str; 6] = ["🏷", "💰", "👥", "🆔", "🌐", "📜"];

const BOUNDARY_EMOJI: [&str; 5] = ["💰", "👥", "🆔", "🌐", "📜"];
const BOUNDARY_KEYWORDS: [&str; 5] = ["Money", "Players", "Job ID", "Join Link", "Join Script"];

/// A line that ends a multi-line name block.
pub fn is_field_header(line: &str) -> bool {
    BOUNDARY_EMOJI.iter().any(|e| line.contains(e))
        || BOUNDARY_KEYWORDS.iter().any(|k| line.contains(k))
}

pub fn has_emoji_marker(text: &str) -> bool {
    EMOJI_MARKERS.iter().any(|e| text.contains(e))
}

/// Walks `text` line by line, dispatching each recognised header to its field
/// step. Lines that are neither headers nor consumed values are skipped.
pub fn scan<F>(text: &str, dialect: SourceDialect, classify: F) -> ServerEvent
where
    F: Fn(&str) -> Option<Header>,
{
    let mut cursor = LineCursor::new(text);
    let mut event = ServerEvent::new(dialect);

    while let Some(line) = cursor.next_line() {
        match classify(line) {
            Some(Header::Name) => {
                let parts = cursor.take_until(is_field_header);
                if !parts.is_empty() {
                    event.name = Some(parts.join(" "));
                }
            }
            Some(Header::Money) => {
                if let Some(reading) = cursor.next_line().and_then(money::normalize) {
                    fields::set_money(&mut event, reading);
                }
            }
            Some(Header::Players) => {
                if let Some(players) = cursor.next_line().filter(|p| fields::is_player_count(p)) {
                    event.players = Some(players.to_string());
                }
            }
            Some(Header::JobId) => {
                if let Some(job_id) = take_job_id(&mut cursor) {
                    event.job_id = Some(job_id.to_string());
                }
            }
            Some(Header::Script) => {
                if let Some(script) = cursor.next_line().filter(|s| fields::is_teleport_script(s)) {
                    event.script = Some(script.to_string());
                }
            }
            Some(Header::JoinLink) => {
                if let Some(link) = cursor.next_line() {
                    event.join_link = Some(link.to_string());
                }
            }
            None => {}
        }
    }

    event
}

/// Looks for a job id within the lines following a job-id header.
///
/// On a hit the cursor moves past the id, and past an identical id directly
/// after it (the Mobile/PC pair). On a miss the cursor stays just after the
/// header so the window's lines are still scanned normally.
fn take_job_id<'a>(cursor: &mut LineCursor<'a>) -> Option<&'a str> {
    let (offset, job_id) = (0..JOB_ID_WINDOW)
        .filter_map(|i| cursor.peek_at(i).map(|line| (i, line)))
        .find(|(_, line)| fields::is_job_id(line))?;

    cursor.advance(offset + 1);
    if cursor.peek() == Some(job_id) {
        cursor.advance(1);
    }
    Some(job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "8f4eee40-8091-45fd-86a2-14820a64c502";

    fn keyword(line: &str) -> Option<Header> {
        if line.contains("Name") {
            Some(Header::Name)
        } else if line.contains("Job ID") {
            Some(Header::JobId)
        } else if line.contains("Players") {
            Some(Header::Players)
        } else {
            None
        }
    }

    #[test]
    fn test_field_header_boundaries() {
        assert!(is_field_header("💰 Money per sec"));
        assert!(is_field_header("Join Script (PC)"));
        assert!(!is_field_header("La Karkerkar"));
        assert!(!is_field_header("Name"));
    }

    #[test]
    fn test_name_spans_lines_until_header() {
        let event = scan("Name\nLa Karkerkar\nCombinasion\nPlayers\n3/8", SourceDialect::Plain, keyword);
        assert_eq!(event.name.as_deref(), Some("La Karkerkar Combinasion"));
        assert_eq!(event.players.as_deref(), Some("3/8"));
    }

    #[test]
    fn test_job_id_window_and_duplicate_consumed() {
        let text = format!("Job ID (Mobile)\n{ID}\n{ID}\nPlayers\n4/8");
        let event = scan(&text, SourceDialect::Plain, keyword);
        assert_eq!(event.job_id.as_deref(), Some(ID));
        assert_eq!(event.players.as_deref(), Some("4/8"));

        let text = format!("Job ID\nfiller\nmore filler\n{ID}");
        let event = scan(&text, SourceDialect::Plain, keyword);
        assert_eq!(event.job_id.as_deref(), Some(ID));

        let text = format!("Job ID\na\nb\nc\n{ID}");
        let event = scan(&text, SourceDialect::Plain, keyword);
        assert_eq!(event.job_id, None);
    }

    #[test]
    fn test_header_without_value_does_not_loop() {
        let event = scan("Job ID\nJob ID\nPlayers", SourceDialect::Plain, keyword);
        assert!(event.is_empty());
    }

    #[test]
    fn test_players_without_slash_left_empty() {
        let event = scan("Players\nseven", SourceDialect::Plain, keyword);
        assert_eq!(event.players, None);
    }
}
