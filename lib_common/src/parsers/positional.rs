//! Positional dialect.
//!
//! Layout, values by position rather than by inline label:
//!
//! ```text
//! Ice Hub Finder - Target Located
//! 8f4eee40-8091-45fd-86a2-14820a64c502
//! 5/18 | $1.2M/s | Tralalero Tralala
//! Server Info
//! Job ID:
//! 8f4eee40-8091-45fd-86a2-14820a64c502
//! Players:
//! 5
//! Total Income:
//! $1.2M/s
//! PC Script
//! game:GetService('TeleportService'):TeleportToPlaceInstance(...)
//! ```

use super::cursor::LineCursor;
use super::fields;
use super::money;
use crate::configs::PositionalConfig;
use crate::model::{ServerEvent, SourceDialect};

const SUMMARY_SEPARATOR: &str = " | ";
const SERVER_INFO: &str = "Server Info";

pub fn parse(content: &str, config: &PositionalConfig) -> ServerEvent {
    let mut cursor = LineCursor::new(content);
    let mut event = ServerEvent::new(SourceDialect::Positional);
    let mut header_id: Option<&str> = None;

    while let Some(line) = cursor.next_line() {
        if header_id.is_none() && fields::is_job_id(line) {
            header_id = Some(line);
            if let Some(summary) = cursor.peek().filter(|l| l.contains('/')) {
                read_summary(&mut event, summary);
                cursor.advance(1);
            }
        } else if line == SERVER_INFO {
            read_server_info(&mut event, &mut cursor, config);
        }
    }

    if event.job_id.is_none() {
        event.job_id = header_id.map(str::to_string);
    }

    event
}

/// `<players> | <income> | <name>`; `None` income and `Unknown` name are
/// placeholders and leave the field empty.
fn read_summary(event: &mut ServerEvent, summary: &str) {
    let parts: Vec<&str> = summary.split(SUMMARY_SEPARATOR).map(str::trim).collect();
    let [players, income, name, ..] = parts.as_slice() else {
        return;
    };

    if fields::is_player_count(players) {
        event.players = Some(players.to_string());
    }
    if *income != "None" {
        if let Some(reading) = money::normalize(income) {
            fields::set_money(event, reading);
        }
    }
    if *name != "Unknown" && !name.is_empty() {
        event.name = Some(name.to_string());
    }
}

/// Labelled block whose values sit on the line after each label. Values read
/// here take precedence over the summary line.
fn read_server_info(event: &mut ServerEvent, cursor: &mut LineCursor<'_>, config: &PositionalConfig) {
    while let Some(label) = cursor.next_line() {
        let Some(value) = cursor.peek() else {
            break;
        };

        if label.starts_with("Job ID:") {
            if fields::is_job_id(value) {
                event.job_id = Some(value.to_string());
            }
        } else if label.starts_with("Players:") {
            if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
                event.players = Some(format!("{}/{}", value, config.server_capacity));
            } else if fields::is_player_count(value) {
                event.players = Some(value.to_string());
            }
        } else if label.starts_with("Total Income:") {
            if let Some(reading) = money::normalize(value) {
                fields::set_money(event, reading);
            }
        } else if label.starts_with("PC Script") {
            if fields::is_teleport_script(value) {
                event.script = Some(value.to_string());
            }
        } else {
            continue;
        }

        cursor.advance(1);
    }
}

/// Synthesizes the rejoin script from the discovered job id when the message
/// carried none. Only ever applied to this dialect.
pub fn complete_script(event: &mut ServerEvent, config: &PositionalConfig) {
    if event.script.is_none() {
        if let Some(job_id) = event.job_id.as_deref() {
            event.script = Some(config.script_for(job_id));
        }
    }
}
