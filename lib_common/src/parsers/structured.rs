//! Structured-embed dialect: values live in embed fields, recognised by field
//! *name* against the configured pattern lists, so header wording can vary
//! between notifiers.

use super::fields;
use super::money;
use crate::configs::FieldPatterns;
use crate::model::{Embed, ServerEvent, SourceDialect};

fn matches_any(field_name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| field_name.contains(p.as_str()))
}

/// Parses every field of every embed, in order. A field is checked against all
/// categories, so one field may fill several; a later matching field overwrites
/// an earlier one.
pub fn parse(embeds: &[Embed], patterns: &FieldPatterns) -> ServerEvent {
    let mut event = ServerEvent::new(SourceDialect::Structured);

    for field in embeds.iter().flat_map(|e| e.fields.iter()) {
        let name = field.name.as_str();
        let value = field.value.trim();

        if matches_any(name, &patterns.name) {
            event.name = Some(value.to_string());
        }

        if matches_any(name, &patterns.money) {
            if let Some(reading) = money::normalize(&fields::strip_markdown(value)) {
                fields::set_money(&mut event, reading);
            }
        }

        if matches_any(name, &patterns.players) {
            let players = fields::strip_markdown(value);
            let players = players.trim();
            if fields::is_player_count(players) {
                event.players = Some(players.to_string());
            }
        }

        if matches_any(name, &patterns.job_id) {
            if let Some(job_id) = fields::find_job_id(&fields::strip_markdown(value)) {
                event.job_id = Some(job_id.to_string());
            }
        }

        if matches_any(name, &patterns.script) && fields::is_teleport_script(value) {
            event.script = Some(value.to_string());
            if event.job_id.is_none() {
                event.job_id = fields::find_job_id(value).map(str::to_string);
            }
        }

        if matches_any(name, &patterns.join_link) {
            event.join_link = Some(value.to_string());
        }
    }

    event
}
