//! Field-level extraction helpers shared by every dialect.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use super::money::Money;
use crate::model::{Embed, InboundMessage, ServerEvent, HIGH_VALUE_THRESHOLD};

/// Length of a job identifier (UUID shape).
pub const JOB_ID_LEN: usize = 36;

/// How many lines after a job-id header are searched for the identifier.
pub const JOB_ID_WINDOW: usize = 3;

fn is_job_id_char(c: char) -> bool {
    matches!(c, 'a'..='f' | '0'..='9' | '-')
}

/// True when `text` is exactly a 36-character lowercase hex/hyphen token.
pub fn is_job_id(text: &str) -> bool {
    text.len() == JOB_ID_LEN && text.chars().all(is_job_id_char)
}

/// First hex/hyphen run of exactly the job-id length, anywhere in `text`.
pub fn find_job_id(text: &str) -> Option<&str> {
    text.split(|c: char| !is_job_id_char(c))
        .find(|run| run.len() == JOB_ID_LEN)
}

/// Accepts only real rejoin invocations, not prose that follows a script header.
pub fn is_teleport_script(text: &str) -> bool {
    text.contains("TeleportService") || text.to_lowercase().contains("game:")
}

/// Removes markdown emphasis and code decoration from an embed value.
pub fn strip_markdown(text: &str) -> String {
    text.replace("```", "").replace("**", "").replace('`', "")
}

/// `current/max` shape: exactly one slash.
pub fn is_player_count(text: &str) -> bool {
    text.matches('/').count() == 1
}

/// Brings an event built outside the parsers back in line with what the
/// parsers produce: negative money, malformed job ids and player counts are
/// dropped, and the high-value flag is recomputed from the money rate.
pub fn sanitize_event(event: &mut ServerEvent) {
    if event.money_rate.is_some_and(|m| m.is_nan() || m < 0.0) {
        event.money_rate = None;
    }
    if event.job_id.as_deref().is_some_and(|id| !is_job_id(id)) {
        event.job_id = None;
    }
    if event.players.as_deref().is_some_and(|p| !is_player_count(p)) {
        event.players = None;
    }
    event.is_high_value = event.money_rate.is_some_and(|m| m >= HIGH_VALUE_THRESHOLD);
}

static INSTANCE_PARAM: OnceLock<Option<Regex>> = OnceLock::new();

fn instance_param() -> Option<&'static Regex> {
    INSTANCE_PARAM
        .get_or_init(|| Regex::new(r"gameInstanceId=([a-f0-9-]+)").ok())
        .as_ref()
}

/// Reads the `gameInstanceId` query parameter of a join link.
///
/// Links are usually proper URLs, but some notifiers post a bare fragment, so a
/// textual search backs up the URL parser. Only values of the job-id shape count.
pub fn game_instance_id(link: &str) -> Option<String> {
    let from_url = Url::parse(link.trim()).ok().and_then(|url| {
        url.query_pairs()
            .find(|(key, _)| key == "gameInstanceId")
            .map(|(_, value)| value.into_owned())
    });

    let candidate = match from_url {
        Some(value) => value,
        None => instance_param()?
            .captures(link)?
            .get(1)?
            .as_str()
            .to_string(),
    };

    is_job_id(&candidate).then_some(candidate)
}

/// Dialect-independent job-id recovery, applied after primary extraction:
/// first the join link's `gameInstanceId`, then the first job-id token found in
/// any embed field value.
pub fn recover_job_id(event: &mut ServerEvent, embeds: &[Embed]) {
    if event.job_id.is_none() {
        if let Some(link) = event.join_link.as_deref() {
            event.job_id = game_instance_id(link);
        }
    }

    if event.job_id.is_none() {
        event.job_id = InboundMessage::field_values(embeds)
            .map(strip_markdown)
            .find_map(|value| find_job_id(&value).map(str::to_string));
    }
}

/// Stores a normalized money reading on the event.
pub fn set_money(event: &mut ServerEvent, money: Money) {
    event.money_rate = Some(money.value);
    event.money_raw = Some(money.raw);
    event.is_high_value = money.is_high_value;
}
