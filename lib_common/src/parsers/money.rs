//! Money normalization.
//!
//! Announcements print income in whatever magnitude suits them (`$600K/s`,
//! `1.2M`, `3B`). Everything is brought to one scale, millions per second, which
//! is the unit the filter thresholds are written in.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::HIGH_VALUE_THRESHOLD;

/// A normalized money reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Money {
    /// Value in canonical M/s units.
    pub value: f64,
    /// The text the value was read from, trimmed.
    pub raw: String,
    pub is_high_value: bool,
}

static AMOUNT: OnceLock<Option<Regex>> = OnceLock::new();

fn amount_pattern() -> Option<&'static Regex> {
    AMOUNT
        .get_or_init(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*([KMB]?)").ok())
        .as_ref()
}

/// Strips thousands separators, currency symbols and markdown decoration.
fn strip_decoration(text: &str) -> String {
    text.replace("**", "")
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '`'))
        .collect()
}

/// Normalizes a free-form money string.
///
/// Returns `None` when the text holds no numeric token at all, which is distinct
/// from an explicit zero (`"0/s"` normalizes to `0.0`). A trailing `/s` only
/// marks the value as a rate and does not change the scale.
pub fn normalize(text: &str) -> Option<Money> {
    let raw = text.trim();
    if raw.is_empty() {
        return None;
    }

    let cleaned = strip_decoration(raw);
    let caps = amount_pattern()?.captures(&cleaned)?;
    let mut value: f64 = caps.get(1)?.as_str().parse().ok()?;

    match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()).as_deref() {
        Some("K") => value /= 1000.0,
        Some("B") => value *= 1000.0,
        _ => {}
    }

    Some(Money {
        value,
        raw: raw.to_string(),
        is_high_value: value >= HIGH_VALUE_THRESHOLD,
    })
}
