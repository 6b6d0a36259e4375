use serde::{Deserialize, Serialize};

/// Canonical money rate (M/s) at or above which an event counts as high-value.
pub const HIGH_VALUE_THRESHOLD: f64 = 10.0;

/// Which dialect parser produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDialect {
    /// Embed fields matched by name.
    #[default]
    Structured,
    /// Keyword-labelled lines of plain text.
    Plain,
    /// Pictograph-labelled lines of plain text.
    Emoji,
    /// Vendor layout led by a bare UUID line.
    Positional,
}

impl SourceDialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceDialect::Structured => "structured",
            SourceDialect::Plain => "plain",
            SourceDialect::Emoji => "emoji",
            SourceDialect::Positional => "positional",
        }
    }
}

/// # Server Event
///
/// One discovered game server, normalized from whatever dialect announced it.
///
/// Field invariants, upheld by the parsers:
/// - `job_id` is a 36-character lowercase hex/hyphen token;
/// - `money_rate` is non-negative and expressed in M/s;
/// - `players` contains exactly one `/`.
///
/// The serialized form uses the same keys the HTTP pull endpoint has always
/// returned (`money`, `is_10m_plus`), so existing game clients keep working.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServerEvent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "money")]
    pub money_rate: Option<f64>,
    #[serde(default)]
    pub money_raw: Option<String>,
    #[serde(default)]
    pub players: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub join_link: Option<String>,
    #[serde(default, rename = "is_10m_plus")]
    pub is_high_value: bool,
    #[serde(default, rename = "source")]
    pub source_dialect: SourceDialect,
}

impl ServerEvent {
    pub fn new(source_dialect: SourceDialect) -> Self {
        Self {
            source_dialect,
            ..Default::default()
        }
    }

    /// True when the parser matched structurally but extracted nothing at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.money_rate.is_none()
            && self.money_raw.is_none()
            && self.players.is_none()
            && self.job_id.is_none()
            && self.script.is_none()
            && self.join_link.is_none()
    }

    /// Current player count, the part of `players` before the slash.
    ///
    /// `None` when players is absent or the numerator is not a number; filter rules
    /// treat that as "rule does not apply".
    pub fn player_count(&self) -> Option<u32> {
        let players = self.players.as_deref()?;
        let (current, _) = players.split_once('/')?;
        current.trim().parse().ok()
    }
}

/// Outcome of the filter chain. `reason` is only set on rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterVerdict {
    pub accepted: bool,
    pub reason: Option<String>,
}

impl FilterVerdict {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            accepted: false,
            reason: Some(reason.into()),
        }
    }
}
