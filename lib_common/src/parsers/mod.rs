//! # Dialect Parsers
//!
//! Discovery announcements arrive in four layouts. [`parse_message`] picks one
//! with the [`selector`], runs that dialect's parser, applies the shared job-id
//! recovery and reports [`ParseFailure`] when nothing usable came out.

use std::fmt;

use thiserror::Error;

use crate::configs::RelayConfig;
use crate::model::{InboundMessage, ServerEvent, SourceDialect};

pub mod cursor;
pub mod emoji;
pub mod fields;
pub mod labelled;
pub mod money;
pub mod plain;
pub mod positional;
pub mod selector;
pub mod structured;

pub use money::{normalize, Money};
pub use selector::SelectedContent;

/// The closed set of message layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialectKind {
    Structured,
    Plain,
    Emoji,
    Positional,
}

impl DialectKind {
    pub fn source(&self) -> SourceDialect {
        match self {
            DialectKind::Structured => SourceDialect::Structured,
            DialectKind::Plain => SourceDialect::Plain,
            DialectKind::Emoji => SourceDialect::Emoji,
            DialectKind::Positional => SourceDialect::Positional,
        }
    }

    /// Runs this dialect's parser over the selected content.
    pub fn parse(&self, selected: &SelectedContent<'_>, config: &RelayConfig) -> ServerEvent {
        match self {
            DialectKind::Structured => structured::parse(selected.embeds, &config.patterns),
            DialectKind::Plain => plain::parse(selected.content),
            DialectKind::Emoji => emoji::parse(selected.content),
            DialectKind::Positional => positional::parse(selected.content, &config.positional),
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source().as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("no dialect matched the message")]
    NoDialect,

    #[error("{0} dialect matched but extracted no fields")]
    EmptyEvent(DialectKind),
}

/// Reduces one inbound message to a [`ServerEvent`].
pub fn parse_message(message: &InboundMessage, config: &RelayConfig) -> Result<ServerEvent, ParseFailure> {
    let selected = selector::rescue(message);
    let kind = selector::select(&selected, &config.positional).ok_or(ParseFailure::NoDialect)?;

    let mut event = kind.parse(&selected, config);
    fields::recover_job_id(&mut event, selected.embeds);
    if kind == DialectKind::Positional {
        positional::complete_script(&mut event, &config.positional);
    }

    if event.is_empty() {
        return Err(ParseFailure::EmptyEvent(kind));
    }
    Ok(event)
}
