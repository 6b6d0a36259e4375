//! # Filters
//!
//! Acceptance rules applied to parsed events before they are relayed.

pub mod engine;

pub use engine::FilterEngine;
