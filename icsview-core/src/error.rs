//! Error types for icsview.

use thiserror::Error;

/// Document-level failures. Any of these aborts the whole parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("No ICS content provided for parsing")]
    Empty,

    #[error("Failed to parse ICS data. It might be invalid or corrupted: {0}")]
    Malformed(String),
}

/// A single event's recurrence rule could not be parsed or evaluated.
///
/// Local to one event: the expander logs it and moves on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Could not evaluate RRULE: {0}")]
pub struct RuleError(pub String);

/// Result type alias for document parsing.
pub type ParseResult<T> = Result<T, ParseError>;
