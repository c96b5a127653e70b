//! Core of the icsview calendar viewer.
//!
//! This crate turns an iCalendar document into a bounded, timezone-normalized
//! list of event occurrences:
//! - `ics` parses document text into raw event records
//! - `recurrence` expands each record (RRULE instances bounded by an
//!   `ExpansionWindow`) and normalizes it into the target timezone
//!
//! Fetching documents and rendering occurrences are left to the caller.

pub mod error;
pub mod event;
pub mod ics;
pub mod recurrence;
pub mod timezone;
pub mod window;

pub use error::{ParseError, RuleError};
pub use event::*;
pub use ics::parse_document;
pub use recurrence::{expand_all, expand_occurrences};
pub use window::ExpansionWindow;

// Re-exported so callers name zones with the same type the core uses
pub use chrono_tz::Tz;
