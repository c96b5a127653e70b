//! ICS document parsing.
//!
//! This module turns RFC 5545 text into raw event records.

mod parse;

pub use parse::parse_document;
