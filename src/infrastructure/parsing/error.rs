//! Parsing error re-export
//!
//! Parsers share the error type used for request validation.

pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
