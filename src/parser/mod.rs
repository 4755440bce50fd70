//! HL7 v2 text parsers
//!
//! This module turns raw message text into segments and parses the path
//! strings used to address values inside a message.

#![warn(missing_docs)]

pub mod message;
pub mod path;

pub use message::{ParsedMessage, parse_message};
pub use path::Hl7Path;

/// Parse an addressing path such as `PV1.7[2].3`
pub fn parse_path(input: &str) -> crate::error::Result<Hl7Path> {
    input.parse()
}
