//! HL7 v2 message codec in Rust
//!
//! Parses pipe-delimited HL7 v2 messages into a tree of segments, fields,
//! repetitions, components and sub-components, and serializes the tree back
//! into the same wire text. Values are addressed with paths such as
//! `PID.5.1` or `PV1.7[2].3`.
//!
//! ```
//! use octofhir_hl7::Message;
//!
//! let text = "MSH|^~\\&|SA|SF|RA|RF|20110613083617||ADT^A04|123|P|2.7\rPID|1||42^^^MRN\r";
//! let mut message = Message::parse(text).unwrap();
//! assert_eq!(message.get_value("MSH.9.2"), "A04");
//!
//! message.set_value("PID.3.4", "HOSP").unwrap();
//! assert_eq!(message.get_value("PID.3"), "42^^^HOSP");
//! ```

#![warn(missing_docs)]

pub mod ack;
pub mod config;
pub mod encoding;
pub mod error;
pub mod model;
pub mod parser;
pub mod temporal;

// Re-export main types
pub use ack::{AckCode, MshHeader};
pub use config::{AckConfig, Hl7Config, SerializeOptions};
pub use encoding::{Encoding, SegmentTerminator};
pub use error::{Hl7Error, Result};
pub use model::{Component, Field, Message, Repetition, Segment, Value};
pub use parser::{Hl7Path, parse_path};
pub use temporal::{Hl7Timestamp, TemporalPrecision, parse_timestamp};
