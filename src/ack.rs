// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Acknowledgment messages and header construction

use crate::config::AckConfig;
use crate::error::{Hl7Error, Result};
use crate::model::{Field, Message, Segment};
use crate::temporal::long_date_with_fraction_of_second;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Acknowledgment code written to MSA.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AckCode {
    /// Application accept
    #[default]
    AA,
    /// Application error
    AE,
    /// Application reject
    AR,
    /// Commit accept
    CA,
    /// Commit error
    CE,
    /// Commit reject
    CR,
}

impl AckCode {
    /// The code as wire text
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AA => "AA",
            Self::AE => "AE",
            Self::AR => "AR",
            Self::CA => "CA",
            Self::CE => "CE",
            Self::CR => "CR",
        }
    }

    /// Check whether the code accepts the message
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::AA | Self::CA)
    }
}

impl fmt::Display for AckCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AckCode {
    type Err = Hl7Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "AA" => Ok(Self::AA),
            "AE" => Ok(Self::AE),
            "AR" => Ok(Self::AR),
            "CA" => Ok(Self::CA),
            "CE" => Ok(Self::CE),
            "CR" => Ok(Self::CR),
            _ => Err(Hl7Error::parse_failure(format!(
                "Invalid acknowledgment code: {s}"
            ))),
        }
    }
}

/// Header values for [`Message::add_segment_msh`]
///
/// Every value is wire text, so `ADT^A04` fills two components of MSH.9.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MshHeader {
    /// MSH.3
    pub sending_application: String,
    /// MSH.4
    pub sending_facility: String,
    /// MSH.5
    pub receiving_application: String,
    /// MSH.6
    pub receiving_facility: String,
    /// MSH.8
    pub security: String,
    /// MSH.9
    pub message_type: String,
    /// MSH.10
    pub message_control_id: String,
    /// MSH.11
    pub processing_id: String,
    /// MSH.12
    pub version: String,
}

impl Message {
    /// Build a header segment and put it at the front of the message
    ///
    /// MSH.7 is stamped with the current local time. An existing header is
    /// replaced.
    pub fn add_segment_msh(&mut self, header: &MshHeader) -> Result<()> {
        let encoding = *self.encoding();
        let timestamp = long_date_with_fraction_of_second(&chrono::Local::now().naive_local());

        let mut msh = Segment::new(Segment::HEADER, encoding);
        for (index, value) in [
            (3, header.sending_application.as_str()),
            (4, header.sending_facility.as_str()),
            (5, header.receiving_application.as_str()),
            (6, header.receiving_facility.as_str()),
            (7, timestamp.as_str()),
            (8, header.security.as_str()),
            (9, header.message_type.as_str()),
            (10, header.message_control_id.as_str()),
            (11, header.processing_id.as_str()),
            (12, header.version.as_str()),
        ] {
            msh.add_or_overwrite_value(value, Some(index))?;
        }
        self.add_or_overwrite_segment(msh, None)
    }

    /// Build an acknowledgment for this message
    ///
    /// Sender and receiver are swapped, the control id is echoed into MSH.10
    /// and MSA.2, and `error_text` (literal text) lands escaped in MSA.3.
    pub fn build_ack(
        &self,
        code: AckCode,
        error_text: Option<&str>,
        config: &AckConfig,
    ) -> Result<Message> {
        let source = self
            .default_segment(Segment::HEADER)
            .ok_or_else(|| Hl7Error::path_not_found(Segment::HEADER))?;
        let encoding = *self.encoding();
        let wire = |index: usize| source.field(index).map(Field::to_wire).unwrap_or_default();

        let mut message_type = encoding.encode(&config.message_type);
        if config.echo_trigger_event {
            let trigger = source.value_at(9, None, Some(2), None);
            if !trigger.is_empty() && !trigger.is_null() {
                message_type.push(encoding.component_separator());
                message_type.push_str(&encoding.encode(trigger.to_wire()));
            }
        }

        let control_id = wire(10);
        let header = MshHeader {
            sending_application: wire(5),
            sending_facility: wire(6),
            receiving_application: wire(3),
            receiving_facility: wire(4),
            security: String::new(),
            message_type,
            message_control_id: control_id.clone(),
            processing_id: wire(11),
            version: wire(12),
        };

        let mut ack = Message::with_encoding(encoding);
        ack.add_segment_msh(&header)?;

        let mut msa = Segment::new("MSA", encoding);
        msa.add_or_overwrite_value(code.as_str(), Some(1))?;
        msa.add_or_overwrite_value(&control_id, Some(2))?;
        if let Some(text) = error_text {
            msa.add_or_overwrite_value(&encoding.encode(text), Some(3))?;
        }
        ack.add_or_overwrite_segment(msa, None)?;

        log::debug!("built {code} acknowledgment for control id '{control_id}'");
        Ok(ack)
    }

    /// Build a positive acknowledgment (`AA`)
    pub fn get_ack(&self) -> Result<Message> {
        self.build_ack(AckCode::AA, None, &AckConfig::default())
    }

    /// Build a negative acknowledgment carrying an error text
    pub fn get_nack(&self, code: AckCode, error_text: &str) -> Result<Message> {
        self.build_ack(code, Some(error_text), &AckConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const SOURCE: &str = "MSH|^~\\&|SA|SF|RA|RF|20110613083617||ADT^A04|934576120110613083617|P|2.3\rPID|1\r";

    #[rstest]
    #[case("AA", AckCode::AA)]
    #[case("ae", AckCode::AE)]
    #[case(" AR ", AckCode::AR)]
    #[case("CR", AckCode::CR)]
    fn test_code_parsing(#[case] input: &str, #[case] expected: AckCode) {
        assert_eq!(input.parse::<AckCode>().unwrap(), expected);
    }

    #[test]
    fn test_code_rejects_unknown() {
        assert!("XX".parse::<AckCode>().is_err());
        assert!(AckCode::CA.is_accept());
        assert!(!AckCode::AE.is_accept());
    }

    #[test]
    fn test_add_segment_msh() {
        let mut message = Message::new();
        let header = MshHeader {
            sending_application: "test".into(),
            sending_facility: "sendingFacility".into(),
            message_type: "ADR^A19".into(),
            processing_id: "D".into(),
            version: "2.5".into(),
            ..MshHeader::default()
        };
        message.add_segment_msh(&header).unwrap();

        assert_eq!(message.segment_count(), 1);
        assert_eq!(message.get_value("MSH.1"), "|");
        assert_eq!(message.get_value("MSH.4"), "sendingFacility");
        assert_eq!(message.get_value("MSH.9.2"), "A19");
        assert_eq!(message.get_value("MSH.12"), "2.5");
        let stamp = message.get_value("MSH.7").into_string().unwrap();
        assert!(crate::temporal::parse_datetime(&stamp).is_some());
    }

    #[test]
    fn test_ack_swaps_endpoints() {
        let message = Message::parse(SOURCE).unwrap();
        let ack = message.get_ack().unwrap();

        assert_eq!(ack.get_value("MSH.3"), "RA");
        assert_eq!(ack.get_value("MSH.4"), "RF");
        assert_eq!(ack.get_value("MSH.5"), "SA");
        assert_eq!(ack.get_value("MSH.6"), "SF");
        assert_eq!(ack.get_value("MSH.9"), "ACK^A04");
        assert_eq!(ack.get_value("MSH.10"), "934576120110613083617");
        assert_eq!(ack.get_value("MSH.11"), "P");
        assert_eq!(ack.get_value("MSH.12"), "2.3");
        assert_eq!(ack.get_value("MSA.1"), "AA");
        assert_eq!(ack.get_value("MSA.2"), "934576120110613083617");
        assert_eq!(ack.get_value("MSA.3"), Value::Absent);
    }

    #[test]
    fn test_nack_escapes_error_text() {
        let message = Message::parse(SOURCE).unwrap();
        let nack = message.get_nack(AckCode::AR, "Bad PID|segment").unwrap();

        assert_eq!(nack.get_value("MSA.1"), "AR");
        assert_eq!(nack.get_value("MSA.3"), "Bad PID|segment");
        assert!(nack.serialize(false).contains("MSA|AR|934576120110613083617|Bad PID\\F\\segment"));
    }

    #[test]
    fn test_configured_message_type() {
        let message = Message::parse(SOURCE).unwrap();
        let config = AckConfig {
            message_type: "MCF".into(),
            echo_trigger_event: false,
        };
        let ack = message.build_ack(AckCode::CA, None, &config).unwrap();
        assert_eq!(ack.get_value("MSH.9"), "MCF");
        assert_eq!(ack.get_value("MSA.1"), "CA");
    }

    #[test]
    fn test_ack_without_header_fails() {
        let message = Message::new();
        assert!(matches!(
            message.get_ack(),
            Err(Hl7Error::PathNotFound { .. })
        ));
    }
}
