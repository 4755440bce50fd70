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

//! Codec configuration
//!
//! All settings have working defaults, so a configuration file only needs to
//! name the values it changes.

use crate::encoding::SegmentTerminator;
use serde::{Deserialize, Serialize};

/// Options controlling message serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializeOptions {
    /// Drop empty trailing fields from each segment
    pub compact: bool,
    /// Segment terminator to write; the message's own terminator when unset
    pub segment_terminator: Option<SegmentTerminator>,
}

impl SerializeOptions {
    /// Options with compaction enabled
    pub fn compact() -> Self {
        Self {
            compact: true,
            ..Self::default()
        }
    }

    /// Force a segment terminator
    pub fn with_segment_terminator(mut self, terminator: SegmentTerminator) -> Self {
        self.segment_terminator = Some(terminator);
        self
    }
}

/// Options controlling acknowledgment construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AckConfig {
    /// Message type written to MSH.9.1 of the acknowledgment
    pub message_type: String,
    /// Copy the trigger event (MSH.9.2) of the original message
    pub echo_trigger_event: bool,
}

impl Default for AckConfig {
    fn default() -> Self {
        Self {
            message_type: "ACK".to_string(),
            echo_trigger_event: true,
        }
    }
}

/// Top-level codec configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Hl7Config {
    /// Serialization settings
    pub serialize: SerializeOptions,
    /// Acknowledgment settings
    pub ack: AckConfig,
}

impl Hl7Config {
    /// Load a configuration from JSON text
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
