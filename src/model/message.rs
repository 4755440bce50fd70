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

//! HL7 v2 message container
//!
//! A [`Message`] owns its segments and the [`Encoding`] declared by its header.
//! It is a plain single-owner value: messages share no state, so independent
//! messages can be handled on independent threads.

use super::MAX_INDEX;
use super::segment::Segment;
use super::value::Value;
use crate::config::SerializeOptions;
use crate::encoding::Encoding;
use crate::error::{Hl7Error, Result};
use crate::parser::{Hl7Path, parse_message};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An HL7 v2 message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    segments: Vec<Segment>,
    encoding: Encoding,
    /// Whether the last segment is followed by a terminator on the wire
    terminated: bool,
    /// Text waiting for [`Message::parse_message`]
    #[serde(skip)]
    pending: Option<String>,
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

impl Message {
    /// Create an empty outbound message with the default encoding
    pub fn new() -> Self {
        Self::with_encoding(Encoding::default())
    }

    /// Create an empty message using the given encoding
    pub fn with_encoding(encoding: Encoding) -> Self {
        Self {
            segments: Vec::new(),
            encoding,
            terminated: true,
            pending: None,
        }
    }

    /// Create a message holding raw text to be parsed on demand
    ///
    /// The message has no segments until [`Message::parse_message`] succeeds.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            pending: Some(text.into()),
            ..Self::new()
        }
    }

    /// Parse raw text into a message
    pub fn parse(text: &str) -> Result<Self> {
        let mut message = Self::new();
        message.load(text)?;
        Ok(message)
    }

    /// Parse the text supplied to [`Message::from_text`]
    ///
    /// On failure the message holds no segments and must not be queried.
    pub fn parse_message(&mut self) -> Result<()> {
        let text = self
            .pending
            .take()
            .ok_or_else(|| Hl7Error::parse_failure("no message text to parse"))?;
        self.load(&text)
    }

    fn load(&mut self, text: &str) -> Result<()> {
        self.segments.clear();
        let parsed = parse_message(text)?;
        self.segments = parsed.segments;
        self.encoding = parsed.encoding;
        self.terminated = parsed.terminated;
        Ok(())
    }

    /// Encoding profile of this message
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// All segments in wire order
    pub fn all_segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// All segments with the given name, in wire order
    pub fn segments(&self, name: &str) -> Vec<&Segment> {
        self.segments.iter().filter(|s| s.name() == name).collect()
    }

    /// Mutable access to all segments with the given name
    pub fn segments_mut(&mut self, name: &str) -> Vec<&mut Segment> {
        self.segments
            .iter_mut()
            .filter(|s| s.name() == name)
            .collect()
    }

    /// The `occurrence`-th segment (0-based) with the given name
    pub fn segment(&self, name: &str, occurrence: usize) -> Option<&Segment> {
        self.segments
            .iter()
            .filter(|s| s.name() == name)
            .nth(occurrence)
    }

    /// Mutable access to the `occurrence`-th segment with the given name
    pub fn segment_mut(&mut self, name: &str, occurrence: usize) -> Option<&mut Segment> {
        self.segments
            .iter_mut()
            .filter(|s| s.name() == name)
            .nth(occurrence)
    }

    /// First segment with the given name
    pub fn default_segment(&self, name: &str) -> Option<&Segment> {
        self.segment(name, 0)
    }

    /// Mutable access to the first segment with the given name
    pub fn default_segment_mut(&mut self, name: &str) -> Option<&mut Segment> {
        self.segment_mut(name, 0)
    }

    fn positions_of(&self, name: &str) -> Vec<usize> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.name() == name)
            .map(|(i, _)| i)
            .collect()
    }

    /// Add a segment or overwrite an occurrence of its name
    ///
    /// `index` counts occurrences of the segment's name (0-based). An existing
    /// occurrence is replaced in place; a missing one is reached by appending
    /// empty segments of that name first. Without an index the segment is
    /// appended. The header segment always goes first, replacing any header
    /// already present.
    pub fn add_or_overwrite_segment(&mut self, segment: Segment, index: Option<usize>) -> Result<()> {
        if segment.is_header() {
            if let Some(index) = index.filter(|&i| i > 0) {
                return Err(Hl7Error::invalid_index(
                    index,
                    "a message has a single header segment",
                ));
            }
            match self.segments.first() {
                Some(first) if first.is_header() => self.segments[0] = segment,
                _ => self.segments.insert(0, segment),
            }
            return Ok(());
        }

        let positions = self.positions_of(segment.name());
        match index {
            Some(occurrence) if occurrence < positions.len() => {
                self.segments[positions[occurrence]] = segment;
            }
            Some(occurrence) if occurrence >= MAX_INDEX => {
                return Err(Hl7Error::invalid_index(
                    occurrence,
                    format!("segment occurrences are limited to {MAX_INDEX}"),
                ));
            }
            Some(occurrence) => {
                for _ in positions.len()..occurrence {
                    self.segments
                        .push(Segment::new(segment.name(), *segment.encoding()));
                }
                self.segments.push(segment);
            }
            None => self.segments.push(segment),
        }
        Ok(())
    }

    /// Remove segments by name
    ///
    /// With an index only that occurrence (0-based) is removed; without one,
    /// every segment of that name is. Returns the number of segments removed.
    pub fn remove_segment(&mut self, name: &str, index: Option<usize>) -> Result<usize> {
        match index {
            Some(occurrence) => {
                let position = self
                    .positions_of(name)
                    .get(occurrence)
                    .copied()
                    .ok_or_else(|| Hl7Error::path_not_found(format!("{name}({occurrence})")))?;
                self.segments.remove(position);
                Ok(1)
            }
            None => {
                let before = self.segments.len();
                self.segments.retain(|s| s.name() != name);
                Ok(before - self.segments.len())
            }
        }
    }

    /// Resolve a path, failing when its segment does not exist
    pub fn value(&self, path: &str) -> Result<Value> {
        let path: Hl7Path = path.parse()?;
        self.resolve(&path)
    }

    /// Resolve a parsed path, failing when its segment does not exist
    pub fn resolve(&self, path: &Hl7Path) -> Result<Value> {
        let segment = self
            .segment(&path.segment, path.segment_index)
            .ok_or_else(|| Hl7Error::path_not_found(path.to_string()))?;
        Ok(segment.value_at(
            path.field,
            path.repetition,
            path.component,
            path.subcomponent,
        ))
    }

    /// Read a path leniently
    ///
    /// Unknown segments and malformed paths read as [`Value::Absent`], since
    /// optional content is the common case in real-world messages.
    pub fn get_value(&self, path: &str) -> Value {
        match self.value(path) {
            Ok(value) => value,
            Err(err @ Hl7Error::PathNotFound { .. }) => {
                log::debug!("{err}");
                Value::Absent
            }
            Err(err) => {
                log::warn!("{err}");
                Value::Absent
            }
        }
    }

    /// Store wire text at a path
    ///
    /// The text is stored verbatim, so reserved characters it contains act as
    /// delimiters; pass literal text through [`Encoding::encode`] first. The
    /// addressed segment must exist; everything below it is created on demand.
    pub fn set_value(&mut self, path: &str, text: &str) -> Result<()> {
        let path: Hl7Path = path.parse()?;
        let segment = self
            .segment_mut(&path.segment, path.segment_index)
            .ok_or_else(|| Hl7Error::path_not_found(path.to_string()))?;
        segment.set_value_at(
            path.field,
            path.repetition,
            path.component,
            path.subcomponent,
            text,
        )
    }

    /// Check whether a path resolves to a non-empty value
    pub fn has_value(&self, path: &str) -> bool {
        !self.get_value(path).is_empty()
    }

    /// Render the message as wire text
    ///
    /// With `compact` set, empty trailing fields of each segment are dropped.
    pub fn serialize(&self, compact: bool) -> String {
        self.serialize_with(&SerializeOptions {
            compact,
            ..SerializeOptions::default()
        })
    }

    /// Render the message as wire text with explicit options
    pub fn serialize_with(&self, options: &SerializeOptions) -> String {
        let terminator = options
            .segment_terminator
            .unwrap_or_else(|| self.encoding.segment_terminator())
            .as_str();

        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                out.push_str(terminator);
            }
            segment.write_wire(&mut out, options.compact);
        }
        if self.terminated && !self.segments.is_empty() {
            out.push_str(terminator);
        }
        log::debug!(
            "serialized {} segments into {} bytes",
            self.segments.len(),
            out.len()
        );
        out
    }
}

impl FromStr for Message {
    type Err = Hl7Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "MSH|^~\\&|SA|SF|RA|RF|20110613083617||ADT^A04|123|P|2.7\rPID|1||42^^^MRN||DOE^JOHN\rNK1|1|DOE^JANE\rNK1|2|DOE^JIM\r";

    #[test]
    fn test_parse_on_demand() {
        let mut message = Message::from_text(SAMPLE);
        assert_eq!(message.segment_count(), 0);
        message.parse_message().unwrap();
        assert_eq!(message.segment_count(), 4);
        assert!(message.parse_message().is_err());
    }

    #[test]
    fn test_segment_queries() {
        let message = Message::parse(SAMPLE).unwrap();
        assert_eq!(message.segments("NK1").len(), 2);
        assert_eq!(message.default_segment("NK1").unwrap().value(1), "1");
        assert_eq!(message.segment("NK1", 1).unwrap().value(1), "2");
        assert!(message.segment("NK1", 2).is_none());
        assert!(message.default_segment("OBX").is_none());
    }

    #[test]
    fn test_strict_and_lenient_reads() {
        let message = Message::parse(SAMPLE).unwrap();
        assert_eq!(message.value("NK1(1).2.2").unwrap(), "JIM");
        assert!(matches!(
            message.value("OBX.5"),
            Err(Hl7Error::PathNotFound { .. })
        ));
        assert!(matches!(
            message.value("PID"),
            Err(Hl7Error::InvalidPath { .. })
        ));
        assert_eq!(message.get_value("OBX.5"), Value::Absent);
        assert_eq!(message.get_value("PID.30"), Value::Absent);
        assert!(message.has_value("PID.3.4"));
        assert!(!message.has_value("PID.2"));
    }

    #[test]
    fn test_set_value() {
        let mut message = Message::parse(SAMPLE).unwrap();
        message.set_value("PID.5.3", "Q").unwrap();
        assert_eq!(message.get_value("PID.5"), "DOE^JOHN^Q");
        message.set_value("NK1(1).2", "\"\"").unwrap();
        assert_eq!(message.get_value("NK1(1).2"), Value::Null);
        assert!(message.set_value("OBX.1", "1").is_err());
        assert!(message.set_value("MSH.2", "^~\\#").is_err());
    }

    #[test]
    fn test_add_segment_by_occurrence() {
        let mut message = Message::parse(SAMPLE).unwrap();
        let encoding = *message.encoding();

        let mut replacement = Segment::new("NK1", encoding);
        replacement.add_or_overwrite_value("9", None).unwrap();
        message
            .add_or_overwrite_segment(replacement.clone(), Some(1))
            .unwrap();
        assert_eq!(message.segments("NK1").len(), 2);
        assert_eq!(message.get_value("NK1(1).1"), "9");

        message.add_or_overwrite_segment(replacement, Some(3)).unwrap();
        assert_eq!(message.segments("NK1").len(), 4);
        assert_eq!(message.get_value("NK1(2).1"), Value::Absent);
    }

    #[test]
    fn test_occurrence_limit() {
        let mut message = Message::parse(SAMPLE).unwrap();
        let segment = Segment::new("ZZZ", *message.encoding());
        assert!(matches!(
            message.add_or_overwrite_segment(segment, Some(usize::MAX)),
            Err(Hl7Error::InvalidIndex { .. })
        ));
        assert_eq!(message.segment_count(), 4);
    }

    #[test]
    fn test_header_segment_goes_first() {
        let mut message = Message::new();
        message
            .add_or_overwrite_segment(Segment::new("PID", Encoding::default()), None)
            .unwrap();
        message
            .add_or_overwrite_segment(Segment::new("MSH", Encoding::default()), None)
            .unwrap();
        assert_eq!(message.all_segments()[0].name(), "MSH");
        assert_eq!(message.serialize(false), "MSH|^~\\&\rPID\r");
        assert!(
            message
                .add_or_overwrite_segment(Segment::new("MSH", Encoding::default()), Some(1))
                .is_err()
        );
    }

    #[test]
    fn test_remove_segment() {
        let mut message = Message::parse(SAMPLE).unwrap();
        assert_eq!(message.remove_segment("NK1", Some(1)).unwrap(), 1);
        assert_eq!(message.segments("NK1").len(), 1);
        assert!(message.remove_segment("NK1", Some(5)).is_err());
        assert_eq!(message.remove_segment("NK1", None).unwrap(), 1);
        assert_eq!(message.segments("NK1").len(), 0);
    }

    #[test]
    fn test_round_trip_and_display() {
        let message: Message = SAMPLE.parse().unwrap();
        assert_eq!(message.serialize(false), SAMPLE);
        assert_eq!(message.to_string(), SAMPLE);
    }
}
