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

//! Message text to segment tree
//!
//! Segments are split on `\r`, `\r\n` or `\n`; the encoding profile is read
//! from the MSH segment before any field splitting happens. Fields are split
//! into repetitions here, while component splitting is left to the model.

use crate::encoding::{Encoding, SegmentTerminator};
use crate::error::{Hl7Error, Result};
use crate::model::{Field, Segment};

/// Result of parsing message text
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedMessage {
    /// Segments in wire order
    pub segments: Vec<Segment>,
    /// Encoding profile read from the header, with the detected terminator
    pub encoding: Encoding,
    /// Whether the text ended with a segment terminator
    pub terminated: bool,
}

/// Parse raw message text
///
/// The first segment must be `MSH`. Empty lines are skipped.
pub fn parse_message(text: &str) -> Result<ParsedMessage> {
    let lines: Vec<&str> = text
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .collect();

    let Some(header) = lines.first() else {
        return Err(Hl7Error::parse_failure("no segments found"));
    };

    let encoding =
        Encoding::from_header(header)?.with_segment_terminator(SegmentTerminator::detect(text));

    let segments = lines
        .iter()
        .enumerate()
        .map(|(i, line)| parse_segment(line, i + 1, &encoding))
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "parsed {} segments using delimiters {:?}",
        segments.len(),
        encoding.delimiters()
    );

    Ok(ParsedMessage {
        segments,
        encoding,
        terminated: text.ends_with(['\r', '\n']),
    })
}

fn parse_segment(line: &str, number: usize, encoding: &Encoding) -> Result<Segment> {
    let separator = encoding.field_separator();
    let mut parts = line.split(separator);
    let name = parts.next().unwrap_or_default();
    if name.chars().count() < 3 {
        return Err(Hl7Error::parse_failure_at(
            number,
            format!("segment name '{name}' is shorter than 3 characters"),
        ));
    }

    if name == Segment::HEADER {
        return parse_header(line, encoding);
    }

    let fields = parts.map(|text| Field::new(text, *encoding)).collect();
    Ok(Segment::from_fields(name, fields, *encoding))
}

fn parse_header(line: &str, encoding: &Encoding) -> Result<Segment> {
    let separator = encoding.field_separator();
    let body = line
        .strip_prefix(Segment::HEADER)
        .and_then(|rest| rest.strip_prefix(separator))
        .ok_or_else(|| Hl7Error::malformed_header("MSH is not followed by the field separator"))?;

    let mut parts = body.split(separator);
    let encoding_characters = parts.next().unwrap_or_default();
    if encoding_characters.chars().count() < 4 {
        return Err(Hl7Error::malformed_header(format!(
            "encoding characters '{encoding_characters}' are shorter than 4 characters"
        )));
    }

    let mut fields = Segment::header_fields(encoding, encoding_characters);
    fields.extend(parts.map(|text| Field::new(text, *encoding)));
    Ok(Segment::from_fields(Segment::HEADER, fields, *encoding))
}
