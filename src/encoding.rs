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

//! Delimiter profile and escape-sequence codec
//!
//! Every HL7 v2 message declares its own delimiters in the MSH segment. The
//! [`Encoding`] captures those characters and knows how to escape reserved
//! characters inside a value and how to turn escape sequences back into text.

use crate::error::{Hl7Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Line ending used between segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SegmentTerminator {
    /// Carriage return, the HL7 standard terminator
    #[default]
    Cr,
    /// Carriage return followed by line feed
    CrLf,
    /// Bare line feed
    Lf,
}

impl SegmentTerminator {
    /// The terminator as wire text
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cr => "\r",
            Self::CrLf => "\r\n",
            Self::Lf => "\n",
        }
    }

    /// Detect the terminator used by raw message text
    ///
    /// The first line break found wins. Text without any line break yields
    /// the standard carriage return.
    pub fn detect(text: &str) -> Self {
        match text.find(['\r', '\n']) {
            Some(pos) if text[pos..].starts_with("\r\n") => Self::CrLf,
            Some(pos) if text[pos..].starts_with('\n') => Self::Lf,
            _ => Self::Cr,
        }
    }
}

impl fmt::Display for SegmentTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cr => write!(f, "cr"),
            Self::CrLf => write!(f, "crlf"),
            Self::Lf => write!(f, "lf"),
        }
    }
}

impl FromStr for SegmentTerminator {
    type Err = Hl7Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cr" | "\r" => Ok(Self::Cr),
            "crlf" | "\r\n" => Ok(Self::CrLf),
            "lf" | "\n" => Ok(Self::Lf),
            _ => Err(Hl7Error::parse_failure(format!(
                "Invalid segment terminator: {s}"
            ))),
        }
    }
}

/// Delimiter and escape characters of one message
///
/// The profile is fixed once derived: it is read from the MSH segment when
/// parsing, or defaults to `|^~\&` for freshly built messages. It is `Copy` and
/// carried by value through every element constructor, so no element ever
/// depends on ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Encoding {
    field_separator: char,
    component_separator: char,
    repetition_separator: char,
    escape_character: char,
    subcomponent_separator: char,
    segment_terminator: SegmentTerminator,
}

impl Default for Encoding {
    fn default() -> Self {
        Self {
            field_separator: '|',
            component_separator: '^',
            repetition_separator: '~',
            escape_character: '\\',
            subcomponent_separator: '&',
            segment_terminator: SegmentTerminator::Cr,
        }
    }
}

impl Encoding {
    /// Wire marker of an explicit null value
    pub const NULL_MARKER: &'static str = "\"\"";

    /// Create a profile from explicit delimiters
    ///
    /// Fails when any two of the five characters coincide or when one of them
    /// is a line break.
    pub fn new(
        field_separator: char,
        component_separator: char,
        repetition_separator: char,
        escape_character: char,
        subcomponent_separator: char,
    ) -> Result<Self> {
        let encoding = Self {
            field_separator,
            component_separator,
            repetition_separator,
            escape_character,
            subcomponent_separator,
            segment_terminator: SegmentTerminator::Cr,
        };
        encoding.validate()?;
        Ok(encoding)
    }

    /// Derive the profile from the MSH segment text
    ///
    /// Reads the character right after `MSH` as the field separator and the
    /// next four as component, repetition, escape and sub-component
    /// characters, in that fixed order.
    pub fn from_header(text: &str) -> Result<Self> {
        if !text.starts_with("MSH") {
            return Err(Hl7Error::malformed_header(
                "header segment must start with MSH",
            ));
        }
        let mut chars = text.chars().skip(3);
        let mut next = |what: &str| {
            chars.next().ok_or_else(|| {
                Hl7Error::malformed_header(format!("header too short: missing {what}"))
            })
        };
        let field_separator = next("field separator")?;
        let component_separator = next("component separator")?;
        let repetition_separator = next("repetition separator")?;
        let escape_character = next("escape character")?;
        let subcomponent_separator = next("sub-component separator")?;

        let encoding = Self {
            field_separator,
            component_separator,
            repetition_separator,
            escape_character,
            subcomponent_separator,
            segment_terminator: SegmentTerminator::detect(text),
        };
        encoding.validate()?;
        Ok(encoding)
    }

    fn validate(&self) -> Result<()> {
        let chars = self.delimiters();
        for (i, c) in chars.iter().enumerate() {
            if *c == '\r' || *c == '\n' {
                return Err(Hl7Error::malformed_header(
                    "line breaks cannot be used as delimiters",
                ));
            }
            if chars[i + 1..].contains(c) {
                return Err(Hl7Error::malformed_header(format!(
                    "delimiter '{c}' is declared more than once"
                )));
            }
        }
        Ok(())
    }

    /// Return a copy using another segment terminator
    pub fn with_segment_terminator(mut self, terminator: SegmentTerminator) -> Self {
        self.segment_terminator = terminator;
        self
    }

    /// Field separator (`|` by default)
    pub fn field_separator(&self) -> char {
        self.field_separator
    }

    /// Component separator (`^` by default)
    pub fn component_separator(&self) -> char {
        self.component_separator
    }

    /// Repetition separator (`~` by default)
    pub fn repetition_separator(&self) -> char {
        self.repetition_separator
    }

    /// Escape character (`\` by default)
    pub fn escape_character(&self) -> char {
        self.escape_character
    }

    /// Sub-component separator (`&` by default)
    pub fn subcomponent_separator(&self) -> char {
        self.subcomponent_separator
    }

    /// Segment terminator
    pub fn segment_terminator(&self) -> SegmentTerminator {
        self.segment_terminator
    }

    /// The five delimiter characters, field separator first
    pub fn delimiters(&self) -> [char; 5] {
        [
            self.field_separator,
            self.component_separator,
            self.repetition_separator,
            self.escape_character,
            self.subcomponent_separator,
        ]
    }

    /// The four encoding characters as they appear in MSH-2
    pub fn encoding_characters(&self) -> String {
        [
            self.component_separator,
            self.repetition_separator,
            self.escape_character,
            self.subcomponent_separator,
        ]
        .iter()
        .collect()
    }

    fn escape_code(&self, c: char) -> Option<char> {
        match c {
            c if c == self.field_separator => Some('F'),
            c if c == self.component_separator => Some('S'),
            c if c == self.repetition_separator => Some('R'),
            c if c == self.escape_character => Some('E'),
            c if c == self.subcomponent_separator => Some('T'),
            _ => None,
        }
    }

    fn unescape_code(&self, code: &str) -> Option<char> {
        match code {
            "F" => Some(self.field_separator),
            "S" => Some(self.component_separator),
            "R" => Some(self.repetition_separator),
            "E" => Some(self.escape_character),
            "T" => Some(self.subcomponent_separator),
            _ => None,
        }
    }

    /// Escape every reserved character of `raw`
    ///
    /// Reserved characters become `\F\`, `\S\`, `\R\`, `\E\` and `\T\`, using
    /// the configured escape character around the fixed letter codes. Every
    /// other character, tabs and line breaks included, is copied unchanged.
    pub fn encode(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for c in raw.chars() {
            match self.escape_code(c) {
                Some(code) => {
                    out.push(self.escape_character);
                    out.push(code);
                    out.push(self.escape_character);
                }
                None => out.push(c),
            }
        }
        out
    }

    /// Turn escape sequences back into text
    ///
    /// Delimiter sequences map back to their characters and `\Xhh..\` hex
    /// sequences to the UTF-8 text they encode. Anything else, including an
    /// escape character without a closing partner, passes through unchanged.
    pub fn decode(&self, escaped: &str) -> String {
        let esc = self.escape_character;
        if !escaped.contains(esc) {
            return escaped.to_string();
        }

        let mut out = String::with_capacity(escaped.len());
        let mut rest = escaped;
        while let Some(start) = rest.find(esc) {
            out.push_str(&rest[..start]);
            let after = &rest[start + esc.len_utf8()..];
            let Some(end) = after.find(esc) else {
                out.push_str(&rest[start..]);
                return out;
            };

            let code = &after[..end];
            match self.decode_sequence(code) {
                Some(text) => out.push_str(&text),
                None => {
                    out.push(esc);
                    out.push_str(code);
                    out.push(esc);
                }
            }
            rest = &after[end + esc.len_utf8()..];
        }
        out.push_str(rest);
        out
    }

    fn decode_sequence(&self, code: &str) -> Option<String> {
        if let Some(c) = self.unescape_code(code) {
            return Some(c.to_string());
        }
        let digits = code.strip_prefix('X')?;
        if digits.is_empty() {
            return None;
        }
        let bytes = hex::decode(digits).ok()?;
        String::from_utf8(bytes).ok()
    }

    /// Whether `text` contains a character that must be escaped
    pub fn needs_escaping(&self, text: &str) -> bool {
        text.chars().any(|c| self.escape_code(c).is_some())
    }
}
