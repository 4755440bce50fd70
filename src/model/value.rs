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

//! Three-state leaf value

use crate::encoding::Encoding;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Leaf value of an HL7 message
///
/// HL7 distinguishes an element that was never sent from one that was sent
/// empty and from one that was sent as the explicit null `""`. Collapsing these
/// into an optional string loses information on the way back to the wire, so
/// they are kept apart here. Empty text is `Present("")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Value {
    /// The element does not exist in the message
    #[default]
    Absent,

    /// The element was sent as the explicit null marker `""`
    Null,

    /// The element carries text, possibly empty
    Present(String),
}

impl Value {
    /// Build a value from wire text, recognizing the null marker
    pub fn from_wire(text: &str) -> Self {
        if text == Encoding::NULL_MARKER {
            Self::Null
        } else {
            Self::Present(text.to_string())
        }
    }

    /// Render the value as wire text
    pub fn to_wire(&self) -> &str {
        match self {
            Self::Absent => "",
            Self::Null => Encoding::NULL_MARKER,
            Self::Present(text) => text,
        }
    }

    /// Turn stored wire text into the text a caller reads
    pub fn decoded(&self, encoding: &Encoding) -> Self {
        match self {
            Self::Present(text) => Self::Present(encoding.decode(text)),
            other => other.clone(),
        }
    }

    /// Text view of the value
    ///
    /// Absent values read as empty text, explicit nulls as `None`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Absent => Some(""),
            Self::Null => None,
            Self::Present(text) => Some(text),
        }
    }

    /// Take the text out of the value, with the same rules as [`Value::as_str`]
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::Absent => Some(String::new()),
            Self::Null => None,
            Self::Present(text) => Some(text),
        }
    }

    /// Check whether the element was never present
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Check whether the element is the explicit null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check whether the element carries no text (absent or empty)
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Null => false,
            Self::Present(text) => text.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_wire())
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::Present(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::Present(text)
    }
}

impl From<Option<String>> for Value {
    fn from(text: Option<String>) -> Self {
        text.map_or(Self::Null, Self::Present)
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}
