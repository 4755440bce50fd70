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

//! Addressing paths
//!
//! Grammar:
//!
//! ```text
//! segment    := 3 or more ASCII letters or digits
//! path       := segment [index] "." field [index] ["." component ["." subcomponent]]
//! index      := "(" digits ")" | "[" digits "]"
//! ```
//!
//! The index after the segment name picks among same-named segments and is
//! 0-based. The index after the field picks a repetition and is 1-based.

use crate::error::{Hl7Error, Result};
use nom::{
    IResult, Parser,
    branch::alt,
    character::complete::{alphanumeric1, char, digit1},
    combinator::{all_consuming, map_res, opt, verify},
    sequence::{delimited, preceded},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A parsed addressing path such as `PV1.7[2].3`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hl7Path {
    /// Segment name
    pub segment: String,
    /// Occurrence among segments with the same name (0-based)
    pub segment_index: usize,
    /// Field index (1-based)
    pub field: usize,
    /// Repetition index (1-based); `None` addresses the whole field
    pub repetition: Option<usize>,
    /// Component index (1-based)
    pub component: Option<usize>,
    /// Sub-component index (1-based), only meaningful with a component
    pub subcomponent: Option<usize>,
}

impl Hl7Path {
    /// Path to a whole field of the first segment with the given name
    pub fn field(segment: impl Into<String>, field: usize) -> Self {
        Self {
            segment: segment.into(),
            segment_index: 0,
            field,
            repetition: None,
            component: None,
            subcomponent: None,
        }
    }

    /// Select a segment occurrence
    pub fn with_segment_index(mut self, index: usize) -> Self {
        self.segment_index = index;
        self
    }

    /// Select a repetition
    pub fn with_repetition(mut self, repetition: usize) -> Self {
        self.repetition = Some(repetition);
        self
    }

    /// Select a component
    pub fn with_component(mut self, component: usize) -> Self {
        self.component = Some(component);
        self
    }

    /// Select a sub-component
    pub fn with_subcomponent(mut self, subcomponent: usize) -> Self {
        self.subcomponent = Some(subcomponent);
        self
    }
}

fn number(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |digits: &str| digits.parse::<usize>()).parse(input)
}

fn index(input: &str) -> IResult<&str, usize> {
    alt((
        delimited(char('('), number, char(')')),
        delimited(char('['), number, char(']')),
    ))
    .parse(input)
}

fn segment_name(input: &str) -> IResult<&str, &str> {
    verify(alphanumeric1, |name: &str| name.len() >= 3).parse(input)
}

fn path(input: &str) -> IResult<&str, Hl7Path> {
    let (input, segment) = segment_name(input)?;
    let (input, segment_index) = opt(index).parse(input)?;
    let (input, field) = preceded(char('.'), number).parse(input)?;
    let (input, repetition) = opt(index).parse(input)?;
    let (input, component) = opt(preceded(char('.'), number)).parse(input)?;
    let (input, subcomponent) = match component {
        Some(_) => opt(preceded(char('.'), number)).parse(input)?,
        None => (input, None),
    };

    Ok((
        input,
        Hl7Path {
            segment: segment.to_string(),
            segment_index: segment_index.unwrap_or(0),
            field,
            repetition,
            component,
            subcomponent,
        },
    ))
}

impl FromStr for Hl7Path {
    type Err = Hl7Error;

    fn from_str(s: &str) -> Result<Self> {
        match all_consuming(path).parse(s.trim()) {
            Ok((_, parsed)) => Ok(parsed),
            Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
                let message = if e.input.is_empty() {
                    "unexpected end of path".to_string()
                } else {
                    format!("unexpected input at '{}'", e.input)
                };
                Err(Hl7Error::invalid_path(s, message))
            }
            Err(nom::Err::Incomplete(_)) => Err(Hl7Error::invalid_path(s, "incomplete path")),
        }
    }
}

impl fmt::Display for Hl7Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segment)?;
        if self.segment_index > 0 {
            write!(f, "({})", self.segment_index)?;
        }
        write!(f, ".{}", self.field)?;
        if let Some(repetition) = self.repetition {
            write!(f, "[{repetition}]")?;
        }
        if let Some(component) = self.component {
            write!(f, ".{component}")?;
            if let Some(subcomponent) = self.subcomponent {
                write!(f, ".{subcomponent}")?;
            }
        }
        Ok(())
    }
}
