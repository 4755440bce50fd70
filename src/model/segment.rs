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

//! Segments
//!
//! The MSH segment is the one structural exception of HL7 v2: its field 1 is
//! the field separator itself and its field 2 the encoding characters, so
//! neither is delimited like the other fields. Both are stored as literal
//! fields and handled only here; everything else treats MSH like any segment.

use super::component::Component;
use super::field::{Field, Repetition};
use super::value::Value;
use super::{add_or_overwrite, slot_or_insert};
use crate::encoding::Encoding;
use crate::error::{Hl7Error, Result};
use serde::{Deserialize, Serialize};

/// A named record of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    name: String,
    fields: Vec<Field>,
    encoding: Encoding,
}

impl Segment {
    /// Name of the message header segment
    pub const HEADER: &'static str = "MSH";

    /// Create an empty segment
    ///
    /// A header segment starts with its two literal fields taken from `encoding`.
    pub fn new(name: impl Into<String>, encoding: Encoding) -> Self {
        let name = name.into();
        let fields = if name == Self::HEADER {
            Self::header_fields(&encoding, &encoding.encoding_characters())
        } else {
            Vec::new()
        };
        Self {
            name,
            fields,
            encoding,
        }
    }

    pub(crate) fn from_fields(name: &str, fields: Vec<Field>, encoding: Encoding) -> Self {
        Self {
            name: name.to_string(),
            fields,
            encoding,
        }
    }

    /// The literal MSH-1 and MSH-2 fields
    pub(crate) fn header_fields(encoding: &Encoding, encoding_characters: &str) -> Vec<Field> {
        vec![
            Field::literal(&encoding.field_separator().to_string(), *encoding),
            Field::literal(encoding_characters, *encoding),
        ]
    }

    /// Segment name, e.g. `PID`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether this is the message header segment
    pub fn is_header(&self) -> bool {
        self.name == Self::HEADER
    }

    /// Encoding profile of this segment
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// All fields in order, empty trailing fields included
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Number of fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Field at a 1-based index
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index.checked_sub(1)?)
    }

    fn is_header_literal(&self, index: usize) -> bool {
        self.is_header() && matches!(index, 1 | 2)
    }

    fn reject_header_literal(&self, index: usize) -> Result<()> {
        if self.is_header_literal(index) {
            return Err(Hl7Error::invalid_index(
                index,
                "MSH-1 and MSH-2 are fixed by the message encoding characters",
            ));
        }
        Ok(())
    }

    /// Literal text of MSH-1 or MSH-2
    ///
    /// Returns `None` for every other field and for non-header segments.
    pub fn header_field(&self, index: usize) -> Option<String> {
        if !self.is_header_literal(index) {
            return None;
        }
        self.field(index).map(Field::to_wire)
    }

    /// Mutable field at a 1-based index
    ///
    /// The literal header fields are not handed out.
    pub fn field_mut(&mut self, index: usize) -> Option<&mut Field> {
        if self.is_header_literal(index) {
            return None;
        }
        self.fields.get_mut(index.checked_sub(1)?)
    }

    /// Mutable field, padding the segment with empty fields up to `index`
    pub fn field_or_insert(&mut self, index: usize) -> Result<&mut Field> {
        self.reject_header_literal(index)?;
        let encoding = self.encoding;
        slot_or_insert(&mut self.fields, index, || Field::empty(encoding))
    }

    /// Decoded text of a whole field, absent when out of range
    pub fn value(&self, index: usize) -> Value {
        self.value_at(index, None, None, None)
    }

    /// Decoded value at a position below this segment
    ///
    /// Without a component the whole field is returned, or the selected
    /// repetition when one is given. The repetition defaults to the first.
    pub fn value_at(
        &self,
        field: usize,
        repetition: Option<usize>,
        component: Option<usize>,
        subcomponent: Option<usize>,
    ) -> Value {
        if let Some(text) = self.header_field(field) {
            return Value::Present(text);
        }
        let Some(target) = self.field(field) else {
            return Value::Absent;
        };
        let rep = repetition.unwrap_or(1);
        match (component, subcomponent) {
            (None, _) => match repetition {
                None => target.value(),
                Some(rep) => target.repetition_value(rep),
            },
            (Some(comp), None) => target.component(rep, comp),
            (Some(comp), Some(sub)) => target.subcomponent(rep, comp, sub),
        }
    }

    /// Store wire text at a position below this segment
    ///
    /// Missing fields, repetitions, components and sub-components are padded
    /// with empty placeholders. Without a repetition the whole field is
    /// replaced; with one, only that repetition.
    pub fn set_value_at(
        &mut self,
        field: usize,
        repetition: Option<usize>,
        component: Option<usize>,
        subcomponent: Option<usize>,
        text: &str,
    ) -> Result<()> {
        self.reject_header_literal(field)?;
        let encoding = self.encoding;

        let Some(comp) = component else {
            match repetition {
                None => {
                    self.add_or_overwrite_field(Field::new(text, encoding), Some(field))?;
                }
                Some(rep) => {
                    self.field_or_insert(field)?
                        .add_or_overwrite_repetition(Repetition::new(text), Some(rep))?;
                }
            }
            return Ok(());
        };

        let components = self
            .field_or_insert(field)?
            .components_mut(repetition.unwrap_or(1))?;
        match subcomponent {
            None => {
                add_or_overwrite(components, Component::new(text, encoding), Some(comp), || {
                    Component::empty(encoding)
                })?;
            }
            Some(sub) => {
                slot_or_insert(components, comp, || Component::empty(encoding))?
                    .add_or_overwrite_subcomponent(Value::from_wire(text), Some(sub))?;
            }
        }
        Ok(())
    }

    /// Set a field, appending after the last field when no index is given
    pub fn add_or_overwrite_field(&mut self, field: Field, index: Option<usize>) -> Result<usize> {
        if let Some(index) = index {
            self.reject_header_literal(index)?;
        }
        let encoding = self.encoding;
        add_or_overwrite(&mut self.fields, field, index, || Field::empty(encoding))
    }

    /// Set a field from wire text, appending after the last field when no index is given
    pub fn add_or_overwrite_value(&mut self, value: &str, index: Option<usize>) -> Result<usize> {
        self.add_or_overwrite_field(Field::new(value, self.encoding), index)
    }

    /// Remove the field at a 1-based index, shifting later fields down
    pub fn remove_field(&mut self, index: usize) -> Result<Field> {
        self.reject_header_literal(index)?;
        match index.checked_sub(1) {
            Some(position) if position < self.fields.len() => Ok(self.fields.remove(position)),
            _ => Err(Hl7Error::invalid_index(
                index,
                format!("segment {} has no such field", self.name),
            )),
        }
    }

    pub(crate) fn write_wire(&self, out: &mut String, compact: bool) {
        let separator = self.encoding.field_separator();
        let floor = if self.is_header() { 2 } else { 0 };
        let mut end = self.fields.len();
        if compact {
            while end > floor && self.fields[end - 1].is_empty() {
                end -= 1;
            }
        }

        out.push_str(&self.name);
        if self.is_header() {
            // MSH-1 is the separator that follows the name
            out.push(separator);
            if let Some(encoding_characters) = self.fields.get(1) {
                encoding_characters.write_wire(out);
            }
            for field in self.fields.iter().take(end).skip(2) {
                out.push(separator);
                field.write_wire(out);
            }
        } else {
            for field in self.fields.iter().take(end) {
                out.push(separator);
                field.write_wire(out);
            }
        }
    }

    /// Render the segment as wire text, without terminator
    pub fn serialize(&self, compact: bool) -> String {
        let mut out = String::new();
        self.write_wire(&mut out, compact);
        out
    }
}
