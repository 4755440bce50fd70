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

//! Fields and their repetitions
//!
//! A repetition starts out as the raw text found on the wire. It is only split
//! into components when a caller writes at component level; reads of a raw
//! repetition slice the text in place. Fields that are never inspected below
//! field level therefore cost a single string.

use super::component::Component;
use super::value::Value;
use super::{add_or_overwrite, slot_or_insert};
use crate::encoding::Encoding;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One occurrence of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Repetition {
    /// Wire text that has not been split into components
    Raw(String),

    /// Components, in wire order
    Decomposed(Vec<Component>),
}

impl Default for Repetition {
    fn default() -> Self {
        Self::Raw(String::new())
    }
}

impl Repetition {
    /// Create a raw repetition from wire text
    pub fn new(text: impl Into<String>) -> Self {
        Self::Raw(text.into())
    }

    /// Check whether the repetition has been split into components
    pub fn is_decomposed(&self) -> bool {
        matches!(self, Self::Decomposed(_))
    }

    /// Wire text of the repetition
    pub fn to_wire(&self, encoding: &Encoding) -> Cow<'_, str> {
        match self {
            Self::Raw(text) => Cow::Borrowed(text),
            Self::Decomposed(components) => {
                let mut out = String::new();
                write_components(components, encoding, &mut out);
                Cow::Owned(out)
            }
        }
    }

    /// Decoded text of the whole repetition
    pub fn value(&self, encoding: &Encoding) -> Value {
        Value::from_wire(&self.to_wire(encoding)).decoded(encoding)
    }

    /// Number of components
    pub fn component_count(&self, encoding: &Encoding) -> usize {
        match self {
            Self::Raw(text) if text.is_empty() => 0,
            Self::Raw(text) => text.split(encoding.component_separator()).count(),
            Self::Decomposed(components) => components.len(),
        }
    }

    /// Decoded component at a 1-based index
    pub fn component(&self, index: usize, encoding: &Encoding) -> Value {
        let Some(position) = index.checked_sub(1) else {
            return Value::Absent;
        };
        match self {
            Self::Raw(text) => text
                .split(encoding.component_separator())
                .nth(position)
                .map(|part| Value::from_wire(part).decoded(encoding))
                .unwrap_or_default(),
            Self::Decomposed(components) => components
                .get(position)
                .map(Component::value)
                .unwrap_or_default(),
        }
    }

    /// Decoded sub-component of the component at `component`
    pub fn subcomponent(&self, component: usize, index: usize, encoding: &Encoding) -> Value {
        let (Some(comp_position), Some(sub_position)) =
            (component.checked_sub(1), index.checked_sub(1))
        else {
            return Value::Absent;
        };
        match self {
            Self::Raw(text) => text
                .split(encoding.component_separator())
                .nth(comp_position)
                .and_then(|part| part.split(encoding.subcomponent_separator()).nth(sub_position))
                .map(|part| Value::from_wire(part).decoded(encoding))
                .unwrap_or_default(),
            Self::Decomposed(components) => components
                .get(comp_position)
                .map(|comp| comp.subcomponent(index))
                .unwrap_or_default(),
        }
    }

    /// Components of the repetition, splitting raw text on first use
    pub fn components_mut(&mut self, encoding: &Encoding) -> &mut Vec<Component> {
        if let Self::Raw(text) = self {
            log::trace!("decomposing repetition '{text}' into components");
            let components = text
                .split(encoding.component_separator())
                .map(|part| Component::new(part, *encoding))
                .collect();
            *self = Self::Decomposed(components);
        }
        match self {
            Self::Decomposed(components) => components,
            Self::Raw(_) => unreachable!("raw repetition was decomposed above"),
        }
    }

    pub(crate) fn write_wire(&self, encoding: &Encoding, out: &mut String) {
        match self {
            Self::Raw(text) => out.push_str(text),
            Self::Decomposed(components) => write_components(components, encoding, out),
        }
    }
}

fn write_components(components: &[Component], encoding: &Encoding, out: &mut String) {
    for (i, component) in components.iter().enumerate() {
        if i > 0 {
            out.push(encoding.component_separator());
        }
        component.write_wire(out);
    }
}

/// A positional field of a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    repetitions: Vec<Repetition>,
    encoding: Encoding,
}

impl Field {
    /// Create a field from wire text, splitting it into repetitions
    pub fn new(value: &str, encoding: Encoding) -> Self {
        let repetitions = value
            .split(encoding.repetition_separator())
            .map(Repetition::new)
            .collect();
        Self {
            repetitions,
            encoding,
        }
    }

    /// Create a field holding the explicit null
    pub fn null(encoding: Encoding) -> Self {
        Self {
            repetitions: vec![Repetition::new(Encoding::NULL_MARKER)],
            encoding,
        }
    }

    /// Create a field with no repetitions
    pub fn empty(encoding: Encoding) -> Self {
        Self {
            repetitions: Vec::new(),
            encoding,
        }
    }

    /// Create a field whose text is never split, used for MSH-1 and MSH-2
    pub(crate) fn literal(text: &str, encoding: Encoding) -> Self {
        Self {
            repetitions: vec![Repetition::Decomposed(vec![Component::literal(
                text, encoding,
            )])],
            encoding,
        }
    }

    /// Encoding profile of this field
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// All repetitions, in wire order
    pub fn repetitions(&self) -> &[Repetition] {
        &self.repetitions
    }

    /// Repetition at a 1-based index
    pub fn repetition(&self, index: usize) -> Option<&Repetition> {
        self.repetitions.get(index.checked_sub(1)?)
    }

    /// Number of repetitions
    pub fn repetition_count(&self) -> usize {
        self.repetitions.len()
    }

    /// Check whether the field repeats
    pub fn has_repetitions(&self) -> bool {
        self.repetitions.len() > 1
    }

    /// Decoded text of the whole field, repetition separators included
    pub fn value(&self) -> Value {
        match self.repetitions.as_slice() {
            [single] => single.value(&self.encoding),
            _ => Value::from_wire(&self.to_wire()).decoded(&self.encoding),
        }
    }

    /// Decoded text of one repetition
    pub fn repetition_value(&self, repetition: usize) -> Value {
        self.repetition(repetition)
            .map(|rep| rep.value(&self.encoding))
            .unwrap_or_default()
    }

    /// Decoded component of a repetition
    pub fn component(&self, repetition: usize, index: usize) -> Value {
        self.repetition(repetition)
            .map(|rep| rep.component(index, &self.encoding))
            .unwrap_or_default()
    }

    /// Decoded sub-component of a repetition
    pub fn subcomponent(&self, repetition: usize, component: usize, index: usize) -> Value {
        self.repetition(repetition)
            .map(|rep| rep.subcomponent(component, index, &self.encoding))
            .unwrap_or_default()
    }

    /// Components of a repetition, creating and decomposing it as needed
    pub fn components_mut(&mut self, repetition: usize) -> Result<&mut Vec<Component>> {
        let encoding = self.encoding;
        let rep = slot_or_insert(&mut self.repetitions, repetition, Repetition::default)?;
        Ok(rep.components_mut(&encoding))
    }

    /// Set a component of the first repetition, appending when no index is given
    pub fn add_or_overwrite_component(
        &mut self,
        component: Component,
        index: Option<usize>,
    ) -> Result<usize> {
        let encoding = self.encoding;
        let components = self.components_mut(1)?;
        add_or_overwrite(components, component, index, || Component::empty(encoding))
    }

    /// Set a repetition, appending when no index is given
    pub fn add_or_overwrite_repetition(
        &mut self,
        repetition: Repetition,
        index: Option<usize>,
    ) -> Result<usize> {
        add_or_overwrite(&mut self.repetitions, repetition, index, Repetition::default)
    }

    /// Remove the repetition at a 1-based index, shifting later ones down
    pub fn remove_repetition(&mut self, index: usize) -> Option<Repetition> {
        let position = index.checked_sub(1)?;
        (position < self.repetitions.len()).then(|| self.repetitions.remove(position))
    }

    /// Check whether the field renders as empty wire text
    pub fn is_empty(&self) -> bool {
        self.repetitions.len() <= 1
            && self
                .repetitions
                .iter()
                .all(|rep| rep.to_wire(&self.encoding).is_empty())
    }

    pub(crate) fn write_wire(&self, out: &mut String) {
        for (i, rep) in self.repetitions.iter().enumerate() {
            if i > 0 {
                out.push(self.encoding.repetition_separator());
            }
            rep.write_wire(&self.encoding, out);
        }
    }

    /// Render the field as wire text
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        self.write_wire(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn enc() -> Encoding {
        Encoding::default()
    }

    #[test]
    fn test_repetitions_stay_raw_on_read() {
        let field = Field::new("1447312459^DOE^MICHAEL~DOEM06^DOE^MICHAEL", enc());
        assert_eq!(field.repetition_count(), 2);
        assert_eq!(field.component(2, 1), "DOEM06");
        assert_eq!(field.component(2, 3), "MICHAEL");
        assert_eq!(field.component(3, 1), Value::Absent);
        assert!(field.repetitions().iter().all(|rep| !rep.is_decomposed()));
    }

    #[test]
    fn test_component_write_decomposes_in_place() {
        let mut field = Field::new("ZIB5", enc());
        field
            .add_or_overwrite_component(Component::new("ZIB.5.3_", enc()), Some(3))
            .unwrap();
        field
            .add_or_overwrite_component(Component::new("ZIB.5.3", enc()), Some(3))
            .unwrap();
        assert!(field.repetition(1).unwrap().is_decomposed());
        assert_eq!(field.to_wire(), "ZIB5^^ZIB.5.3");
        assert_eq!(field.component(1, 3), "ZIB.5.3");
    }

    #[test]
    fn test_null_and_empty_fields() {
        assert_eq!(Field::null(enc()).value(), Value::Null);
        assert_eq!(Field::new("", enc()).value(), "");
        assert_eq!(Field::empty(enc()).to_wire(), "");
        assert!(Field::empty(enc()).is_empty());
        assert!(!Field::null(enc()).is_empty());
        assert!(!Field::new("~", enc()).is_empty());
    }

    #[test]
    fn test_whole_field_value_keeps_repetition_separator() {
        let field = Field::new("A~B", enc());
        assert_eq!(field.value(), "A~B");
        assert_eq!(field.repetition_value(2), "B");
    }

    #[test]
    fn test_subcomponent_from_raw_and_decomposed() {
        let mut field = Field::new("a^b&c&d", enc());
        assert_eq!(field.subcomponent(1, 2, 3), "d");
        field.components_mut(1).unwrap();
        assert_eq!(field.subcomponent(1, 2, 3), "d");
        assert_eq!(field.subcomponent(1, 2, 4), Value::Absent);
    }

    #[test]
    fn test_repetition_add_and_remove() {
        let mut field = Field::new("A", enc());
        field.add_or_overwrite_repetition(Repetition::new("C"), Some(3)).unwrap();
        assert_eq!(field.to_wire(), "A~~C");
        assert_eq!(field.remove_repetition(2), Some(Repetition::default()));
        assert_eq!(field.to_wire(), "A~C");
        assert_eq!(field.remove_repetition(5), None);
    }

    #[test]
    fn test_component_count() {
        assert_eq!(Repetition::new("").component_count(&enc()), 0);
        assert_eq!(Repetition::new("a^^c").component_count(&enc()), 3);
    }
}
