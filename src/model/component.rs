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

//! Components and their sub-components

use super::value::Value;
use super::{add_or_overwrite, slot_or_insert};
use crate::encoding::Encoding;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One component of a repetition
///
/// Sub-components are stored as wire text; reads decode escape sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    subcomponents: SmallVec<[Value; 2]>,
    encoding: Encoding,
}

impl Component {
    /// Create a component from wire text, splitting it into sub-components
    pub fn new(value: &str, encoding: Encoding) -> Self {
        let subcomponents = value
            .split(encoding.subcomponent_separator())
            .map(Value::from_wire)
            .collect();
        Self {
            subcomponents,
            encoding,
        }
    }

    /// Create a component holding the explicit null
    pub fn null(encoding: Encoding) -> Self {
        Self {
            subcomponents: SmallVec::from_elem(Value::Null, 1),
            encoding,
        }
    }

    /// Create a component with no sub-components
    pub fn empty(encoding: Encoding) -> Self {
        Self {
            subcomponents: SmallVec::new(),
            encoding,
        }
    }

    /// Create a component whose text is never split
    pub(crate) fn literal(text: &str, encoding: Encoding) -> Self {
        Self {
            subcomponents: SmallVec::from_elem(Value::Present(text.to_string()), 1),
            encoding,
        }
    }

    /// Encoding profile of this component
    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// Sub-components as stored wire values
    pub fn subcomponents(&self) -> &[Value] {
        &self.subcomponents
    }

    /// Number of sub-components
    pub fn len(&self) -> usize {
        self.subcomponents.len()
    }

    /// Check whether the component has no sub-components
    pub fn is_empty(&self) -> bool {
        self.subcomponents.is_empty()
    }

    /// Decoded sub-component at a 1-based index, absent when out of range
    pub fn subcomponent(&self, index: usize) -> Value {
        index
            .checked_sub(1)
            .and_then(|i| self.subcomponents.get(i))
            .map(|value| value.decoded(&self.encoding))
            .unwrap_or_default()
    }

    /// Decoded text of the whole component
    pub fn value(&self) -> Value {
        match self.subcomponents.as_slice() {
            [single] => single.decoded(&self.encoding),
            _ => Value::from_wire(&self.to_wire()).decoded(&self.encoding),
        }
    }

    /// Set a sub-component from its wire value, appending when no index is given
    pub fn add_or_overwrite_subcomponent(
        &mut self,
        value: Value,
        index: Option<usize>,
    ) -> Result<usize> {
        add_or_overwrite(&mut self.subcomponents, value, index, || {
            Value::Present(String::new())
        })
    }

    /// Mutable sub-component, padding with empty values up to `index`
    pub fn subcomponent_mut(&mut self, index: usize) -> Result<&mut Value> {
        slot_or_insert(&mut self.subcomponents, index, || {
            Value::Present(String::new())
        })
    }

    /// Remove the sub-component at a 1-based index, shifting later ones down
    pub fn remove_subcomponent(&mut self, index: usize) -> Option<Value> {
        let position = index.checked_sub(1)?;
        (position < self.subcomponents.len()).then(|| self.subcomponents.remove(position))
    }

    pub(crate) fn write_wire(&self, out: &mut String) {
        for (i, value) in self.subcomponents.iter().enumerate() {
            if i > 0 {
                out.push(self.encoding.subcomponent_separator());
            }
            out.push_str(value.to_wire());
        }
    }

    /// Render the component as wire text
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        self.write_wire(&mut out);
        out
    }
}
