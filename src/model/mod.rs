//! Message model for HL7 v2
//!
//! Messages are trees of segments, fields, repetitions, components and
//! sub-components. Every level is addressed with 1-based indexes; reading an
//! index past the end yields [`Value::Absent`] rather than an error because
//! real-world messages routinely omit trailing optional elements.

#![warn(missing_docs)]

pub mod component;
pub mod field;
pub mod message;
pub mod segment;
pub mod value;

pub use component::Component;
pub use field::{Field, Repetition};
pub use message::Message;
pub use segment::Segment;
pub use value::Value;

use crate::error::{Hl7Error, Result};
use smallvec::{Array, SmallVec};

/// Ordered storage addressed by 1-based position
pub(crate) trait Slots<T> {
    fn slot_count(&self) -> usize;
    fn push_slot(&mut self, item: T);
    fn slot_mut(&mut self, position: usize) -> &mut T;
}

impl<T> Slots<T> for Vec<T> {
    fn slot_count(&self) -> usize {
        self.len()
    }

    fn push_slot(&mut self, item: T) {
        self.push(item);
    }

    fn slot_mut(&mut self, position: usize) -> &mut T {
        &mut self[position - 1]
    }
}

impl<A: Array> Slots<A::Item> for SmallVec<A> {
    fn slot_count(&self) -> usize {
        self.len()
    }

    fn push_slot(&mut self, item: A::Item) {
        self.push(item);
    }

    fn slot_mut(&mut self, position: usize) -> &mut A::Item {
        &mut self[position - 1]
    }
}

/// Largest index a write may pad up to
pub const MAX_INDEX: usize = u16::MAX as usize;

fn check_position(position: usize) -> Result<()> {
    match position {
        0 => Err(Hl7Error::invalid_index(0, "element indexes are 1-based")),
        p if p > MAX_INDEX => Err(Hl7Error::invalid_index(
            p,
            format!("element indexes are limited to {MAX_INDEX}"),
        )),
        _ => Ok(()),
    }
}

/// Store `item` at a 1-based position, or append it when no position is given
///
/// An occupied position is overwritten in place. A position past the end
/// first pads the storage with `placeholder` items. Appending always goes
/// after the last slot; gaps are never backfilled. Returns the position used.
pub(crate) fn add_or_overwrite<T, S: Slots<T>>(
    slots: &mut S,
    item: T,
    position: Option<usize>,
    mut placeholder: impl FnMut() -> T,
) -> Result<usize> {
    if let Some(position) = position {
        check_position(position)?;
    }
    match position {
        Some(position) if position <= slots.slot_count() => {
            *slots.slot_mut(position) = item;
            Ok(position)
        }
        Some(position) => {
            while slots.slot_count() < position - 1 {
                slots.push_slot(placeholder());
            }
            slots.push_slot(item);
            Ok(position)
        }
        None => {
            slots.push_slot(item);
            Ok(slots.slot_count())
        }
    }
}

/// Get a mutable slot, padding the storage with placeholders up to `position`
pub(crate) fn slot_or_insert<T, S: Slots<T>>(
    slots: &mut S,
    position: usize,
    mut placeholder: impl FnMut() -> T,
) -> Result<&mut T> {
    check_position(position)?;
    while slots.slot_count() < position {
        slots.push_slot(placeholder());
    }
    Ok(slots.slot_mut(position))
}
