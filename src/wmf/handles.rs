//! Object handle table.
//!
//! A WMF stream names its pens, brushes and fonts by small integer handles.
//! The table has exactly as many slots as the header declares; creation takes
//! the first empty slot, and a full table is reported to the caller rather
//! than grown.

use crate::common::error::{Error, Result};

use super::objects::{Brush, Font, Pen};

/// Kind of object that occupies a slot without being modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueKind {
    Bitmap,
    Region,
    Palette,
}

/// One slot of the handle table.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ObjectSlot {
    #[default]
    Empty,
    Pen(Pen),
    Brush(Brush),
    PatternBrush(Brush),
    Font(Font),
    /// Placeholder keeping handle numbering in step with the stream.
    Opaque(OpaqueKind),
}

impl ObjectSlot {
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, ObjectSlot::Empty)
    }
}

/// Fixed-capacity arena of [`ObjectSlot`]s addressed by handle.
#[derive(Debug, Clone, Default)]
pub struct HandleTable {
    slots: Vec<ObjectSlot>,
}

impl HandleTable {
    /// Create a table with `capacity` empty slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![ObjectSlot::Empty; capacity],
        }
    }

    /// Number of slots (the declared object count).
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots currently holding an object.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }

    /// Store `object` in the first empty slot and return its handle.
    pub fn create(&mut self, object: ObjectSlot) -> Result<u16> {
        let capacity = self.slots.len();
        let idx = self
            .slots
            .iter()
            .position(ObjectSlot::is_empty)
            .ok_or(Error::HandleOverflow { capacity })?;
        let handle = u16::try_from(idx).map_err(|_| Error::HandleOverflow { capacity })?;
        self.slots[idx] = object;
        Ok(handle)
    }

    /// Look up a live object.
    pub fn get(&self, handle: u16) -> Result<&ObjectSlot> {
        match self.slots.get(usize::from(handle)) {
            Some(slot) if !slot.is_empty() => Ok(slot),
            _ => Err(Error::DanglingHandle { handle }),
        }
    }

    /// Empty a slot. Returns false when the handle was already empty or out of range.
    pub fn delete(&mut self, handle: u16) -> bool {
        match self.slots.get_mut(usize::from(handle)) {
            Some(slot) if !slot.is_empty() => {
                *slot = ObjectSlot::Empty;
                true
            },
            _ => false,
        }
    }

    /// Drop every object, keeping the capacity.
    pub fn clear(&mut self) {
        self.slots.fill(ObjectSlot::Empty);
    }
}
