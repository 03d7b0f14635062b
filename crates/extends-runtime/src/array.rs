//! Dynamic, heterogeneous arrays of tagged slots
//!
//! A [`TaggedArray`] owns its slot storage only. STRING and ARRAY elements
//! are handles to objects owned by the runtime tables; copying or slicing an
//! array copies the handles, so the copies alias the same referents.
//!
//! All operations here validate before they mutate: on `Err` the array is
//! exactly as it was.

use crate::{
    buffer::SlotBuffer,
    error::{Result, RuntimeError},
    value::{Tag, Value},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedArray {
    slots: SlotBuffer<Value>,
}

impl TaggedArray {
    /// `size` zero INT elements.
    pub fn new(size: usize, min_capacity: usize) -> Result<Self> {
        Ok(Self {
            slots: SlotBuffer::with_length(size, min_capacity)?,
        })
    }

    pub fn from_values(values: &[Value], min_capacity: usize) -> Self {
        Self {
            slots: SlotBuffer::from_slice(values, min_capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn values(&self) -> &[Value] {
        self.slots.as_slice()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.len() {
            return Err(RuntimeError::Index {
                index,
                len: self.len(),
            });
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<Value> {
        self.slots.get(index).ok_or(RuntimeError::Index {
            index,
            len: self.len(),
        })
    }

    pub fn tag(&self, index: usize) -> Result<Tag> {
        self.get(index).map(Value::tag)
    }

    pub fn put(&mut self, index: usize, value: Value) -> Result<()> {
        self.check_index(index)?;
        self.slots.set(index, value);
        Ok(())
    }

    /// Append; amortized O(1).
    pub fn push(&mut self, value: Value) {
        self.slots.push(value);
    }

    pub fn pop(&mut self) -> Result<Value> {
        self.slots.pop().ok_or(RuntimeError::Empty)
    }

    /// Remove the first element, shifting the rest down.
    pub fn shift(&mut self) -> Result<Value> {
        if self.is_empty() {
            return Err(RuntimeError::Empty);
        }
        Ok(self.slots.remove(0))
    }

    /// Insert at the front and return the new size.
    pub fn unshift(&mut self, value: Value) -> usize {
        self.slots.insert(0, value);
        self.len()
    }

    /// Insert at `index` in `[0, len]`, shifting the suffix right.
    pub fn insert(&mut self, index: usize, value: Value) -> Result<()> {
        if index > self.len() {
            return Err(RuntimeError::Index {
                index,
                len: self.len(),
            });
        }
        self.slots.insert(index, value);
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Value> {
        self.check_index(index)?;
        Ok(self.slots.remove(index))
    }

    pub fn reverse(&mut self) {
        self.slots.as_mut_slice().reverse();
    }

    /// Ascending sort. Every element must be INT.
    pub fn sort(&mut self) -> Result<()> {
        if let Some((index, value)) = self
            .values()
            .iter()
            .enumerate()
            .find(|(_, value)| value.as_int().is_none())
        {
            return Err(RuntimeError::Type {
                index,
                found: value.tag(),
            });
        }
        self.slots.as_mut_slice().sort_by_key(|value| value.raw());
        Ok(())
    }

    /// Shallow copy of `[begin, end)`.
    pub fn slice(&self, begin: usize, end: usize, min_capacity: usize) -> Result<TaggedArray> {
        RuntimeError::check_range(begin, end, self.len())?;
        Ok(Self::from_values(&self.values()[begin..end], min_capacity))
    }

    pub fn invariants_hold(&self) -> bool {
        self.slots.invariants_hold()
    }
}
