use tracing::trace;

use crate::error::{Result, RuntimeError};

/// Generic growable buffer for both strings and arrays
///
/// Storage is always fully initialized: `storage.len() == capacity`, and only
/// the first `length` slots are logically live. Capacity grows geometrically
/// and is never released on removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBuffer<T> {
    storage: Vec<T>,
    length: usize,
}

impl<T: Copy + Default> SlotBuffer<T> {
    /// Create a buffer with `length` zeroed live slots and room for at least
    /// `max(length, min_capacity)` slots.
    ///
    /// Fails with `Capacity` instead of aborting when the allocation cannot
    /// be made.
    pub fn with_length(length: usize, min_capacity: usize) -> Result<Self> {
        let capacity = length.max(min_capacity).max(1);
        let too_large = RuntimeError::Capacity { requested: length };

        capacity
            .checked_mul(size_of::<T>())
            .filter(|bytes| *bytes <= isize::MAX as usize)
            .ok_or_else(|| too_large.clone())?;

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| too_large)?;
        storage.resize(capacity, T::default());

        Ok(Self { storage, length })
    }

    /// Create a buffer holding a copy of `items`, sized to its content.
    pub fn from_slice(items: &[T], min_capacity: usize) -> Self {
        let capacity = items.len().max(min_capacity).max(1);
        let mut storage = Vec::with_capacity(capacity);
        storage.extend_from_slice(items);
        storage.resize(capacity, T::default());
        Self {
            storage,
            length: items.len(),
        }
    }

    /// Get the current length
    pub fn len(&self) -> usize {
        self.length
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Get the current capacity
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Live slots.
    pub fn as_slice(&self) -> &[T] {
        &self.storage[..self.length]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.storage[..self.length]
    }

    /// All slots up to capacity, including the dead tail.
    pub fn raw(&self) -> &[T] {
        &self.storage
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).copied()
    }

    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.as_mut_slice().get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Make room for at least `required` slots, doubling or jumping straight
    /// to `required`, whichever is larger.
    pub fn reserve_total(&mut self, required: usize) {
        let capacity = self.capacity();
        if required <= capacity {
            return;
        }
        let new_capacity = (capacity * 2).max(required);
        trace!(from = capacity, to = new_capacity, "growing buffer");
        self.storage.resize(new_capacity, T::default());
    }

    pub fn push(&mut self, value: T) {
        self.reserve_total(self.length + 1);
        self.storage[self.length] = value;
        self.length += 1;
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.length == 0 {
            return None;
        }
        self.length -= 1;
        let value = self.storage[self.length];
        self.storage[self.length] = T::default();
        Some(value)
    }

    /// Insert at `index <= len`, shifting the suffix right.
    pub fn insert(&mut self, index: usize, value: T) {
        debug_assert!(index <= self.length);
        self.reserve_total(self.length + 1);
        self.storage.copy_within(index..self.length, index + 1);
        self.storage[index] = value;
        self.length += 1;
    }

    /// Remove `index < len`, shifting the suffix left.
    pub fn remove(&mut self, index: usize) -> T {
        debug_assert!(index < self.length);
        let value = self.storage[index];
        self.storage.copy_within(index + 1..self.length, index);
        self.length -= 1;
        self.storage[self.length] = T::default();
        value
    }

    pub fn extend_from_slice(&mut self, items: &[T]) {
        self.reserve_total(self.length + items.len());
        self.storage[self.length..self.length + items.len()].copy_from_slice(items);
        self.length += items.len();
    }

    /// Check the structural invariants: logical length within capacity and
    /// the dead tail reset to the default value.
    pub fn invariants_hold(&self) -> bool
    where
        T: PartialEq,
    {
        self.length <= self.capacity()
            && self.storage[self.length..]
                .iter()
                .all(|slot| *slot == T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_length_is_zeroed() {
        let buffer: SlotBuffer<i64> = SlotBuffer::with_length(3, 4).unwrap();
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.capacity(), 4);
        assert_eq!(buffer.as_slice(), &[0, 0, 0]);
        assert_eq!(buffer.raw().len(), buffer.capacity());
    }

    #[test]
    fn test_zero_capacity_request_still_allocates() {
        let buffer: SlotBuffer<u8> = SlotBuffer::with_length(0, 0).unwrap();
        assert_eq!(buffer.capacity(), 1);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_oversized_length_is_an_error() {
        let result: Result<SlotBuffer<i64>> = SlotBuffer::with_length(usize::MAX, 4);
        assert_eq!(
            result,
            Err(RuntimeError::Capacity {
                requested: usize::MAX
            })
        );
        let result: Result<SlotBuffer<u8>> = SlotBuffer::with_length(isize::MAX as usize + 1, 0);
        assert!(result.is_err());
    }

    #[test]
    fn test_growth_doubles() {
        let mut buffer: SlotBuffer<i64> = SlotBuffer::with_length(0, 4).unwrap();
        for i in 0..5 {
            buffer.push(i);
        }
        assert_eq!(buffer.capacity(), 8);
        assert_eq!(buffer.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_growth_jumps_to_required() {
        let mut buffer: SlotBuffer<u8> = SlotBuffer::from_slice(b"ab", 0);
        buffer.extend_from_slice(b"cdefghij");
        assert_eq!(buffer.capacity(), 10);
        assert_eq!(buffer.as_slice(), b"abcdefghij");
    }

    #[test]
    fn test_pop_keeps_capacity() {
        let mut buffer: SlotBuffer<i64> = SlotBuffer::from_slice(&[1, 2, 3, 4, 5], 4);
        let capacity = buffer.capacity();
        assert_eq!(buffer.pop(), Some(5));
        assert_eq!(buffer.pop(), Some(4));
        assert_eq!(buffer.capacity(), capacity);
        assert!(buffer.invariants_hold());
    }

    #[test]
    fn test_insert_remove() {
        let mut buffer: SlotBuffer<i64> = SlotBuffer::from_slice(&[1, 2, 4], 4);
        buffer.insert(2, 3);
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 4]);
        buffer.insert(0, 0);
        assert_eq!(buffer.as_slice(), &[0, 1, 2, 3, 4]);
        assert_eq!(buffer.remove(0), 0);
        assert_eq!(buffer.remove(3), 4);
        assert_eq!(buffer.as_slice(), &[1, 2, 3]);
        assert!(buffer.invariants_hold());
    }

    #[test]
    fn test_set_out_of_range() {
        let mut buffer: SlotBuffer<i64> = SlotBuffer::with_length(2, 4).unwrap();
        assert!(buffer.set(1, 9));
        assert!(!buffer.set(2, 9));
        assert_eq!(buffer.get(1), Some(9));
        assert_eq!(buffer.get(2), None);
    }
}
