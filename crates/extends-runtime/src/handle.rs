//! Opaque handles and the tables that resolve them
//!
//! Host code never sees an address. Every string and array lives in a
//! [`HandleTable`] and is referred to by a 64-bit id, so a handle survives
//! any reallocation of the object behind it and fits losslessly in an
//! `i64` slot on every platform.
//!
//! Id 0 is reserved as the invalid handle. Ids are never reused, so a
//! handle to a destroyed object stays stale forever instead of silently
//! aliasing a newer one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;

/// Handle to a [`GrowableString`](crate::string::GrowableString).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StrHandle(pub(crate) u64);

/// Handle to a [`TaggedArray`](crate::array::TaggedArray).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrayHandle(pub(crate) u64);

impl StrHandle {
    pub const INVALID: StrHandle = StrHandle(0);

    pub fn from_raw(id: u64) -> Self {
        StrHandle(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }

    pub fn is_invalid(self) -> bool {
        self.0 == 0
    }
}

impl ArrayHandle {
    pub const INVALID: ArrayHandle = ArrayHandle(0);

    pub fn from_raw(id: u64) -> Self {
        ArrayHandle(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }

    pub fn is_invalid(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for StrHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ArrayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Allocation counters for one table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleStats {
    pub allocated: u64,
    pub released: u64,
    pub peak: u64,
}

impl HandleStats {
    pub fn live(&self) -> u64 {
        self.allocated - self.released
    }
}

/// Table that owns objects of one kind and hands out ids for them
pub struct HandleTable<T> {
    table: DashMap<u64, T>,
    counter: AtomicU64,
    stats: Mutex<HandleStats>,
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self {
            table: DashMap::new(),
            counter: AtomicU64::new(1), // 0 is the invalid handle
            stats: Mutex::new(HandleStats::default()),
        }
    }

    /// Store `value` and return its fresh id.
    pub fn insert(&self, value: T) -> u64 {
        let id = self.counter.fetch_add(1, Ordering::Relaxed);
        self.table.insert(id, value);

        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.allocated += 1;
        stats.peak = stats.peak.max(stats.live());

        id
    }

    pub fn contains(&self, id: u64) -> bool {
        id != 0 && self.table.contains_key(&id)
    }

    /// Execute a closure with access to the value.
    ///
    /// The table guard is held for the duration of `f`; `f` must not reach
    /// back into the same table mutably.
    pub fn with<R>(&self, id: u64, f: impl FnOnce(&T) -> R) -> Option<R> {
        if id == 0 {
            return None;
        }
        self.table.get(&id).map(|entry| f(entry.value()))
    }

    /// Execute a closure with mutable access to the value.
    pub fn with_mut<R>(&self, id: u64, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        if id == 0 {
            return None;
        }
        self.table.get_mut(&id).map(|mut entry| f(entry.value_mut()))
    }

    /// Drop the value behind `id`, returning it if it was live.
    pub fn remove(&self, id: u64) -> Option<T> {
        if id == 0 {
            return None;
        }
        let (_, value) = self.table.remove(&id)?;
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.released += 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Release every value. Ids keep counting up so old handles stay stale.
    pub fn clear(&self) {
        let dropped = self.table.len() as u64;
        self.table.clear();
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.released += dropped;
    }

    pub fn stats(&self) -> HandleStats {
        *self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
