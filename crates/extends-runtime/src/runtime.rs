//! Handle-based string and array operations
//!
//! [`Runtime`] owns every string and array created through it. Host code
//! holds only [`StrHandle`]s and [`ArrayHandle`]s; elements inside an array
//! are weak references that the runtime resolves on demand, so a destroyed
//! referent surfaces as [`RuntimeError::StaleHandle`] rather than a dangling
//! read.
//!
//! No table guard is held while another object is touched, which keeps
//! self-referential calls such as `append(s, s)` well defined.
//!
//! A runtime may be shared between threads, but any single string or array
//! must be used by one thread at a time.

use tracing::debug;

use crate::{
    array::TaggedArray,
    config::RuntimeConfig,
    error::{HandleKind, Result, RuntimeError},
    handle::{ArrayHandle, HandleStats, HandleTable, StrHandle},
    string::GrowableString,
    value::{Tag, Value},
};

/// Runtime context that contains the string and array tables
pub struct Runtime {
    strings: HandleTable<GrowableString>,
    arrays: HandleTable<TaggedArray>,
    config: RuntimeConfig,
}

fn stale_string(handle: StrHandle) -> RuntimeError {
    RuntimeError::StaleHandle {
        kind: HandleKind::String,
        id: handle.id(),
    }
}

fn stale_array(handle: ArrayHandle) -> RuntimeError {
    RuntimeError::StaleHandle {
        kind: HandleKind::Array,
        id: handle.id(),
    }
}

#[inline]
fn verify(ok: bool, what: &str) {
    #[cfg(feature = "debug_runtime")]
    assert!(ok, "{what} invariant violated");
    #[cfg(not(feature = "debug_runtime"))]
    let _ = (ok, what);
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            strings: HandleTable::new(),
            arrays: HandleTable::new(),
            config,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Allocation statistics for the string and array tables.
    pub fn stats(&self) -> (HandleStats, HandleStats) {
        (self.strings.stats(), self.arrays.stats())
    }

    /// Release every string and array. All outstanding handles go stale.
    pub fn clear(&self) {
        debug!(
            strings = self.strings.len(),
            arrays = self.arrays.len(),
            "clearing runtime"
        );
        self.strings.clear();
        self.arrays.clear();
    }

    // =========================================================================
    // Strings
    // =========================================================================

    fn alloc_string(&self, string: GrowableString) -> StrHandle {
        let handle = StrHandle(self.strings.insert(string));
        debug!(id = handle.id(), "string created");
        handle
    }

    /// Execute a closure with access to a live string.
    pub fn with_string<R>(&self, s: StrHandle, f: impl FnOnce(&GrowableString) -> R) -> Result<R> {
        self.strings.with(s.id(), f).ok_or_else(|| stale_string(s))
    }

    pub fn is_live_string(&self, s: StrHandle) -> bool {
        self.strings.contains(s.id())
    }

    /// Copy of the string's bytes, without terminator.
    pub fn string_bytes(&self, s: StrHandle) -> Result<Vec<u8>> {
        self.with_string(s, |string| string.as_bytes().to_vec())
    }

    pub fn string_new(&self, raw: &[u8]) -> StrHandle {
        self.alloc_string(GrowableString::from_bytes(raw))
    }

    pub fn string_from_int(&self, n: i64) -> StrHandle {
        self.alloc_string(GrowableString::from_int(n))
    }

    pub fn string_concat(&self, a: StrHandle, b: StrHandle) -> Result<StrHandle> {
        let tail = self.string_bytes(b)?;
        let joined = self.with_string(a, |string| string.concat(&tail))?;
        Ok(self.alloc_string(joined))
    }

    pub fn substring(&self, s: StrHandle, begin: usize, end: usize) -> Result<StrHandle> {
        let part = self.with_string(s, |string| string.substring(begin, end))??;
        Ok(self.alloc_string(part))
    }

    pub fn string_reverse(&self, s: StrHandle) -> Result<StrHandle> {
        let reversed = self.with_string(s, GrowableString::reversed)?;
        Ok(self.alloc_string(reversed))
    }

    pub fn string_upper(&self, s: StrHandle, begin: usize, end: usize) -> Result<StrHandle> {
        let mapped = self.with_string(s, |string| string.upper(begin, end))??;
        Ok(self.alloc_string(mapped))
    }

    pub fn string_lower(&self, s: StrHandle, begin: usize, end: usize) -> Result<StrHandle> {
        let mapped = self.with_string(s, |string| string.lower(begin, end))??;
        Ok(self.alloc_string(mapped))
    }

    /// Append `s2` to `s` in place and return the handle to use afterwards.
    ///
    /// The handle is stable across growth; it is returned so callers can
    /// treat append uniformly with the producing operations.
    pub fn append(&self, s: StrHandle, s2: StrHandle) -> Result<StrHandle> {
        let tail = self.string_bytes(s2)?;
        self.strings
            .with_mut(s.id(), |string| {
                string.append(&tail);
                verify(string.invariants_hold(), "string");
            })
            .ok_or_else(|| stale_string(s))?;
        Ok(s)
    }

    pub fn string_len(&self, s: StrHandle) -> Result<usize> {
        self.with_string(s, GrowableString::len)
    }

    pub fn string_destroy(&self, s: StrHandle) -> Result<()> {
        self.strings.remove(s.id()).ok_or_else(|| stale_string(s))?;
        debug!(id = s.id(), "string destroyed");
        Ok(())
    }

    // =========================================================================
    // Arrays
    // =========================================================================

    fn alloc_array(&self, array: TaggedArray) -> ArrayHandle {
        let handle = ArrayHandle(self.arrays.insert(array));
        debug!(id = handle.id(), size = self.array_size(handle).unwrap_or(0), "array created");
        handle
    }

    /// Execute a closure with access to a live array.
    pub fn with_array<R>(&self, a: ArrayHandle, f: impl FnOnce(&TaggedArray) -> R) -> Result<R> {
        self.arrays.with(a.id(), f).ok_or_else(|| stale_array(a))
    }

    fn with_array_mut<R>(
        &self,
        a: ArrayHandle,
        f: impl FnOnce(&mut TaggedArray) -> Result<R>,
    ) -> Result<R> {
        self.arrays
            .with_mut(a.id(), |array| {
                let result = f(&mut *array);
                verify(array.invariants_hold(), "array");
                result
            })
            .ok_or_else(|| stale_array(a))?
    }

    pub fn is_live_array(&self, a: ArrayHandle) -> bool {
        self.arrays.contains(a.id())
    }

    /// References must point at live objects when they are stored.
    fn check_referent(&self, value: Value) -> Result<()> {
        match value {
            Value::Int(_) => Ok(()),
            Value::Str(s) if self.is_live_string(s) => Ok(()),
            Value::Str(s) => Err(stale_string(s)),
            Value::Array(a) if self.is_live_array(a) => Ok(()),
            Value::Array(a) => Err(stale_array(a)),
        }
    }

    /// `size` zero INT elements. Fails with `Capacity` if the slots cannot
    /// be allocated.
    pub fn array_new(&self, size: usize) -> Result<ArrayHandle> {
        let array = TaggedArray::new(size, self.config.min_capacity)?;
        Ok(self.alloc_array(array))
    }

    /// Shallow copy: referenced strings and arrays are shared, not duplicated.
    pub fn array_copy(&self, a: ArrayHandle) -> Result<ArrayHandle> {
        let min_capacity = self.config.min_capacity;
        let copy = self.with_array(a, |array| {
            TaggedArray::from_values(array.values(), min_capacity)
        })?;
        Ok(self.alloc_array(copy))
    }

    /// Shallow copy of `[begin, end)`.
    pub fn array_slice(&self, a: ArrayHandle, begin: usize, end: usize) -> Result<ArrayHandle> {
        let min_capacity = self.config.min_capacity;
        let part = self.with_array(a, |array| array.slice(begin, end, min_capacity))??;
        Ok(self.alloc_array(part))
    }

    /// Release the array's slot storage. Referenced objects stay alive.
    pub fn array_destroy(&self, a: ArrayHandle) -> Result<()> {
        self.arrays.remove(a.id()).ok_or_else(|| stale_array(a))?;
        debug!(id = a.id(), "array destroyed");
        Ok(())
    }

    pub fn put(&self, a: ArrayHandle, index: usize, value: Value) -> Result<()> {
        self.check_referent(value)?;
        self.with_array_mut(a, |array| array.put(index, value))
    }

    pub fn push(&self, a: ArrayHandle, value: Value) -> Result<()> {
        self.check_referent(value)?;
        self.with_array_mut(a, |array| {
            array.push(value);
            Ok(())
        })
    }

    pub fn pop(&self, a: ArrayHandle) -> Result<Value> {
        self.with_array_mut(a, TaggedArray::pop)
    }

    pub fn shift(&self, a: ArrayHandle) -> Result<Value> {
        self.with_array_mut(a, TaggedArray::shift)
    }

    /// Insert at the front; returns the new size.
    pub fn unshift(&self, a: ArrayHandle, value: Value) -> Result<usize> {
        self.check_referent(value)?;
        self.with_array_mut(a, |array| Ok(array.unshift(value)))
    }

    pub fn insert(&self, a: ArrayHandle, index: usize, value: Value) -> Result<()> {
        self.check_referent(value)?;
        self.with_array_mut(a, |array| array.insert(index, value))
    }

    pub fn remove_at(&self, a: ArrayHandle, index: usize) -> Result<Value> {
        self.with_array_mut(a, |array| array.remove_at(index))
    }

    pub fn reverse(&self, a: ArrayHandle) -> Result<()> {
        self.with_array_mut(a, |array| {
            array.reverse();
            Ok(())
        })
    }

    /// Ascending sort; fails with `Type` unless every element is INT.
    pub fn sort(&self, a: ArrayHandle) -> Result<()> {
        self.with_array_mut(a, TaggedArray::sort)
    }

    pub fn get(&self, a: ArrayHandle, index: usize) -> Result<Value> {
        self.with_array(a, |array| array.get(index))?
    }

    pub fn get_type(&self, a: ArrayHandle, index: usize) -> Result<Tag> {
        self.with_array(a, |array| array.tag(index))?
    }

    pub fn array_size(&self, a: ArrayHandle) -> Result<usize> {
        self.with_array(a, TaggedArray::len)
    }

    // =========================================================================
    // Stringify
    // =========================================================================

    /// Render `a` as `[e0, e1, ...]`, recursing into nested arrays.
    ///
    /// Nesting is capped at `RuntimeConfig::max_depth` (256 by default):
    /// deeper arrays fail with `TooDeep` even when they are acyclic.
    pub fn render(&self, a: ArrayHandle) -> Result<GrowableString> {
        let mut out = GrowableString::from_bytes(b"");
        let mut path = Vec::new();
        self.render_into(a, &mut path, &mut out)?;
        Ok(out)
    }

    fn render_into(
        &self,
        a: ArrayHandle,
        path: &mut Vec<ArrayHandle>,
        out: &mut GrowableString,
    ) -> Result<()> {
        if path.contains(&a) {
            return Err(RuntimeError::Cycle { id: a.id() });
        }
        if path.len() >= self.config.max_depth {
            return Err(RuntimeError::TooDeep {
                limit: self.config.max_depth,
            });
        }

        // Snapshot the slots so no guard is held while recursing.
        let values = self.with_array(a, |array| array.values().to_vec())?;

        path.push(a);
        out.append(b"[");
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                out.append(b", ");
            }
            match value {
                Value::Int(n) => out.append(n.to_string().as_bytes()),
                Value::Str(s) => self.with_string(s, |string| out.append(string.as_bytes()))?,
                Value::Array(inner) => self.render_into(inner, path, out)?,
            }
        }
        out.append(b"]");
        path.pop();

        Ok(())
    }

    /// Render `a` into a new runtime-owned string.
    pub fn stringify(&self, a: ArrayHandle) -> Result<StrHandle> {
        let rendered = self.render(a)?;
        Ok(self.alloc_string(rendered))
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_operations_allocate_fresh() {
        let rt = Runtime::new();
        let a = rt.string_new(b"Hello, ");
        let b = rt.string_new(b"World");
        let c = rt.string_concat(a, b).unwrap();
        assert_ne!(c, a);
        assert_eq!(rt.string_bytes(c).unwrap(), b"Hello, World");
        assert_eq!(rt.string_bytes(a).unwrap(), b"Hello, ");

        let sub = rt.substring(c, 7, 12).unwrap();
        assert_eq!(rt.string_bytes(sub).unwrap(), b"World");
        let upper = rt.string_upper(sub, 0, 5).unwrap();
        assert_eq!(rt.string_bytes(upper).unwrap(), b"WORLD");
        let lower = rt.string_lower(upper, 1, 5).unwrap();
        assert_eq!(rt.string_bytes(lower).unwrap(), b"World");
        let reversed = rt.string_reverse(sub).unwrap();
        assert_eq!(rt.string_bytes(reversed).unwrap(), b"dlroW");
        assert_eq!(rt.string_len(c).unwrap(), 12);
        let number = rt.string_from_int(-17);
        assert_eq!(rt.string_bytes(number).unwrap(), b"-17");
    }

    #[test]
    fn test_append_self() {
        let rt = Runtime::new();
        let s = rt.string_new(b"ab");
        let s = rt.append(s, s).unwrap();
        assert_eq!(rt.string_bytes(s).unwrap(), b"abab");
    }

    #[test]
    fn test_destroyed_string_is_stale() {
        let rt = Runtime::new();
        let s = rt.string_new(b"gone");
        rt.string_destroy(s).unwrap();
        assert_eq!(
            rt.string_len(s),
            Err(RuntimeError::StaleHandle {
                kind: HandleKind::String,
                id: s.id()
            })
        );
        assert!(rt.string_destroy(s).is_err());
    }

    #[test]
    fn test_substring_error_allocates_nothing() {
        let rt = Runtime::new();
        let s = rt.string_new(b"abc");
        let before = rt.stats().0.allocated;
        assert!(rt.substring(s, 2, 1).is_err());
        assert_eq!(rt.stats().0.allocated, before);
    }

    #[test]
    fn test_put_rejects_stale_referent() {
        let rt = Runtime::new();
        let a = rt.array_new(1).unwrap();
        let s = rt.string_new(b"x");
        rt.string_destroy(s).unwrap();
        assert!(rt.put(a, 0, Value::Str(s)).is_err());
        assert_eq!(rt.get(a, 0), Ok(Value::Int(0)));
        assert!(rt.push(a, Value::Array(ArrayHandle::INVALID)).is_err());
        assert_eq!(rt.array_size(a), Ok(1));
    }

    #[test]
    fn test_copy_is_shallow() {
        let rt = Runtime::new();
        let s = rt.string_new(b"shared");
        let a = rt.array_new(0).unwrap();
        rt.push(a, Value::Str(s)).unwrap();
        let b = rt.array_copy(a).unwrap();
        assert_eq!(rt.get(b, 0), Ok(Value::Str(s)));

        rt.append(s, rt.string_new(b"!")).unwrap();
        let shown = rt.render(b).unwrap();
        assert_eq!(shown.to_string(), "[shared!]");

        rt.push(b, Value::Int(1)).unwrap();
        assert_eq!(rt.array_size(a), Ok(1));
    }

    #[test]
    fn test_destroy_array_is_shallow() {
        let rt = Runtime::new();
        let inner = rt.array_new(0).unwrap();
        rt.push(inner, Value::Int(5)).unwrap();
        let outer = rt.array_new(0).unwrap();
        rt.push(outer, Value::Array(inner)).unwrap();
        rt.array_destroy(outer).unwrap();
        assert!(rt.is_live_array(inner));
        assert_eq!(rt.array_size(inner), Ok(1));
    }

    #[test]
    fn test_stringify_stale_reference() {
        let rt = Runtime::new();
        let s = rt.string_new(b"x");
        let a = rt.array_new(0).unwrap();
        rt.push(a, Value::Str(s)).unwrap();
        rt.string_destroy(s).unwrap();
        assert!(matches!(
            rt.stringify(a),
            Err(RuntimeError::StaleHandle { kind: HandleKind::String, .. })
        ));
    }

    #[test]
    fn test_stringify_detects_cycle() {
        let rt = Runtime::new();
        let a = rt.array_new(0).unwrap();
        rt.push(a, Value::Int(1)).unwrap();
        rt.push(a, Value::Array(a)).unwrap();
        assert_eq!(rt.render(a), Err(RuntimeError::Cycle { id: a.id() }));
    }

    #[test]
    fn test_stringify_shared_child_is_not_cycle() {
        let rt = Runtime::new();
        let child = rt.array_new(0).unwrap();
        rt.push(child, Value::Int(7)).unwrap();
        let parent = rt.array_new(0).unwrap();
        rt.push(parent, Value::Array(child)).unwrap();
        rt.push(parent, Value::Array(child)).unwrap();
        assert_eq!(rt.render(parent).unwrap().to_string(), "[[7], [7]]");
    }

    #[test]
    fn test_stringify_depth_limit() {
        let rt = Runtime::with_config(RuntimeConfig::default().max_depth(2));
        let leaf = rt.array_new(0).unwrap();
        let mid = rt.array_new(0).unwrap();
        rt.push(mid, Value::Array(leaf)).unwrap();
        assert_eq!(rt.render(mid).unwrap().to_string(), "[[]]");

        let top = rt.array_new(0).unwrap();
        rt.push(top, Value::Array(mid)).unwrap();
        assert_eq!(rt.render(top), Err(RuntimeError::TooDeep { limit: 2 }));
    }

    #[test]
    fn test_min_capacity_config() {
        let rt = Runtime::with_config(RuntimeConfig::default().min_capacity(16));
        assert_eq!(rt.config().min_capacity, 16);
        assert_eq!(rt.config().max_depth, RuntimeConfig::default().max_depth);
        let a = rt.array_new(2).unwrap();
        assert_eq!(rt.with_array(a, TaggedArray::capacity), Ok(16));
    }

    #[test]
    fn test_oversized_array_new_fails_cleanly() {
        let rt = Runtime::new();
        assert_eq!(
            rt.array_new(usize::MAX),
            Err(RuntimeError::Capacity {
                requested: usize::MAX
            })
        );
        assert_eq!(rt.stats().1.allocated, 0);
    }

    #[test]
    fn test_clear_stales_everything() {
        let rt = Runtime::new();
        let s = rt.string_new(b"a");
        let a = rt.array_new(3).unwrap();
        rt.clear();
        assert!(!rt.is_live_string(s));
        assert!(!rt.is_live_array(a));
        let (strings, arrays) = rt.stats();
        assert_eq!(strings.live(), 0);
        assert_eq!(arrays.live(), 0);
    }
}
