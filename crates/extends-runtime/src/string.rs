//! Growable, NUL-terminated byte strings
//!
//! Every producing operation returns a fresh buffer sized to its content;
//! two strings never share storage. Indices are byte offsets and case
//! mapping is ASCII-only, matching what the host language's generated code
//! expects from a C-style string.

use std::fmt;

use crate::{
    buffer::SlotBuffer,
    error::{Result, RuntimeError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrowableString {
    // The terminator lives in the dead tail: capacity always exceeds length
    // and unused slots are zero.
    buffer: SlotBuffer<u8>,
}

impl GrowableString {
    /// Copy `raw` into a new buffer.
    pub fn from_bytes(raw: &[u8]) -> Self {
        Self {
            buffer: SlotBuffer::from_slice(raw, raw.len() + 1),
        }
    }

    /// Base-10 rendering of `n`.
    pub fn from_int(n: i64) -> Self {
        Self::from_bytes(n.to_string().as_bytes())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Allocated bytes, terminator included.
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Content followed by its NUL terminator.
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buffer.raw()[..self.len() + 1]
    }

    pub fn concat(&self, other: &[u8]) -> Self {
        let mut buffer = SlotBuffer::from_slice(self.as_bytes(), self.len() + other.len() + 1);
        buffer.extend_from_slice(other);
        Self { buffer }
    }

    /// Half-open byte range `[begin, end)`.
    pub fn substring(&self, begin: usize, end: usize) -> Result<Self> {
        RuntimeError::check_range(begin, end, self.len())?;
        Ok(Self::from_bytes(&self.as_bytes()[begin..end]))
    }

    pub fn reversed(&self) -> Self {
        let mut out = Self::from_bytes(self.as_bytes());
        out.buffer.as_mut_slice().reverse();
        out
    }

    /// Copy with `[begin, end)` upper-cased.
    pub fn upper(&self, begin: usize, end: usize) -> Result<Self> {
        self.map_range(begin, end, u8::to_ascii_uppercase)
    }

    /// Copy with `[begin, end)` lower-cased.
    pub fn lower(&self, begin: usize, end: usize) -> Result<Self> {
        self.map_range(begin, end, u8::to_ascii_lowercase)
    }

    fn map_range(&self, begin: usize, end: usize, f: fn(&u8) -> u8) -> Result<Self> {
        RuntimeError::check_range(begin, end, self.len())?;
        let mut out = Self::from_bytes(self.as_bytes());
        for byte in &mut out.buffer.as_mut_slice()[begin..end] {
            *byte = f(&*byte);
        }
        Ok(out)
    }

    /// Append `other` in place, growing the buffer if needed.
    pub fn append(&mut self, other: &[u8]) {
        self.buffer.reserve_total(self.len() + other.len() + 1);
        self.buffer.extend_from_slice(other);
    }

    pub fn invariants_hold(&self) -> bool {
        self.len() < self.capacity() && self.buffer.invariants_hold()
    }
}

impl fmt::Display for GrowableString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl From<&str> for GrowableString {
    fn from(s: &str) -> Self {
        Self::from_bytes(s.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_is_terminated() {
        let s = GrowableString::from("hello");
        assert_eq!(s.len(), 5);
        assert_eq!(s.capacity(), 6);
        assert_eq!(s.as_bytes_with_nul(), b"hello\0");
        assert!(s.invariants_hold());
    }

    #[test]
    fn test_empty_string() {
        let s = GrowableString::from("");
        assert!(s.is_empty());
        assert_eq!(s.as_bytes_with_nul(), b"\0");
        assert!(s.invariants_hold());
    }

    #[test]
    fn test_from_int() {
        assert_eq!(GrowableString::from_int(0).to_string(), "0");
        assert_eq!(GrowableString::from_int(-42).to_string(), "-42");
        assert_eq!(
            GrowableString::from_int(i64::MAX).to_string(),
            "9223372036854775807"
        );
    }

    #[test]
    fn test_concat_leaves_inputs() {
        let a = GrowableString::from("foo");
        let b = GrowableString::from("bar");
        let c = a.concat(b.as_bytes());
        assert_eq!(c.to_string(), "foobar");
        assert_eq!(a.to_string(), "foo");
        assert_eq!(b.to_string(), "bar");
        assert!(c.invariants_hold());
    }

    #[test]
    fn test_substring_bounds() {
        let s = GrowableString::from("abcdef");
        assert_eq!(s.substring(1, 4).unwrap().to_string(), "bcd");
        assert!(s.substring(0, 0).unwrap().is_empty());
        assert!(s.substring(6, 6).unwrap().is_empty());
        assert_eq!(
            s.substring(2, 1),
            Err(RuntimeError::Range { begin: 2, end: 1, len: 6 })
        );
        assert!(s.substring(0, 7).is_err());
    }

    #[test]
    fn test_reverse() {
        assert_eq!(GrowableString::from("abc").reversed().to_string(), "cba");
        assert_eq!(GrowableString::from("").reversed().to_string(), "");
    }

    #[test]
    fn test_case_mapping_range() {
        let s = GrowableString::from("hello world");
        assert_eq!(s.upper(0, 5).unwrap().to_string(), "HELLO world");
        assert_eq!(s.upper(6, 11).unwrap().to_string(), "hello WORLD");
        let loud = GrowableString::from("ABC-DEF");
        assert_eq!(loud.lower(4, 7).unwrap().to_string(), "ABC-def");
        assert!(loud.lower(5, 4).is_err());
        assert_eq!(loud.to_string(), "ABC-DEF");
    }

    #[test]
    fn test_append_grows() {
        let mut s = GrowableString::from("ab");
        s.append(b"cdefgh");
        assert_eq!(s.to_string(), "abcdefgh");
        assert!(s.invariants_hold());
        s.append(b"");
        assert_eq!(s.len(), 8);
        assert_eq!(s.as_bytes_with_nul().last(), Some(&0));
    }
}
