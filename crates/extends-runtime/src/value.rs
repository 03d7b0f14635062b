//! Tagged slot values
//!
//! A slot is a tagged union: the tag and its payload cannot disagree. At the
//! C boundary a slot is flattened into `(i64, tag)`, with STRING and ARRAY
//! payloads carried as handle ids.

use std::fmt;

use crate::handle::{ArrayHandle, StrHandle};

/// Value type tags - must match the `type` enum in the host header
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Int = 0,
    String = 1,
    Array = 2,
}

impl Tag {
    pub fn from_code(code: i32) -> Option<Tag> {
        match code {
            0 => Some(Tag::Int),
            1 => Some(Tag::String),
            2 => Some(Tag::Array),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// Label reported by `get_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Int => "INT",
            Tag::String => "STRING",
            Tag::Array => "ARRAY",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One array element. STRING and ARRAY payloads are weak references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i64),
    Str(StrHandle),
    Array(ArrayHandle),
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl Value {
    pub fn tag(self) -> Tag {
        match self {
            Value::Int(_) => Tag::Int,
            Value::Str(_) => Tag::String,
            Value::Array(_) => Tag::Array,
        }
    }

    /// Flatten to the slot integer: the value itself, or the handle id.
    pub fn raw(self) -> i64 {
        match self {
            Value::Int(n) => n,
            Value::Str(h) => h.id() as i64,
            Value::Array(h) => h.id() as i64,
        }
    }

    /// Rebuild a value from a slot integer and its tag.
    pub fn from_raw(raw: i64, tag: Tag) -> Value {
        match tag {
            Tag::Int => Value::Int(raw),
            Tag::String => Value::Str(StrHandle::from_raw(raw as u64)),
            Tag::Array => Value::Array(ArrayHandle::from_raw(raw as u64)),
        }
    }

    pub fn as_int(self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<StrHandle> for Value {
    fn from(h: StrHandle) -> Self {
        Value::Str(h)
    }
}

impl From<ArrayHandle> for Value {
    fn from(h: ArrayHandle) -> Self {
        Value::Array(h)
    }
}
