//! C entry points for generated host code
//!
//! Every function works against one process-global [`Runtime`]. Slots cross
//! the boundary as `(i64, tag)` pairs where STRING and ARRAY payloads are
//! handle ids, never addresses.
//!
//! Failures return a sentinel (0, a null pointer or the invalid handle) and
//! record the error for the calling thread; `ext_last_error_code` reads it
//! back. A successful call resets the code to 0.

use std::cell::{Cell, RefCell};
use std::ffi::{CStr, CString, c_char};
use std::io;
use std::sync::LazyLock;

use tracing::warn;

use crate::{
    error::{Result, RuntimeError},
    handle::{ArrayHandle, StrHandle},
    io::{handle_to_string, print_array, print_int, print_str},
    runtime::Runtime,
    value::{Tag, Value},
};

static RUNTIME: LazyLock<Runtime> = LazyLock::new(Runtime::new);

/// The runtime behind the C entry points.
pub fn global_runtime() -> &'static Runtime {
    &RUNTIME
}

thread_local! {
    static LAST_ERROR_CODE: Cell<i32> = const { Cell::new(0) };
    static LAST_ERROR_MESSAGE: RefCell<CString> = RefCell::new(CString::default());
}

fn report<T>(call: &'static str, result: Result<T>, fallback: T) -> T {
    match result {
        Ok(value) => {
            LAST_ERROR_CODE.set(0);
            value
        }
        Err(err) => {
            warn!(call, error = %err, "runtime call failed");
            LAST_ERROR_CODE.set(err.code());
            // Display output never contains NUL.
            let message = CString::new(err.to_string()).unwrap_or_default();
            LAST_ERROR_MESSAGE.set(message);
            fallback
        }
    }
}

fn index(i: i64) -> Result<usize> {
    usize::try_from(i).map_err(|_| RuntimeError::NegativeIndex { index: i })
}

fn range(begin: i64, end: i64) -> Result<(usize, usize)> {
    match (usize::try_from(begin), usize::try_from(end)) {
        (Ok(begin), Ok(end)) => Ok((begin, end)),
        _ => Err(RuntimeError::NegativeRange { begin, end }),
    }
}

fn slot(raw: i64, tag: i32) -> Result<Value> {
    let tag = Tag::from_code(tag).ok_or(RuntimeError::UnknownTag(tag))?;
    Ok(Value::from_raw(raw, tag))
}

// =============================================================================
// Errors
// =============================================================================

/// Code of the last failure on this thread, 0 if the last call succeeded.
#[unsafe(no_mangle)]
pub extern "C" fn ext_last_error_code() -> i32 {
    LAST_ERROR_CODE.get()
}

/// Message of the last failure on this thread. Valid until the next failure.
#[unsafe(no_mangle)]
pub extern "C" fn ext_last_error_message() -> *const c_char {
    LAST_ERROR_MESSAGE.with_borrow(|message| message.as_ptr())
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_clear_error() {
    LAST_ERROR_CODE.set(0);
    LAST_ERROR_MESSAGE.set(CString::default());
}

// =============================================================================
// Strings
// =============================================================================

/// Copy a NUL-terminated C string. A null pointer yields the empty string.
///
/// # Safety
/// `data` must be null or point to a NUL-terminated buffer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ext_string_new(data: *const c_char) -> StrHandle {
    let bytes = if data.is_null() {
        &[][..]
    } else {
        unsafe { CStr::from_ptr(data) }.to_bytes()
    };
    report("string_new", Ok(RUNTIME.string_new(bytes)), StrHandle::INVALID)
}

/// Copy `len` bytes starting at `data`.
///
/// # Safety
/// `data` must be null or valid for reads of `len` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn ext_string_from_bytes(data: *const u8, len: usize) -> StrHandle {
    let bytes = if data.is_null() || len == 0 {
        &[][..]
    } else {
        unsafe { std::slice::from_raw_parts(data, len) }
    };
    report("string_from_bytes", Ok(RUNTIME.string_new(bytes)), StrHandle::INVALID)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_int_to_string(n: i64) -> StrHandle {
    report("int_to_string", Ok(RUNTIME.string_from_int(n)), StrHandle::INVALID)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_string_concat(a: StrHandle, b: StrHandle) -> StrHandle {
    report("string_concat", RUNTIME.string_concat(a, b), StrHandle::INVALID)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_substring(s: StrHandle, begin: i64, end: i64) -> StrHandle {
    let result = range(begin, end).and_then(|(begin, end)| RUNTIME.substring(s, begin, end));
    report("substring", result, StrHandle::INVALID)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_string_reverse(s: StrHandle) -> StrHandle {
    report("string_reverse", RUNTIME.string_reverse(s), StrHandle::INVALID)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_string_upper(s: StrHandle, begin: i64, end: i64) -> StrHandle {
    let result = range(begin, end).and_then(|(begin, end)| RUNTIME.string_upper(s, begin, end));
    report("string_upper", result, StrHandle::INVALID)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_string_lower(s: StrHandle, begin: i64, end: i64) -> StrHandle {
    let result = range(begin, end).and_then(|(begin, end)| RUNTIME.string_lower(s, begin, end));
    report("string_lower", result, StrHandle::INVALID)
}

/// Append `s2` to `s`; use the returned handle from here on.
#[unsafe(no_mangle)]
pub extern "C" fn ext_string_append(s: StrHandle, s2: StrHandle) -> StrHandle {
    report("string_append", RUNTIME.append(s, s2), StrHandle::INVALID)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_string_len(s: StrHandle) -> i64 {
    report("string_len", RUNTIME.string_len(s).map(|len| len as i64), 0)
}

/// Pointer to the string's NUL-terminated bytes.
///
/// Valid until the next mutation or destruction of `s`.
#[unsafe(no_mangle)]
pub extern "C" fn ext_string_data(s: StrHandle) -> *const c_char {
    report(
        "string_data",
        RUNTIME.with_string(s, |string| string.as_bytes_with_nul().as_ptr() as *const c_char),
        std::ptr::null(),
    )
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_string_free(s: StrHandle) {
    report("string_free", RUNTIME.string_destroy(s), ())
}

// =============================================================================
// Arrays
// =============================================================================

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_new(size: i64) -> ArrayHandle {
    let result = index(size).and_then(|size| RUNTIME.array_new(size));
    report("array_new", result, ArrayHandle::INVALID)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_copy(a: ArrayHandle) -> ArrayHandle {
    report("array_copy", RUNTIME.array_copy(a), ArrayHandle::INVALID)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_slice(a: ArrayHandle, begin: i64, end: i64) -> ArrayHandle {
    let result = range(begin, end).and_then(|(begin, end)| RUNTIME.array_slice(a, begin, end));
    report("array_slice", result, ArrayHandle::INVALID)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_free(a: ArrayHandle) {
    report("array_free", RUNTIME.array_destroy(a), ())
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_put(a: ArrayHandle, i: i64, n: i64, tag: i32) {
    let result = slot(n, tag).and_then(|value| RUNTIME.put(a, index(i)?, value));
    report("array_put", result, ())
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_push(a: ArrayHandle, n: i64, tag: i32) {
    let result = slot(n, tag).and_then(|value| RUNTIME.push(a, value));
    report("array_push", result, ())
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_pop(a: ArrayHandle) -> i64 {
    report("array_pop", RUNTIME.pop(a).map(Value::raw), 0)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_shift(a: ArrayHandle) -> i64 {
    report("array_shift", RUNTIME.shift(a).map(Value::raw), 0)
}

/// Insert at the front; returns the new size.
#[unsafe(no_mangle)]
pub extern "C" fn ext_array_unshift(a: ArrayHandle, n: i64, tag: i32) -> i64 {
    let result = slot(n, tag)
        .and_then(|value| RUNTIME.unshift(a, value))
        .map(|size| size as i64);
    report("array_unshift", result, 0)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_insert(a: ArrayHandle, i: i64, n: i64, tag: i32) {
    let result = slot(n, tag).and_then(|value| RUNTIME.insert(a, index(i)?, value));
    report("array_insert", result, ())
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_remove_at(a: ArrayHandle, i: i64) {
    let result = index(i).and_then(|i| RUNTIME.remove_at(a, i));
    report("array_remove_at", result.map(|_| ()), ())
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_reverse(a: ArrayHandle) {
    report("array_reverse", RUNTIME.reverse(a), ())
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_sort(a: ArrayHandle) {
    report("array_sort", RUNTIME.sort(a), ())
}

/// Raw slot integer; interpret it with `ext_array_get_type`.
#[unsafe(no_mangle)]
pub extern "C" fn ext_array_get(a: ArrayHandle, i: i64) -> i64 {
    let result = index(i).and_then(|i| RUNTIME.get(a, i));
    report("array_get", result.map(Value::raw), 0)
}

/// `"INT"`, `"STRING"` or `"ARRAY"` as a static C string.
#[unsafe(no_mangle)]
pub extern "C" fn ext_array_get_type(a: ArrayHandle, i: i64) -> *const c_char {
    let result = index(i)
        .and_then(|i| RUNTIME.get_type(a, i))
        .map(|tag| match tag {
            Tag::Int => c"INT".as_ptr(),
            Tag::String => c"STRING".as_ptr(),
            Tag::Array => c"ARRAY".as_ptr(),
        });
    report("array_get_type", result, std::ptr::null())
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_size(a: ArrayHandle) -> i64 {
    report("array_size", RUNTIME.array_size(a).map(|len| len as i64), 0)
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_array_stringify(a: ArrayHandle) -> StrHandle {
    report("array_stringify", RUNTIME.stringify(a), StrHandle::INVALID)
}

// =============================================================================
// Printing
// =============================================================================

#[unsafe(no_mangle)]
pub extern "C" fn ext_print_array(a: ArrayHandle) {
    report("print_array", print_array(&RUNTIME, &mut io::stdout(), a), ())
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_print_int(n: i64) {
    report("print_int", print_int(&mut io::stdout(), n), ())
}

#[unsafe(no_mangle)]
pub extern "C" fn ext_print_str(s: StrHandle) {
    report("print_str", print_str(&RUNTIME, &mut io::stdout(), s), ())
}

/// Decimal form of a handle id as a new string.
#[unsafe(no_mangle)]
pub extern "C" fn ext_handle_to_string(id: u64) -> StrHandle {
    report(
        "handle_to_string",
        Ok(handle_to_string(&RUNTIME, id)),
        StrHandle::INVALID,
    )
}
