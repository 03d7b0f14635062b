//! Print collaborators
//!
//! Thin wrappers used by generated code for diagnostics. They write to any
//! [`Write`] so they can be checked without capturing stdout; the C entry
//! points bind them to stdout.

use std::io::Write;

use crate::{
    error::Result,
    handle::{ArrayHandle, StrHandle},
    runtime::Runtime,
};

/// Write `n` in decimal, without a newline.
pub fn print_int(out: &mut impl Write, n: i64) -> Result<()> {
    write!(out, "{n}")?;
    out.flush()?;
    Ok(())
}

/// Write the string's bytes, without a newline.
pub fn print_str(rt: &Runtime, out: &mut impl Write, s: StrHandle) -> Result<()> {
    let bytes = rt.string_bytes(s)?;
    out.write_all(&bytes)?;
    out.flush()?;
    Ok(())
}

/// Write the rendering of `a` followed by a newline.
pub fn print_array(rt: &Runtime, out: &mut impl Write, a: ArrayHandle) -> Result<()> {
    let rendered = rt.render(a)?;
    out.write_all(rendered.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}

/// Decimal form of a handle id, for debugging.
pub fn handle_to_string(rt: &Runtime, id: u64) -> StrHandle {
    rt.string_new(id.to_string().as_bytes())
}
