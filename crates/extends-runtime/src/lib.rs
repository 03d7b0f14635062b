//! Runtime support library for compiled host programs.
//!
//! Provides the dynamic string and heterogeneous array primitives the host
//! language lacks natively:
//! - Growable, NUL-terminated strings (`string`)
//! - Arrays of tagged INT / STRING / ARRAY slots (`array`, `value`)
//! - Handle tables that own both kinds of object (`handle`, `runtime`)
//! - C entry points for generated code (`ffi`)
//!
//! Arrays reference strings and other arrays weakly, by handle. Destroying
//! an object that is still referenced is reported as a stale handle on the
//! next access instead of being undefined behaviour.

pub mod array;
pub mod buffer;
pub mod config;
pub mod error;
pub mod ffi;
pub mod handle;
pub mod io;
pub mod runtime;
pub mod string;
pub mod value;

pub use array::TaggedArray;
pub use config::RuntimeConfig;
pub use error::{HandleKind, Result, RuntimeError};
pub use handle::{ArrayHandle, HandleStats, StrHandle};
pub use runtime::Runtime;
pub use string::GrowableString;
pub use value::{Tag, Value};
