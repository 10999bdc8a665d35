#![forbid(unsafe_code)]

//! Core types shared by every Rive compiler stage: source spans, the
//! source map used for diagnostics, the compiler error type, and the
//! type system registry.

mod error;

/// Source text span utilities used by the front-end.
pub mod source;

/// Byte-offset to line/column mapping and diagnostic rendering.
pub mod source_map;

/// The Rive type system: type ids, kinds, memory strategies, registry.
pub mod types;

pub use error::{Error, Result};
pub use source::Span;
pub use source_map::SourceMap;
