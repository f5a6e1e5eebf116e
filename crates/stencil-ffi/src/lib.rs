//! The boundary between the engine and the foreign front end.
//!
//! The front end compiles source text into a flat, position-independent
//! stencil and hands ownership of it across a C ABI. Everything it returns is
//! made of [`CVec`] buffers that only the front end may free, so the engine
//! wraps each result in a [`StencilGuard`] that releases it exactly once, on
//! whichever path the compilation leaves by.

mod bridge;
mod buffer;
mod descriptor;
mod parser;
mod producer;
mod raw;

pub use bridge::{CompileBridge, StencilGuard};
pub use buffer::CVec;
pub use descriptor::{DescriptorError, ScriptMetadata, StencilDescriptor, StencilFlags};
pub use parser::{CompileFn, ForeignParser, ForeignParserVtable, ProbeFn, ReleaseFn};
pub use producer::{free_raw_stencil, StencilParts};
pub use raw::{RawCompileOptions, RawStencil, SchemaVersion};
