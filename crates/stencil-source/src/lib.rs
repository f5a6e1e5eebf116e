//! Diagnostics and configuration shared by the stencil bridge crates.
//!
//! This crate is responsible for:
//! - Describing compile-time errors raised while turning a stencil into a script
//! - Collecting those errors in a sink owned by the execution context
//! - Loading the engine configuration (compile options, heap limits, link checks)
//!
//! ## Diagnostics
//!
//! A failed foreign compilation is surfaced as a [`CompileDiagnostic`]. The
//! diagnostic carries the same fields a host error reporter expects (file name,
//! line, column, muted flag, message and error number) and integrates with
//! miette for rendering.

mod config;
mod diagnostic;
mod error;

pub use config::{CompileOptions, EngineConfig, HeapSettings, LinkSettings};
pub use diagnostic::{report_error, CompileDiagnostic, DiagnosticSink, ErrorNumber};
pub use error::ConfigError;
