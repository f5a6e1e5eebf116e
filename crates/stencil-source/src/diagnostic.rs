//! Diagnostic types for compile errors raised by the foreign front end.
//!
//! The foreign parser only hands back a message. Location information is not
//! carried across the boundary, so diagnostics built from a stencil use a fixed
//! placeholder location (no file name, line 1, column 0).
//!
//! ## Miette Integration
//!
//! [`CompileDiagnostic`] implements miette's `Diagnostic` trait by hand so the
//! error code can be derived from its [`ErrorNumber`] at runtime.

use std::fmt;

use miette::{Diagnostic, Severity};
use thiserror::Error;

/// Error numbers understood by the host error reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorNumber {
    /// The foreign front end rejected the source text.
    ForeignCompileError,
}

impl ErrorNumber {
    /// Stable code shown next to rendered diagnostics.
    pub fn code(self) -> &'static str {
        match self {
            ErrorNumber::ForeignCompileError => "STENCIL-001",
        }
    }

    /// The error class the host raises for this number.
    pub fn exception_name(self) -> &'static str {
        match self {
            ErrorNumber::ForeignCompileError => "SyntaxError",
        }
    }
}

/// A compile-time error ready to be handed to the host error reporter.
///
/// # Fields
///
/// * `filename` - Source file name, `None` when unknown
/// * `line` - 1-based line of the error
/// * `column` - 0-based column of the error
/// * `is_muted` - Whether the source is muted (cross-origin) and details must be hidden
/// * `message` - Message text produced by the front end
/// * `error_number` - Which host error this diagnostic maps to
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileDiagnostic {
    pub filename: Option<String>,
    pub line: u32,
    pub column: u32,
    pub is_muted: bool,
    pub message: String,
    pub error_number: ErrorNumber,
}

impl CompileDiagnostic {
    /// Builds a diagnostic for a foreign compile failure at the placeholder location.
    pub fn foreign_compile_error(message: impl Into<String>) -> Self {
        Self {
            filename: None,
            line: 1,
            column: 0,
            is_muted: false,
            message: message.into(),
            error_number: ErrorNumber::ForeignCompileError,
        }
    }

    /// Name of the file for display, `"<unknown>"` when absent.
    pub fn display_filename(&self) -> &str {
        self.filename.as_deref().unwrap_or("<unknown>")
    }
}

impl Diagnostic for CompileDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.error_number.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!(
            "{} at {}:{}:{}",
            self.error_number.exception_name(),
            self.display_filename(),
            self.line,
            self.column
        )))
    }

    fn severity(&self) -> Option<Severity> {
        Some(Severity::Error)
    }
}

/// Collects diagnostics reported during compilation.
///
/// Owned by the execution context; callers drain it after a failed compile.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    reported: Vec<CompileDiagnostic>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: CompileDiagnostic) {
        self.reported.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }

    pub fn len(&self) -> usize {
        self.reported.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompileDiagnostic> {
        self.reported.iter()
    }

    /// Removes and returns every diagnostic reported so far.
    pub fn drain(&mut self) -> Vec<CompileDiagnostic> {
        std::mem::take(&mut self.reported)
    }
}

/// Reports a diagnostic to the sink and logs it.
pub fn report_error(sink: &mut DiagnosticSink, diagnostic: CompileDiagnostic) {
    log::info!(
        "{} [{}] {}:{}:{}: {}",
        diagnostic.error_number.exception_name(),
        diagnostic.error_number.code(),
        diagnostic.display_filename(),
        diagnostic.line,
        diagnostic.column,
        diagnostic.message
    );
    sink.push(diagnostic);
}
