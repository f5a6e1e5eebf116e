use miette::Diagnostic;
use stencil_ffi::DescriptorError;
use stencil_gc::HeapError;
use stencil_source::CompileDiagnostic;
use thiserror::Error;

/// Ways a compilation can fail to produce a script.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum LinkError {
    /// The front end rejected the source. Already reported to the context's sink.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(CompileDiagnostic),

    #[error("Out of memory while linking a script")]
    #[diagnostic(code("LINK-001"))]
    OutOfMemory,

    #[error("Heap error while linking a script: {0}")]
    #[diagnostic(code("LINK-002"))]
    Heap(HeapError),

    #[error("Unreadable stencil: {0}")]
    #[diagnostic(
        code("LINK-003"),
        help("The front end and the engine disagree on the stencil layout")
    )]
    Descriptor(#[from] DescriptorError),

    #[error("Inconsistent stencil: {0}")]
    #[diagnostic(code("LINK-004"))]
    InconsistentDescriptor(String),
}

impl From<HeapError> for LinkError {
    fn from(err: HeapError) -> Self {
        match err {
            HeapError::OutOfMemory => LinkError::OutOfMemory,
            other => LinkError::Heap(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_memory_is_its_own_variant() {
        assert!(matches!(
            LinkError::from(HeapError::OutOfMemory),
            LinkError::OutOfMemory
        ));
        assert!(matches!(
            LinkError::from(HeapError::InvalidUtf8),
            LinkError::Heap(HeapError::InvalidUtf8)
        ));
    }

    #[test]
    fn test_syntax_error_keeps_diagnostic_code() {
        let err = LinkError::Syntax(CompileDiagnostic::foreign_compile_error("unexpected token"));
        assert_eq!(err.to_string(), "unexpected token");
        assert_eq!(err.code().map(|c| c.to_string()).as_deref(), Some("STENCIL-001"));
    }
}
