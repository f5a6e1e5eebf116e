use stencil_ffi::{CompileBridge, ForeignParser};
use stencil_gc::{Context, ScriptId};
use stencil_source::{report_error, CompileDiagnostic};

use crate::classify::{classify, Outcome};
use crate::error::LinkError;
use crate::materialize::materialize;

/// Result of a compilation that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    /// A shared script, not yet rooted.
    Compiled(ScriptId),
    /// The front end declined the source; use the general compiler.
    Unimplemented,
}

/// Compiles `source` as a top-level script through the foreign front end.
///
/// The stencil is released before this returns, on every path. A syntax
/// error is reported to the context's diagnostic sink and also returned.
pub fn compile_script<P: ForeignParser>(
    cx: &mut Context,
    bridge: &CompileBridge<P>,
    source: &[u8],
) -> Result<CompileOutcome, LinkError> {
    let options = *cx.options();
    let stencil = bridge.compile(source, &options);
    let descriptor = stencil.descriptor()?;

    match classify(&descriptor) {
        Outcome::SyntaxError(message) => {
            let diagnostic = CompileDiagnostic::foreign_compile_error(message);
            report_error(cx.diagnostics_mut(), diagnostic.clone());
            Err(LinkError::Syntax(diagnostic))
        }
        Outcome::Unimplemented => {
            log::warn!("Foreign front end declined the source; falling back");
            Ok(CompileOutcome::Unimplemented)
        }
        Outcome::Success => {
            let script = materialize(cx, &descriptor, source.len()).map_err(|err| {
                if matches!(err, LinkError::OutOfMemory) {
                    log::error!("Out of memory while materializing a stencil");
                }
                err
            })?;
            log::info!(
                "Compiled {} bytes of source into {:?}",
                source.len(),
                script
            );
            Ok(CompileOutcome::Compiled(script))
        }
    }
}
