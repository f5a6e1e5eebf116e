use stencil_source::{CompileOptions, DiagnosticSink, EngineConfig, LinkSettings};

use crate::{GcCellPtr, Heap, HeapError, RootId, ScopeId, ScopeKind};

/// The execution context a script is compiled in.
///
/// Owns the heap, the global's empty scope (kept alive by a persistent
/// root), the compile options and the sink compile errors are reported to.
pub struct Context {
    pub heap: Heap,
    empty_global_scope: ScopeId,
    global_scope_root: RootId,
    options: CompileOptions,
    link: LinkSettings,
    diagnostics: DiagnosticSink,
}

impl Context {
    pub fn new(config: &EngineConfig) -> Result<Self, HeapError> {
        let mut heap = Heap::from_settings(&config.heap)?;
        let empty_global_scope = heap.alloc_scope(ScopeKind::Global, None)?;
        let global_scope_root = heap.add_persistent_root(GcCellPtr::Scope(empty_global_scope));
        log::debug!("Context initialised (global scope {:?})", empty_global_scope);

        Ok(Self {
            heap,
            empty_global_scope,
            global_scope_root,
            options: config.compile,
            link: config.link,
            diagnostics: DiagnosticSink::new(),
        })
    }

    /// The global object's empty scope. Always rooted.
    pub fn empty_global_scope(&self) -> ScopeId {
        self.empty_global_scope
    }

    pub fn global_scope_root(&self) -> RootId {
        self.global_scope_root
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: CompileOptions) {
        self.options = options;
    }

    pub fn link_settings(&self) -> &LinkSettings {
        &self.link
    }

    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut DiagnosticSink {
        &mut self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_scope_survives_collection() {
        let mut cx = Context::new(&EngineConfig::default()).unwrap();
        cx.heap.collect_garbage();

        let scope = cx.heap.scope(cx.empty_global_scope()).unwrap();
        assert!(scope.is_empty_global());
        assert_eq!(scope.enclosing(), None);
        assert_eq!(
            cx.heap.persistent_root(cx.global_scope_root()),
            Some(GcCellPtr::Scope(cx.empty_global_scope()))
        );
    }

    #[test]
    fn test_inverted_heap_limits_are_an_error() {
        let mut config = EngineConfig::default();
        config.heap.gc_threshold = 4096;
        config.heap.max_bytes = 1024;
        assert!(matches!(
            Context::new(&config),
            Err(HeapError::InvalidLimits {
                gc_threshold: 4096,
                max_bytes: 1024,
            })
        ));
    }

    #[test]
    fn test_context_takes_config() {
        let mut config = EngineConfig::default();
        config.compile.no_result_value = true;
        config.link.validate_stencils = true;
        let cx = Context::new(&config).unwrap();
        assert!(cx.options().no_result_value);
        assert!(cx.link_settings().validate_stencils);
        assert!(cx.diagnostics().is_empty());
    }
}
