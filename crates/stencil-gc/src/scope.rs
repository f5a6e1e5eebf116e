use crate::heap::{Cell, Heap};
use crate::tracer::{Trace, Tracer};
use crate::{GcCellPtr, HeapError, ScopeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The global scope with no bindings of its own
    Global,
    /// A lexical or function body scope
    Lexical,
}

/// A scope cell. Scopes form a chain through `enclosing`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    kind: ScopeKind,
    enclosing: Option<ScopeId>,
    binding_count: u32,
}

impl Scope {
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn enclosing(&self) -> Option<ScopeId> {
        self.enclosing
    }

    pub fn binding_count(&self) -> u32 {
        self.binding_count
    }

    pub fn is_empty_global(&self) -> bool {
        self.kind == ScopeKind::Global && self.binding_count == 0
    }
}

impl Trace for Scope {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        tracer.visit_opt(self.enclosing.map(GcCellPtr::Scope));
    }
}

impl Heap {
    /// Allocates a scope without bindings.
    ///
    /// `enclosing` must be rooted by the caller: this call can collect.
    pub fn alloc_scope(
        &mut self,
        kind: ScopeKind,
        enclosing: Option<ScopeId>,
    ) -> Result<ScopeId, HeapError> {
        let id = self.alloc_cell(
            Cell::Scope(Scope {
                kind,
                enclosing,
                binding_count: 0,
            }),
            std::mem::size_of::<Scope>(),
        )?;
        if let Some(enclosing) = enclosing {
            // The enclosing scope may have been swept while we allocated.
            self.scope(enclosing)?;
        }
        Ok(ScopeId(id))
    }

    pub fn scope(&self, id: ScopeId) -> Result<&Scope, HeapError> {
        match self.cell(id.0)? {
            Cell::Scope(scope) => Ok(scope),
            other => Err(HeapError::WrongCellKind {
                id: id.0,
                expected: "scope",
                actual: other.kind_name(),
            }),
        }
    }
}
