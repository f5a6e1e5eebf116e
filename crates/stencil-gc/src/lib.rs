//! Managed heap services consumed by the stencil bridge.
//!
//! The heap is a slot table addressed by generational ids. A collection
//! marks everything reachable from the stack roots and the persistent roots
//! and frees the rest; freed slots bump their generation so an id that was
//! held across an allocation without being rooted is reported as stale
//! instead of silently aliasing a new cell.

mod atom;
mod context;
mod error;
mod heap;
mod roots;
mod scope;
mod script;
mod tracer;

pub use atom::Atom;
pub use context::Context;
pub use error::HeapError;
pub use heap::{Heap, HeapLimits, HeapStats};
pub use roots::{RootId, RootScope};
pub use scope::{Scope, ScopeKind};
pub use script::{
    ImmutableScriptData, PrivateScriptData, Script, ScriptFlags, SourceExtent,
};

/// Address of a cell in the heap: slot index plus the slot's generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapId {
    index: u32,
    generation: u32,
}

impl HeapId {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomId(pub(crate) HeapId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) HeapId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptId(pub(crate) HeapId);

/// A tagged reference to any GC cell.
///
/// This is what root sets, store buffers and a script's GC-thing list hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcCellPtr {
    Atom(AtomId),
    Scope(ScopeId),
    Script(ScriptId),
}

impl GcCellPtr {
    pub fn id(self) -> HeapId {
        match self {
            GcCellPtr::Atom(AtomId(id)) => id,
            GcCellPtr::Scope(ScopeId(id)) => id,
            GcCellPtr::Script(ScriptId(id)) => id,
        }
    }
}

impl From<AtomId> for GcCellPtr {
    fn from(atom: AtomId) -> Self {
        GcCellPtr::Atom(atom)
    }
}

impl From<ScopeId> for GcCellPtr {
    fn from(scope: ScopeId) -> Self {
        GcCellPtr::Scope(scope)
    }
}

impl From<ScriptId> for GcCellPtr {
    fn from(script: ScriptId) -> Self {
        GcCellPtr::Script(script)
    }
}
