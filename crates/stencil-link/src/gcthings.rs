use stencil_gc::{GcCellPtr, Heap, HeapError, ScopeId, ScriptId};

/// Where one GC-thing slot of a script gets its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcThingSource {
    /// The global object's empty scope, owned by the context.
    EmptyGlobalScope,
}

impl GcThingSource {
    /// Produces the cell for this slot.
    pub fn finish(self, heap: &Heap, empty_global_scope: ScopeId) -> Result<GcCellPtr, HeapError> {
        match self {
            GcThingSource::EmptyGlobalScope => {
                // Already rooted by the context; only check it is still there.
                heap.scope(empty_global_scope)?;
                Ok(GcCellPtr::Scope(empty_global_scope))
            }
        }
    }
}

/// The ordered GC things a script links to. Slot `i` of the script's private
/// data is filled from entry `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcThingPlan {
    things: Vec<GcThingSource>,
}

impl GcThingPlan {
    /// A top-level script with a single, empty global body scope.
    pub fn for_global_script() -> Self {
        Self {
            things: vec![GcThingSource::EmptyGlobalScope],
        }
    }

    pub fn len(&self) -> usize {
        self.things.len()
    }

    pub fn is_empty(&self) -> bool {
        self.things.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = GcThingSource> + '_ {
        self.things.iter().copied()
    }

    /// Fills the private data of `script`, which must already have `len()` slots.
    pub fn finish_into(
        &self,
        heap: &mut Heap,
        script: ScriptId,
        empty_global_scope: ScopeId,
    ) -> Result<(), HeapError> {
        for (index, source) in self.iter().enumerate() {
            let thing = source.finish(heap, empty_global_scope)?;
            heap.init_gc_thing(script, index, thing)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use stencil_gc::{HeapLimits, ScopeKind};

    use super::*;

    #[test]
    fn test_global_plan_has_one_scope() {
        let plan = GcThingPlan::for_global_script();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.iter().collect::<Vec<_>>(), vec![GcThingSource::EmptyGlobalScope]);
    }

    #[test]
    fn test_finish_rejects_collected_scope() {
        let mut heap = Heap::new(HeapLimits::default());
        let scope = heap.alloc_scope(ScopeKind::Global, None).unwrap();
        heap.collect_garbage();
        assert_eq!(
            GcThingSource::EmptyGlobalScope.finish(&heap, scope),
            Err(HeapError::StaleReference(GcCellPtr::Scope(scope).id()))
        );
    }
}
