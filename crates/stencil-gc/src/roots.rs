use crate::heap::Heap;
use crate::GcCellPtr;

/// Handle to a persistent root slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootId(u32);

/// A stack-rooting scope.
///
/// Cells pushed with [`RootScope::push_root`] stay reachable until the scope is
/// dropped, at which point the root stack is truncated back to its length at
/// entry. Allocations made through [`RootScope::heap_mut`] may collect; only
/// rooted cells survive them.
pub struct RootScope<'a> {
    heap: &'a mut Heap,
    root_stack_len_at_entry: usize,
}

impl Drop for RootScope<'_> {
    fn drop(&mut self) {
        self.heap.root_stack.truncate(self.root_stack_len_at_entry);
    }
}

impl<'a> RootScope<'a> {
    /// Pushes a stack root and hands the pointer back.
    pub fn push_root(&mut self, ptr: GcCellPtr) -> GcCellPtr {
        self.heap.root_stack.push(ptr);
        ptr
    }

    /// Number of roots pushed through this scope.
    pub fn len(&self) -> usize {
        self.heap.root_stack.len() - self.root_stack_len_at_entry
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates a nested scope over the same heap.
    pub fn reborrow(&mut self) -> RootScope<'_> {
        self.heap.root_scope()
    }

    pub fn heap(&self) -> &Heap {
        &*self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut *self.heap
    }
}

impl Heap {
    /// Enters a stack-rooting scope.
    pub fn root_scope(&mut self) -> RootScope<'_> {
        let root_stack_len_at_entry = self.root_stack.len();
        RootScope {
            heap: self,
            root_stack_len_at_entry,
        }
    }

    /// Number of stack roots currently registered.
    pub fn stack_root_len(&self) -> usize {
        self.root_stack.len()
    }

    /// Registers a root that lives until explicitly removed.
    pub fn add_persistent_root(&mut self, ptr: GcCellPtr) -> RootId {
        match self.persistent_roots_free.pop() {
            Some(index) => {
                self.persistent_roots[index as usize] = Some(ptr);
                RootId(index)
            }
            None => {
                let index = self.persistent_roots.len() as u32;
                self.persistent_roots.push(Some(ptr));
                RootId(index)
            }
        }
    }

    pub fn persistent_root(&self, id: RootId) -> Option<GcCellPtr> {
        self.persistent_roots.get(id.0 as usize).copied().flatten()
    }

    pub fn remove_persistent_root(&mut self, id: RootId) {
        if let Some(slot) = self.persistent_roots.get_mut(id.0 as usize) {
            if slot.take().is_some() {
                self.persistent_roots_free.push(id.0);
            }
        }
    }
}
