use crate::heap::{slot_is_live, Slot};
use crate::{GcCellPtr, HeapId};

/// Implemented by every cell kind that holds GC edges.
pub(crate) trait Trace {
    fn trace(&self, tracer: &mut Tracer<'_>);
}

/// Mark-phase worklist over the heap's slot table.
pub(crate) struct Tracer<'a> {
    slots: &'a [Slot],
    marks: &'a mut [bool],
    worklist: Vec<HeapId>,
}

impl<'a> Tracer<'a> {
    pub(crate) fn new(slots: &'a [Slot], marks: &'a mut [bool]) -> Self {
        Self {
            slots,
            marks,
            worklist: Vec::new(),
        }
    }

    /// Marks `ptr` and queues it for tracing. Stale pointers are skipped;
    /// they can only come from a root that outlived its cell.
    pub(crate) fn visit(&mut self, ptr: GcCellPtr) {
        let id = ptr.id();
        if !slot_is_live(self.slots, id) {
            log::warn!("Skipping stale reference {:?} during marking", id);
            return;
        }
        if self.marks[id.index()] {
            return;
        }
        self.marks[id.index()] = true;
        self.worklist.push(id);
    }

    pub(crate) fn visit_opt(&mut self, ptr: Option<GcCellPtr>) {
        if let Some(ptr) = ptr {
            self.visit(ptr);
        }
    }

    /// Traces everything reachable from the queued cells.
    pub(crate) fn drain(&mut self) {
        let slots = self.slots;
        while let Some(id) = self.worklist.pop() {
            if let Some(cell) = slots[id.index()].cell.as_ref() {
                cell.trace(self);
            }
        }
    }
}
