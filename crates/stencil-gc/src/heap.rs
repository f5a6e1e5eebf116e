use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use stencil_source::HeapSettings;

use crate::atom::Atom;
use crate::scope::Scope;
use crate::script::{ImmutableScriptData, Script};
use crate::tracer::{Trace, Tracer};
use crate::{AtomId, GcCellPtr, HeapError, HeapId};

/// Size limits for the heap, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapLimits {
    /// An allocation that would push the heap past this size collects first
    pub gc_threshold: usize,
    /// An allocation that would still push the heap past this size fails
    pub max_bytes: usize,
}

impl Default for HeapLimits {
    fn default() -> Self {
        let settings = HeapSettings::default();
        Self {
            gc_threshold: settings.gc_threshold,
            max_bytes: settings.max_bytes,
        }
    }
}

impl From<&HeapSettings> for HeapLimits {
    fn from(settings: &HeapSettings) -> Self {
        Self {
            gc_threshold: settings.gc_threshold,
            max_bytes: settings.max_bytes,
        }
    }
}

/// Counters exposed for tests and logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub gc_runs: usize,
    pub allocations: usize,
    pub cells_swept: usize,
    pub write_barriers: usize,
}

pub(crate) enum Cell {
    Atom(Atom),
    Scope(Scope),
    Script(Box<Script>),
}

impl Cell {
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Cell::Atom(_) => "atom",
            Cell::Scope(_) => "scope",
            Cell::Script(_) => "script",
        }
    }
}

impl Trace for Cell {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        match self {
            Cell::Atom(_) => {}
            Cell::Scope(scope) => scope.trace(tracer),
            Cell::Script(script) => script.trace(tracer),
        }
    }
}

pub(crate) struct Slot {
    pub(crate) cell: Option<Cell>,
    generation: u32,
    bytes: usize,
}

/// A single-threaded, non-moving mark/sweep heap.
///
/// Every allocating method may run a collection before it allocates. Any id
/// held across such a call must be reachable from a root (see
/// [`Heap::root_scope`] and [`Heap::add_persistent_root`]).
pub struct Heap {
    limits: HeapLimits,
    /// Size that triggers the next collection. Grows with the live size.
    next_gc_threshold: usize,
    gc_zeal: bool,
    slots: Vec<Slot>,
    marks: Vec<bool>,
    free_list: Vec<u32>,
    used_bytes: usize,
    pub(crate) root_stack: Vec<GcCellPtr>,
    pub(crate) persistent_roots: Vec<Option<GcCellPtr>>,
    pub(crate) persistent_roots_free: Vec<u32>,
    pub(crate) atoms: FxHashMap<Box<str>, AtomId>,
    pub(crate) shared_data: FxHashSet<Rc<ImmutableScriptData>>,
    store_buffer: Vec<(HeapId, GcCellPtr)>,
    allocations_until_failure: Option<usize>,
    stats: HeapStats,
}

impl HeapLimits {
    pub fn validate(&self) -> Result<(), HeapError> {
        if self.gc_threshold > self.max_bytes {
            return Err(HeapError::InvalidLimits {
                gc_threshold: self.gc_threshold,
                max_bytes: self.max_bytes,
            });
        }
        Ok(())
    }
}

impl Heap {
    /// Creates an empty heap. A `gc_threshold` above `max_bytes` is lowered
    /// to `max_bytes`; use [`Heap::from_settings`] to reject it instead.
    pub fn new(limits: HeapLimits) -> Self {
        let limits = HeapLimits {
            gc_threshold: limits.gc_threshold.min(limits.max_bytes),
            max_bytes: limits.max_bytes,
        };
        Self {
            limits,
            next_gc_threshold: limits.gc_threshold,
            gc_zeal: false,
            slots: Vec::new(),
            marks: Vec::new(),
            free_list: Vec::new(),
            used_bytes: 0,
            root_stack: Vec::new(),
            persistent_roots: Vec::new(),
            persistent_roots_free: Vec::new(),
            atoms: FxHashMap::default(),
            shared_data: FxHashSet::default(),
            store_buffer: Vec::new(),
            allocations_until_failure: None,
            stats: HeapStats::default(),
        }
    }

    pub fn from_settings(settings: &HeapSettings) -> Result<Self, HeapError> {
        let limits = HeapLimits::from(settings);
        limits.validate()?;
        let mut heap = Self::new(limits);
        heap.set_gc_zeal(settings.gc_zeal);
        Ok(heap)
    }

    /// When enabled, every allocation collects first.
    pub fn set_gc_zeal(&mut self, enabled: bool) {
        self.gc_zeal = enabled;
    }

    /// Makes the allocation attempt after the next `n` fail with
    /// [`HeapError::OutOfMemory`]. The failure fires once.
    pub fn fail_allocation_after(&mut self, n: usize) {
        self.allocations_until_failure = Some(n);
    }

    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    /// Number of live cells.
    pub fn live_cells(&self) -> usize {
        self.slots.iter().filter(|slot| slot.cell.is_some()).count()
    }

    pub fn is_live(&self, id: HeapId) -> bool {
        slot_is_live(&self.slots, id)
    }

    /// Edges recorded by the write barrier since the last collection.
    pub fn store_buffer(&self) -> &[(HeapId, GcCellPtr)] {
        &self.store_buffer
    }

    /// Runs before storing `target` into a field of the already allocated
    /// cell `owner`, so the collector observes the new edge.
    pub fn post_write_barrier(&mut self, owner: HeapId, target: GcCellPtr) {
        self.stats.write_barriers += 1;
        self.store_buffer.push((owner, target));
    }

    /// Reserves `bytes` of heap budget, collecting and failing as configured.
    pub(crate) fn ensure_can_allocate(&mut self, bytes: usize) -> Result<(), HeapError> {
        self.stats.allocations += 1;

        match self.allocations_until_failure {
            Some(0) => {
                self.allocations_until_failure = None;
                log::error!("Injected allocation failure ({} bytes)", bytes);
                return Err(HeapError::OutOfMemory);
            }
            Some(n) => self.allocations_until_failure = Some(n - 1),
            None => {}
        }

        let after = self.used_bytes.saturating_add(bytes);
        if self.gc_zeal {
            self.collect_garbage();
        } else if after > self.next_gc_threshold {
            log::warn!(
                "Heap at {} bytes would pass threshold {}; collecting",
                after,
                self.next_gc_threshold
            );
            self.collect_garbage();
        }

        if self.used_bytes.saturating_add(bytes) > self.limits.max_bytes {
            log::error!(
                "Allocation of {} bytes exceeds heap limit {}",
                bytes,
                self.limits.max_bytes
            );
            return Err(HeapError::OutOfMemory);
        }
        Ok(())
    }

    pub(crate) fn alloc_cell(&mut self, cell: Cell, bytes: usize) -> Result<HeapId, HeapError> {
        self.ensure_can_allocate(bytes)?;

        let index = match self.free_list.pop() {
            Some(index) => index as usize,
            None => {
                let index = self.slots.len();
                if u32::try_from(index).is_err() {
                    return Err(HeapError::OutOfMemory);
                }
                self.slots.push(Slot {
                    cell: None,
                    generation: 0,
                    bytes: 0,
                });
                self.marks.push(false);
                index
            }
        };

        let slot = &mut self.slots[index];
        debug_assert!(slot.cell.is_none(), "free list returned an occupied slot");
        slot.cell = Some(cell);
        slot.bytes = bytes;
        self.used_bytes = self.used_bytes.saturating_add(bytes);
        Ok(HeapId::new(index as u32, slot.generation))
    }

    /// Charges `bytes` of side storage to the cell `id`.
    ///
    /// This can collect, so `id` must be rooted; a swept `id` is reported
    /// as stale.
    pub(crate) fn grow_cell(&mut self, id: HeapId, bytes: usize) -> Result<(), HeapError> {
        self.ensure_can_allocate(bytes)?;
        if !self.is_live(id) {
            return Err(HeapError::StaleReference(id));
        }
        self.slots[id.index()].bytes += bytes;
        self.used_bytes = self.used_bytes.saturating_add(bytes);
        Ok(())
    }

    /// Returns `bytes` of side storage charged to the cell `id`.
    pub(crate) fn shrink_cell(&mut self, id: HeapId, bytes: usize) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            let bytes = bytes.min(slot.bytes);
            slot.bytes -= bytes;
            self.used_bytes = self.used_bytes.saturating_sub(bytes);
        }
    }

    pub(crate) fn cell(&self, id: HeapId) -> Result<&Cell, HeapError> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.cell.as_ref())
            .ok_or(HeapError::StaleReference(id))
    }

    pub(crate) fn cell_mut(&mut self, id: HeapId) -> Result<&mut Cell, HeapError> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.cell.as_mut())
            .ok_or(HeapError::StaleReference(id))
    }

    /// Runs a full collection.
    pub fn collect_garbage(&mut self) {
        self.stats.gc_runs += 1;

        // Mark.
        {
            debug_assert_eq!(self.slots.len(), self.marks.len());
            self.marks.iter_mut().for_each(|mark| *mark = false);

            let mut tracer = Tracer::new(&self.slots, &mut self.marks);
            for root in &self.root_stack {
                tracer.visit(*root);
            }
            for root in self.persistent_roots.iter().flatten() {
                tracer.visit(*root);
            }
            tracer.drain();
        }

        // Sweep.
        let mut swept = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.cell.is_none() || self.marks[index] {
                continue;
            }
            self.used_bytes = self.used_bytes.saturating_sub(slot.bytes);
            slot.cell = None;
            slot.bytes = 0;
            slot.generation = slot.generation.wrapping_add(1);
            self.free_list.push(index as u32);
            swept += 1;
        }
        self.stats.cells_swept += swept;

        // Weak tables.
        let slots = &self.slots;
        self.atoms.retain(|_, atom| slot_is_live(slots, atom.0));
        self.shared_data.retain(|data| Rc::strong_count(data) > 1);
        self.store_buffer.clear();

        // Next collection once the live size doubles, capped by the hard limit.
        self.next_gc_threshold = self
            .used_bytes
            .saturating_mul(2)
            .min(self.limits.max_bytes)
            .max(self.limits.gc_threshold);

        log::debug!(
            "GC #{}: swept {} cells, {} bytes in use",
            self.stats.gc_runs,
            swept,
            self.used_bytes
        );
    }
}

pub(crate) fn slot_is_live(slots: &[Slot], id: HeapId) -> bool {
    slots
        .get(id.index())
        .map_or(false, |slot| slot.generation == id.generation() && slot.cell.is_some())
}
