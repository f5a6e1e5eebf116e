use std::mem::size_of;
use std::rc::Rc;

use crate::heap::{Cell, Heap};
use crate::tracer::{Trace, Tracer};
use crate::{AtomId, GcCellPtr, HeapError, ScriptId};

/// Where a script's source text sits, plus the position of its first character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceExtent {
    pub source_start: u32,
    pub source_end: u32,
    pub to_string_start: u32,
    pub to_string_end: u32,
    pub lineno: u32,
    pub column: u32,
}

impl SourceExtent {
    /// Extent covering a whole top-level source of `length` bytes.
    pub fn for_source(length: u32, lineno: u32, column: u32) -> Self {
        Self {
            source_start: 0,
            source_end: length,
            to_string_start: 0,
            to_string_end: length,
            lineno,
            column,
        }
    }
}

/// Immutable classification flags of a script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ScriptFlags {
    pub strict: bool,
    pub bindings_accessed_dynamically: bool,
    pub has_call_site_obj: bool,
    pub is_for_eval: bool,
    pub is_module: bool,
    pub is_function: bool,
    pub has_non_syntactic_scope: bool,
    pub needs_function_environment_objects: bool,
    pub has_module_goal: bool,
    pub no_script_rval: bool,
}

/// Per-script storage for the GC things referenced by index from bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateScriptData {
    gcthings: Box<[Option<GcCellPtr>]>,
}

impl PrivateScriptData {
    pub fn gcthings(&self) -> &[Option<GcCellPtr>] {
        &self.gcthings
    }
}

/// Bytecode, source notes and the scalar metadata derived from them.
///
/// Holds no GC pointers, so once a script is shared this data can be reused by
/// every script with identical contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImmutableScriptData {
    code_length: u32,
    code_and_notes: Box<[u8]>,
    pub main_offset: u32,
    pub nfixed: u32,
    pub nslots: u32,
    pub body_scope_index: u32,
    pub num_ic_entries: u32,
    pub num_type_sets: u32,
}

impl ImmutableScriptData {
    fn new(code_length: u32, note_length: u32) -> Self {
        let total = code_length as usize + note_length as usize;
        Self {
            code_length,
            code_and_notes: vec![0; total].into_boxed_slice(),
            main_offset: 0,
            nfixed: 0,
            nslots: 0,
            body_scope_index: 0,
            num_ic_entries: 0,
            num_type_sets: 0,
        }
    }

    pub fn code_length(&self) -> usize {
        self.code_length as usize
    }

    pub fn note_length(&self) -> usize {
        self.code_and_notes.len() - self.code_length()
    }

    /// Length of the combined code and notes buffer.
    pub fn total_length(&self) -> usize {
        self.code_and_notes.len()
    }

    pub fn code(&self) -> &[u8] {
        &self.code_and_notes[..self.code_length()]
    }

    pub fn notes(&self) -> &[u8] {
        &self.code_and_notes[self.code_length()..]
    }

    pub fn code_mut(&mut self) -> &mut [u8] {
        let code_length = self.code_length();
        &mut self.code_and_notes[..code_length]
    }

    pub fn notes_mut(&mut self) -> &mut [u8] {
        let code_length = self.code_length();
        &mut self.code_and_notes[code_length..]
    }
}

#[derive(Debug)]
enum ScriptData {
    Absent,
    Owned(Box<ImmutableScriptData>),
    Shared(Rc<ImmutableScriptData>),
}

/// An executable script cell.
///
/// Built in steps (private data, atom table, immutable data) and then
/// shared, after which it rejects every mutation.
#[derive(Debug)]
pub struct Script {
    extent: SourceExtent,
    flags: ScriptFlags,
    private_data: Option<PrivateScriptData>,
    atoms: Option<Box<[Option<AtomId>]>>,
    data: ScriptData,
}

impl Script {
    pub fn extent(&self) -> SourceExtent {
        self.extent
    }

    pub fn flags(&self) -> ScriptFlags {
        self.flags
    }

    pub fn private_data(&self) -> Option<&PrivateScriptData> {
        self.private_data.as_ref()
    }

    pub fn gcthings(&self) -> &[Option<GcCellPtr>] {
        self.private_data
            .as_ref()
            .map_or(&[][..], PrivateScriptData::gcthings)
    }

    pub fn natoms(&self) -> usize {
        self.atoms.as_ref().map_or(0, |atoms| atoms.len())
    }

    pub fn atoms(&self) -> &[Option<AtomId>] {
        self.atoms.as_deref().unwrap_or(&[])
    }

    pub fn immutable_data(&self) -> Option<&ImmutableScriptData> {
        match &self.data {
            ScriptData::Absent => None,
            ScriptData::Owned(data) => Some(&**data),
            ScriptData::Shared(data) => Some(&**data),
        }
    }

    /// The shared immutable data, once the script is sealed.
    pub fn shared_data(&self) -> Option<&Rc<ImmutableScriptData>> {
        match &self.data {
            ScriptData::Shared(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self.data, ScriptData::Shared(_))
    }

    fn ensure_mutable(&self) -> Result<(), HeapError> {
        if self.is_shared() {
            return Err(HeapError::ScriptSealed);
        }
        Ok(())
    }
}

impl Trace for Script {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        for thing in self.gcthings() {
            tracer.visit_opt(*thing);
        }
        for atom in self.atoms() {
            tracer.visit_opt(atom.map(GcCellPtr::Atom));
        }
    }
}

impl Heap {
    /// Allocates an empty script shell.
    pub fn alloc_script(&mut self, extent: SourceExtent) -> Result<ScriptId, HeapError> {
        let script = Script {
            extent,
            flags: ScriptFlags::default(),
            private_data: None,
            atoms: None,
            data: ScriptData::Absent,
        };
        let id = self.alloc_cell(Cell::Script(Box::new(script)), size_of::<Script>())?;
        Ok(ScriptId(id))
    }

    pub fn script(&self, id: ScriptId) -> Result<&Script, HeapError> {
        match self.cell(id.0)? {
            Cell::Script(script) => Ok(&**script),
            other => Err(HeapError::WrongCellKind {
                id: id.0,
                expected: "script",
                actual: other.kind_name(),
            }),
        }
    }

    fn script_mut(&mut self, id: ScriptId) -> Result<&mut Script, HeapError> {
        match self.cell_mut(id.0)? {
            Cell::Script(script) => Ok(&mut **script),
            other => Err(HeapError::WrongCellKind {
                id: id.0,
                expected: "script",
                actual: other.kind_name(),
            }),
        }
    }

    /// Allocates the private data of `script` with `ngcthings` empty slots.
    ///
    /// Can collect; `script` must be rooted.
    pub fn create_private_data(&mut self, script: ScriptId, ngcthings: u32) -> Result<(), HeapError> {
        {
            let s = self.script(script)?;
            s.ensure_mutable()?;
            if s.private_data.is_some() {
                return Err(HeapError::AlreadyInitialized("private script data"));
            }
        }
        let bytes = size_of::<PrivateScriptData>()
            + ngcthings as usize * size_of::<Option<GcCellPtr>>();
        self.grow_cell(script.0, bytes)?;

        self.script_mut(script)?.private_data = Some(PrivateScriptData {
            gcthings: vec![None; ngcthings as usize].into_boxed_slice(),
        });
        Ok(())
    }

    /// Stores `thing` in GC-thing slot `index` of `script`, with a write barrier.
    pub fn init_gc_thing(
        &mut self,
        script: ScriptId,
        index: usize,
        thing: GcCellPtr,
    ) -> Result<(), HeapError> {
        if !self.is_live(thing.id()) {
            return Err(HeapError::StaleReference(thing.id()));
        }
        {
            let s = self.script_mut(script)?;
            s.ensure_mutable()?;
            let data = s
                .private_data
                .as_mut()
                .ok_or(HeapError::NotInitialized("private script data"))?;
            let len = data.gcthings.len();
            let slot = data
                .gcthings
                .get_mut(index)
                .ok_or(HeapError::IndexOutOfBounds {
                    what: "gcthings",
                    index,
                    len,
                })?;
            *slot = Some(thing);
        }
        self.post_write_barrier(script.0, thing);
        Ok(())
    }

    /// Allocates the atom table of `script` with `natoms` empty entries.
    ///
    /// Can collect; `script` must be rooted.
    pub fn create_atom_table(&mut self, script: ScriptId, natoms: u32) -> Result<(), HeapError> {
        {
            let s = self.script(script)?;
            s.ensure_mutable()?;
            if s.atoms.is_some() {
                return Err(HeapError::AlreadyInitialized("atom table"));
            }
        }
        let bytes = natoms as usize * size_of::<Option<AtomId>>();
        self.grow_cell(script.0, bytes)?;

        self.script_mut(script)?.atoms = Some(vec![None; natoms as usize].into_boxed_slice());
        Ok(())
    }

    /// Stores `atom` at `index` of the atom table of `script`, with a write barrier.
    pub fn init_atom(&mut self, script: ScriptId, index: usize, atom: AtomId) -> Result<(), HeapError> {
        if !self.is_live(atom.0) {
            return Err(HeapError::StaleReference(atom.0));
        }
        {
            let s = self.script_mut(script)?;
            s.ensure_mutable()?;
            let atoms = s
                .atoms
                .as_mut()
                .ok_or(HeapError::NotInitialized("atom table"))?;
            let len = atoms.len();
            let slot = atoms.get_mut(index).ok_or(HeapError::IndexOutOfBounds {
                what: "atom table",
                index,
                len,
            })?;
            *slot = Some(atom);
        }
        self.post_write_barrier(script.0, GcCellPtr::Atom(atom));
        Ok(())
    }

    /// Allocates the zeroed code and notes buffer of `script`.
    ///
    /// Can collect; `script` must be rooted.
    pub fn create_immutable_data(
        &mut self,
        script: ScriptId,
        code_length: u32,
        note_length: u32,
    ) -> Result<(), HeapError> {
        {
            let s = self.script(script)?;
            s.ensure_mutable()?;
            if !matches!(s.data, ScriptData::Absent) {
                return Err(HeapError::AlreadyInitialized("immutable script data"));
            }
        }
        let bytes = size_of::<ImmutableScriptData>() + code_length as usize + note_length as usize;
        self.grow_cell(script.0, bytes)?;

        self.script_mut(script)?.data =
            ScriptData::Owned(Box::new(ImmutableScriptData::new(code_length, note_length)));
        Ok(())
    }

    /// Mutable access to the immutable data of a script that is not yet shared.
    pub fn immutable_data_mut(&mut self, script: ScriptId) -> Result<&mut ImmutableScriptData, HeapError> {
        match &mut self.script_mut(script)?.data {
            ScriptData::Absent => Err(HeapError::NotInitialized("immutable script data")),
            ScriptData::Shared(_) => Err(HeapError::ScriptSealed),
            ScriptData::Owned(data) => Ok(&mut **data),
        }
    }

    pub fn set_script_flags(&mut self, script: ScriptId, flags: ScriptFlags) -> Result<(), HeapError> {
        let s = self.script_mut(script)?;
        s.ensure_mutable()?;
        s.flags = flags;
        Ok(())
    }

    /// Seals `script`: its immutable data moves into the heap's sharing table,
    /// reusing an identical entry when one exists.
    ///
    /// Can collect; `script` must be rooted.
    pub fn share_script_data(&mut self, script: ScriptId) -> Result<(), HeapError> {
        {
            let s = self.script(script)?;
            match s.data {
                ScriptData::Absent => return Err(HeapError::NotInitialized("immutable script data")),
                ScriptData::Shared(_) => return Err(HeapError::ScriptSealed),
                ScriptData::Owned(_) => {}
            }
        }
        self.grow_cell(script.0, size_of::<Rc<ImmutableScriptData>>())?;

        let data = {
            let s = self.script_mut(script)?;
            let ScriptData::Owned(data) = std::mem::replace(&mut s.data, ScriptData::Absent) else {
                return Err(HeapError::NotInitialized("immutable script data"));
            };
            data
        };

        let existing = self.shared_data.get(&*data).cloned();
        let shared = match existing {
            Some(existing) => {
                log::debug!("Reusing shared script data ({} bytes)", existing.total_length());
                // The copy charged by `create_immutable_data` is dropped here.
                self.shrink_cell(
                    script.0,
                    size_of::<ImmutableScriptData>() + data.total_length(),
                );
                existing
            }
            None => {
                let shared = Rc::new(*data);
                self.shared_data.insert(Rc::clone(&shared));
                shared
            }
        };
        self.script_mut(script)?.data = ScriptData::Shared(shared);
        Ok(())
    }

    /// Number of distinct immutable data entries in the sharing table.
    pub fn shared_data_count(&self) -> usize {
        self.shared_data.len()
    }
}
