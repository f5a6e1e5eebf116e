//! The front-end half of the boundary: building a [`RawStencil`] out of owned
//! Rust values and taking it apart again when the engine hands it back.

use crate::buffer::CVec;
use crate::descriptor::StencilFlags;
use crate::raw::{RawStencil, SchemaVersion};

/// An owned compile result, before it crosses the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StencilParts {
    pub version: u32,
    pub unimplemented: bool,
    pub error: Option<Vec<u8>>,
    pub bytecode: Vec<u8>,
    pub strings: Vec<Vec<u8>>,
    pub lineno: usize,
    pub column: usize,
    pub main_offset: usize,
    pub max_fixed_slots: u32,
    pub maximum_stack_depth: u32,
    pub body_scope_index: u32,
    pub num_ic_entries: u32,
    pub num_type_sets: u32,
    pub flags: StencilFlags,
}

impl Default for StencilParts {
    fn default() -> Self {
        Self {
            version: SchemaVersion::CURRENT as u32,
            unimplemented: false,
            error: None,
            bytecode: Vec::new(),
            strings: Vec::new(),
            lineno: 1,
            column: 0,
            main_offset: 0,
            max_fixed_slots: 0,
            maximum_stack_depth: 0,
            body_scope_index: 0,
            num_ic_entries: 0,
            num_type_sets: 0,
            flags: StencilFlags::default(),
        }
    }
}

impl StencilParts {
    pub fn success(bytecode: Vec<u8>, strings: Vec<Vec<u8>>) -> Self {
        Self {
            bytecode,
            strings,
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<Vec<u8>>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn unimplemented() -> Self {
        Self {
            unimplemented: true,
            ..Self::default()
        }
    }

    /// Hands every buffer over to a [`RawStencil`]. The result must be passed
    /// to [`free_raw_stencil`] exactly once.
    pub fn into_raw(self) -> RawStencil {
        let strings = self.strings.into_iter().map(CVec::from_vec).collect();
        RawStencil {
            version: self.version,
            unimplemented: self.unimplemented,
            error: self.error.map_or_else(CVec::null, CVec::from_vec),
            bytecode: CVec::from_vec(self.bytecode),
            strings: CVec::from_vec(strings),
            lineno: self.lineno,
            column: self.column,
            main_offset: self.main_offset,
            max_fixed_slots: self.max_fixed_slots,
            maximum_stack_depth: self.maximum_stack_depth,
            body_scope_index: self.body_scope_index,
            num_ic_entries: self.num_ic_entries,
            num_type_sets: self.num_type_sets,
            strict: self.flags.strict,
            bindings_accessed_dynamically: self.flags.bindings_accessed_dynamically,
            has_call_site_obj: self.flags.has_call_site_obj,
            is_for_eval: self.flags.is_for_eval,
            is_module: self.flags.is_module,
            is_function: self.flags.is_function,
            has_non_syntactic_scope: self.flags.has_non_syntactic_scope,
            needs_function_environment_objects: self.flags.needs_function_environment_objects,
            has_module_goal: self.flags.has_module_goal,
        }
    }
}

/// Frees every buffer of a stencil built by [`StencilParts::into_raw`].
///
/// # Safety
/// `raw` must come from [`StencilParts::into_raw`] in this allocator and must
/// not have been freed already.
pub unsafe extern "C" fn free_raw_stencil(raw: RawStencil) {
    drop(raw.error.into_vec());
    drop(raw.bytecode.into_vec());
    for string in raw.strings.into_vec() {
        drop(string.into_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_raw_keeps_shape() {
        let raw = StencilParts::success(vec![1, 2], vec![b"a".to_vec()]).into_raw();
        assert_eq!(raw.version, SchemaVersion::CURRENT as u32);
        assert!(raw.error.is_null());
        assert_eq!(raw.bytecode.len(), 2);
        assert_eq!(raw.strings.len(), 1);
        assert_eq!(raw.lineno, 1);
        unsafe { free_raw_stencil(raw) };
    }

    #[test]
    fn test_outcome_helpers() {
        let error = StencilParts::error("boom");
        assert_eq!(error.error.as_deref(), Some(&b"boom"[..]));
        assert!(!error.unimplemented);

        let unimplemented = StencilParts::unimplemented();
        assert!(unimplemented.unimplemented);
        assert_eq!(unimplemented.error, None);

        let raw = error.into_raw();
        assert!(!raw.error.is_null());
        unsafe { free_raw_stencil(raw) };
    }
}
