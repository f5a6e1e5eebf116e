use std::borrow::Cow;

use thiserror::Error;

use crate::raw::{RawStencil, SchemaVersion};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    #[error("stencil schema version {version} is not supported (current is {current})")]
    UnsupportedVersion { version: u32, current: u32 },

    #[error("stencil field `{field}` is out of range: {value}")]
    FieldOutOfRange { field: &'static str, value: usize },
}

/// Scalar facts the front end derived from the bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptMetadata {
    pub lineno: u32,
    pub column: u32,
    pub main_offset: u32,
    pub max_fixed_slots: u32,
    pub maximum_stack_depth: u32,
    pub body_scope_index: u32,
    pub num_ic_entries: u32,
    pub num_type_sets: u32,
}

impl Default for ScriptMetadata {
    fn default() -> Self {
        Self {
            lineno: 1,
            column: 0,
            main_offset: 0,
            max_fixed_slots: 0,
            maximum_stack_depth: 0,
            body_scope_index: 0,
            num_ic_entries: 0,
            num_type_sets: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StencilFlags {
    pub strict: bool,
    pub bindings_accessed_dynamically: bool,
    pub has_call_site_obj: bool,
    pub is_for_eval: bool,
    pub is_module: bool,
    pub is_function: bool,
    pub has_non_syntactic_scope: bool,
    pub needs_function_environment_objects: bool,
    pub has_module_goal: bool,
}

/// A borrowed, validated view of a [`RawStencil`].
///
/// Lives no longer than the raw stencil it reads from, so it can never
/// outlast the release of the foreign buffers.
#[derive(Debug, Clone)]
pub struct StencilDescriptor<'a> {
    pub version: SchemaVersion,
    pub bytecode: &'a [u8],
    /// Atom table in index order. Entries are raw bytes; UTF-8 is checked
    /// when they are atomized.
    pub strings: Vec<&'a [u8]>,
    pub error: Option<Cow<'a, str>>,
    pub unimplemented: bool,
    pub metadata: ScriptMetadata,
    pub flags: StencilFlags,
}

impl<'a> StencilDescriptor<'a> {
    /// Reads `raw` according to the schema version it declares.
    ///
    /// # Safety
    /// Every non-null buffer in `raw` must be live for `'a`.
    pub unsafe fn from_raw(raw: &'a RawStencil) -> Result<Self, DescriptorError> {
        let version = SchemaVersion::from_raw(raw.version)?;

        let bytecode = raw.bytecode.as_slice();

        let strings = if version.has_strings() {
            raw.strings.as_slice().iter().map(|s| s.as_slice()).collect()
        } else {
            Vec::new()
        };

        let (error, unimplemented) = if version.has_outcome() {
            let error = if raw.error.is_null() {
                None
            } else {
                Some(String::from_utf8_lossy(raw.error.as_slice()))
            };
            (error, raw.unimplemented)
        } else {
            (None, false)
        };

        let metadata = if version.has_metadata() {
            ScriptMetadata {
                lineno: narrow("lineno", raw.lineno)?,
                column: narrow("column", raw.column)?,
                main_offset: narrow("main_offset", raw.main_offset)?,
                max_fixed_slots: raw.max_fixed_slots,
                maximum_stack_depth: raw.maximum_stack_depth,
                body_scope_index: raw.body_scope_index,
                num_ic_entries: raw.num_ic_entries,
                num_type_sets: raw.num_type_sets,
            }
        } else {
            ScriptMetadata::default()
        };

        let flags = if version.has_flags() {
            StencilFlags {
                strict: raw.strict,
                bindings_accessed_dynamically: raw.bindings_accessed_dynamically,
                has_call_site_obj: raw.has_call_site_obj,
                is_for_eval: raw.is_for_eval,
                is_module: raw.is_module,
                is_function: raw.is_function,
                has_non_syntactic_scope: raw.has_non_syntactic_scope,
                needs_function_environment_objects: raw.needs_function_environment_objects,
                has_module_goal: raw.has_module_goal,
            }
        } else {
            StencilFlags::default()
        };

        Ok(Self {
            version,
            bytecode,
            strings,
            error,
            unimplemented,
            metadata,
            flags,
        })
    }
}

fn narrow(field: &'static str, value: usize) -> Result<u32, DescriptorError> {
    u32::try_from(value).map_err(|_| DescriptorError::FieldOutOfRange { field, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producer::StencilParts;

    fn with_descriptor<R>(
        parts: StencilParts,
        f: impl FnOnce(Result<StencilDescriptor<'_>, DescriptorError>) -> R,
    ) -> R {
        let raw = parts.into_raw();
        let result = f(unsafe { StencilDescriptor::from_raw(&raw) });
        unsafe { crate::producer::free_raw_stencil(raw) };
        result
    }

    #[test]
    fn test_current_version_reads_every_field() {
        let mut parts = StencilParts::success(vec![0x99], vec![b"x".to_vec(), b"y".to_vec()]);
        parts.lineno = 3;
        parts.column = 7;
        parts.max_fixed_slots = 2;
        parts.maximum_stack_depth = 4;
        parts.flags.strict = true;
        parts.flags.has_module_goal = true;

        with_descriptor(parts, |descriptor| {
            let descriptor = descriptor.unwrap();
            assert_eq!(descriptor.version, SchemaVersion::V5);
            assert_eq!(descriptor.bytecode, &[0x99]);
            assert_eq!(descriptor.strings, vec![&b"x"[..], &b"y"[..]]);
            assert_eq!(descriptor.error, None);
            assert!(!descriptor.unimplemented);
            assert_eq!(descriptor.metadata.lineno, 3);
            assert_eq!(descriptor.metadata.column, 7);
            assert_eq!(descriptor.metadata.max_fixed_slots, 2);
            assert_eq!(descriptor.metadata.maximum_stack_depth, 4);
            assert!(descriptor.flags.strict);
            assert!(descriptor.flags.has_module_goal);
            assert!(!descriptor.flags.is_module);
        });
    }

    #[test]
    fn test_older_version_defaults_newer_fields() {
        let mut parts = StencilParts::success(vec![0x99], vec![b"x".to_vec()]);
        parts.version = SchemaVersion::V2 as u32;
        parts.lineno = 40;
        parts.flags.strict = true;
        parts.unimplemented = true;

        with_descriptor(parts, |descriptor| {
            let descriptor = descriptor.unwrap();
            assert_eq!(descriptor.strings.len(), 1);
            assert!(!descriptor.unimplemented);
            assert_eq!(descriptor.metadata, ScriptMetadata::default());
            assert_eq!(descriptor.metadata.lineno, 1);
            assert_eq!(descriptor.flags, StencilFlags::default());
        });
    }

    #[test]
    fn test_v1_ignores_strings() {
        let mut parts = StencilParts::success(vec![0x99], vec![b"x".to_vec()]);
        parts.version = SchemaVersion::V1 as u32;
        with_descriptor(parts, |descriptor| {
            assert!(descriptor.unwrap().strings.is_empty());
        });
    }

    #[test]
    fn test_error_message_is_lossy_utf8() {
        let parts = StencilParts::error(b"bad \xff token".to_vec());
        with_descriptor(parts, |descriptor| {
            let descriptor = descriptor.unwrap();
            assert_eq!(descriptor.error.as_deref(), Some("bad \u{fffd} token"));
        });
    }

    #[test]
    fn test_empty_error_message_is_still_an_error() {
        let parts = StencilParts::error(Vec::new());
        with_descriptor(parts, |descriptor| {
            assert_eq!(descriptor.unwrap().error.as_deref(), Some(""));
        });
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        let mut parts = StencilParts::success(vec![0x99], Vec::new());
        parts.version = 99;
        with_descriptor(parts, |descriptor| {
            assert!(matches!(
                descriptor,
                Err(DescriptorError::UnsupportedVersion { version: 99, .. })
            ));
        });
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_oversized_scalar_is_rejected() {
        let mut parts = StencilParts::success(vec![0x99], Vec::new());
        parts.main_offset = u32::MAX as usize + 1;
        with_descriptor(parts, |descriptor| {
            assert!(matches!(
                descriptor,
                Err(DescriptorError::FieldOutOfRange { field: "main_offset", .. })
            ));
        });
    }
}
