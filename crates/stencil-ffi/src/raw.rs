use crate::buffer::CVec;
use crate::descriptor::DescriptorError;

/// Layout revisions of [`RawStencil`].
///
/// Every revision only adds fields. A producer declares the revision it
/// filled in; fields newer than that revision are ignored and read as
/// false, zero or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum SchemaVersion {
    /// Bytecode only
    V1 = 1,
    /// Adds the string table
    V2 = 2,
    /// Adds the error message and the unimplemented flag
    V3 = 3,
    /// Adds scalar metadata and the line/column of the first character
    V4 = 4,
    /// Adds the boolean classification flags
    V5 = 5,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion::V5;

    pub fn from_raw(version: u32) -> Result<Self, DescriptorError> {
        match version {
            1 => Ok(SchemaVersion::V1),
            2 => Ok(SchemaVersion::V2),
            3 => Ok(SchemaVersion::V3),
            4 => Ok(SchemaVersion::V4),
            5 => Ok(SchemaVersion::V5),
            _ => Err(DescriptorError::UnsupportedVersion {
                version,
                current: SchemaVersion::CURRENT as u32,
            }),
        }
    }

    pub fn has_strings(self) -> bool {
        self >= SchemaVersion::V2
    }

    pub fn has_outcome(self) -> bool {
        self >= SchemaVersion::V3
    }

    pub fn has_metadata(self) -> bool {
        self >= SchemaVersion::V4
    }

    pub fn has_flags(self) -> bool {
        self >= SchemaVersion::V5
    }
}

/// The compile result as it crosses the C ABI.
#[repr(C)]
#[derive(Debug)]
pub struct RawStencil {
    /// [`SchemaVersion`] the producer filled in.
    pub version: u32,
    pub unimplemented: bool,
    /// UTF-8 message; null when compilation did not fail.
    pub error: CVec<u8>,
    pub bytecode: CVec<u8>,
    pub strings: CVec<CVec<u8>>,
    /// Line and column numbers for the first character of source.
    pub lineno: usize,
    pub column: usize,
    /// Offset of main entry point from code, after the prologue.
    pub main_offset: usize,
    /// Fixed frame slots.
    pub max_fixed_slots: u32,
    /// Maximum stack depth before any instruction.
    ///
    /// This value is a function of `bytecode`: there's only one correct value
    /// for a given script.
    pub maximum_stack_depth: u32,
    /// Index into the gcthings array of the body scope.
    pub body_scope_index: u32,
    /// Number of instructions in this script that have IC entries.
    ///
    /// A function of `bytecode`.
    pub num_ic_entries: u32,
    /// Number of instructions in this script that have type sets.
    ///
    /// A function of `bytecode`.
    pub num_type_sets: u32,
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

/// Options passed to the front end.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawCompileOptions {
    pub no_script_rval: bool,
}

impl From<&stencil_source::CompileOptions> for RawCompileOptions {
    fn from(options: &stencil_source::CompileOptions) -> Self {
        Self {
            no_script_rval: options.no_result_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_versions() {
        assert_eq!(SchemaVersion::from_raw(1), Ok(SchemaVersion::V1));
        assert_eq!(SchemaVersion::from_raw(5), Ok(SchemaVersion::CURRENT));
        assert!(SchemaVersion::V3.has_outcome());
        assert!(!SchemaVersion::V3.has_metadata());
        assert!(SchemaVersion::V2.has_strings());
        assert!(!SchemaVersion::V1.has_strings());
    }

    #[test]
    fn test_unknown_versions_are_rejected() {
        for version in [0, 6, u32::MAX] {
            assert_eq!(
                SchemaVersion::from_raw(version),
                Err(DescriptorError::UnsupportedVersion { version, current: 5 })
            );
        }
    }

    #[test]
    fn test_options_conversion() {
        let options = stencil_source::CompileOptions {
            no_result_value: true,
        };
        assert!(RawCompileOptions::from(&options).no_script_rval);
        assert!(!RawCompileOptions::default().no_script_rval);
    }
}
