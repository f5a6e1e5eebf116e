use stencil_ffi::StencilDescriptor;

/// What a foreign compile result asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'d> {
    /// The source was rejected; report the message.
    SyntaxError(&'d str),
    /// The front end declined; compile with the general compiler instead.
    Unimplemented,
    /// Materialize the stencil.
    Success,
}

/// Routes a descriptor to its outcome. An error message wins over the
/// unimplemented flag.
pub fn classify<'d>(descriptor: &'d StencilDescriptor<'_>) -> Outcome<'d> {
    if let Some(message) = descriptor.error.as_deref() {
        return Outcome::SyntaxError(message);
    }
    if descriptor.unimplemented {
        return Outcome::Unimplemented;
    }
    Outcome::Success
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use stencil_ffi::{SchemaVersion, ScriptMetadata, StencilFlags};

    use super::*;

    fn descriptor(error: Option<&'static str>, unimplemented: bool) -> StencilDescriptor<'static> {
        StencilDescriptor {
            version: SchemaVersion::CURRENT,
            bytecode: &[],
            strings: Vec::new(),
            error: error.map(Cow::Borrowed),
            unimplemented,
            metadata: ScriptMetadata::default(),
            flags: StencilFlags::default(),
        }
    }

    #[test]
    fn test_error_wins_over_unimplemented() {
        let d = descriptor(Some("unexpected token"), true);
        assert_eq!(classify(&d), Outcome::SyntaxError("unexpected token"));
    }

    #[test]
    fn test_unimplemented_without_error() {
        assert_eq!(classify(&descriptor(None, true)), Outcome::Unimplemented);
    }

    #[test]
    fn test_success_otherwise() {
        assert_eq!(classify(&descriptor(None, false)), Outcome::Success);
    }
}
