use crate::raw::{RawCompileOptions, RawStencil};

/// A front end that compiles source text into stencils.
pub trait ForeignParser {
    /// Compiles `source`. Ownership of every buffer in the result passes to
    /// the caller, who must hand it back through [`ForeignParser::release`].
    fn compile(&self, source: &[u8], options: &RawCompileOptions) -> RawStencil;

    /// Frees a stencil.
    ///
    /// # Safety
    /// `stencil` must have been returned by [`ForeignParser::compile`] on this
    /// parser and must not be released twice.
    unsafe fn release(&self, stencil: RawStencil);

    fn can_parse_as_script(&self, source: &[u8]) -> bool;

    fn can_parse_as_module(&self, source: &[u8]) -> bool;
}

pub type CompileFn =
    unsafe extern "C" fn(source: *const u8, len: usize, options: *const RawCompileOptions) -> RawStencil;
pub type ReleaseFn = unsafe extern "C" fn(stencil: RawStencil);
pub type ProbeFn = unsafe extern "C" fn(source: *const u8, len: usize) -> bool;

/// A front end reached through C function pointers.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ForeignParserVtable {
    pub compile: CompileFn,
    pub release: ReleaseFn,
    pub can_parse_as_script: ProbeFn,
    pub can_parse_as_module: ProbeFn,
}

impl ForeignParser for ForeignParserVtable {
    fn compile(&self, source: &[u8], options: &RawCompileOptions) -> RawStencil {
        log::trace!("Calling foreign compile on {} bytes", source.len());
        // SAFETY: the entry points promise to read exactly `len` bytes.
        unsafe { (self.compile)(source.as_ptr(), source.len(), options) }
    }

    unsafe fn release(&self, stencil: RawStencil) {
        (self.release)(stencil)
    }

    fn can_parse_as_script(&self, source: &[u8]) -> bool {
        unsafe { (self.can_parse_as_script)(source.as_ptr(), source.len()) }
    }

    fn can_parse_as_module(&self, source: &[u8]) -> bool {
        unsafe { (self.can_parse_as_module)(source.as_ptr(), source.len()) }
    }
}

impl<P: ForeignParser + ?Sized> ForeignParser for &P {
    fn compile(&self, source: &[u8], options: &RawCompileOptions) -> RawStencil {
        (**self).compile(source, options)
    }

    unsafe fn release(&self, stencil: RawStencil) {
        (**self).release(stencil)
    }

    fn can_parse_as_script(&self, source: &[u8]) -> bool {
        (**self).can_parse_as_script(source)
    }

    fn can_parse_as_module(&self, source: &[u8]) -> bool {
        (**self).can_parse_as_module(source)
    }
}
