use std::mem::ManuallyDrop;

use stencil_source::CompileOptions;

use crate::descriptor::{DescriptorError, StencilDescriptor};
use crate::parser::ForeignParser;
use crate::raw::{RawCompileOptions, RawStencil};

/// The engine's handle on a front end.
#[derive(Debug, Clone)]
pub struct CompileBridge<P> {
    parser: P,
}

impl<P: ForeignParser> CompileBridge<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    /// Runs the front end. The returned guard releases the stencil when it
    /// goes out of scope.
    pub fn compile(&self, source: &[u8], options: &CompileOptions) -> StencilGuard<'_, P> {
        let raw = self.parser.compile(source, &RawCompileOptions::from(options));
        log::debug!(
            "Foreign compile returned schema v{} ({} bytes of bytecode)",
            raw.version,
            raw.bytecode.len()
        );
        StencilGuard {
            parser: &self.parser,
            raw: ManuallyDrop::new(raw),
        }
    }

    pub fn can_parse_as_script(&self, source: &[u8]) -> bool {
        self.parser.can_parse_as_script(source)
    }

    pub fn can_parse_as_module(&self, source: &[u8]) -> bool {
        self.parser.can_parse_as_module(source)
    }
}

/// Owns a stencil until it is handed back to the parser that produced it.
///
/// Release happens in `Drop`, so it runs once on every exit path, including
/// early returns through `?`.
pub struct StencilGuard<'p, P: ForeignParser> {
    parser: &'p P,
    raw: ManuallyDrop<RawStencil>,
}

impl<P: ForeignParser> StencilGuard<'_, P> {
    pub fn descriptor(&self) -> Result<StencilDescriptor<'_>, DescriptorError> {
        // SAFETY: the buffers stay live until `self` drops, and the
        // descriptor borrows `self`.
        unsafe { StencilDescriptor::from_raw(&self.raw) }
    }
}

impl<P: ForeignParser> Drop for StencilGuard<'_, P> {
    fn drop(&mut self) {
        log::trace!("Releasing foreign stencil");
        // SAFETY: `raw` is never touched again after this.
        unsafe {
            let raw = ManuallyDrop::take(&mut self.raw);
            self.parser.release(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::producer::{free_raw_stencil, StencilParts};

    struct Recording {
        reply: StencilParts,
        seen_options: Cell<Option<RawCompileOptions>>,
        released: Cell<usize>,
        sources: RefCell<Vec<Vec<u8>>>,
    }

    impl Recording {
        fn new(reply: StencilParts) -> Self {
            Self {
                reply,
                seen_options: Cell::new(None),
                released: Cell::new(0),
                sources: RefCell::new(Vec::new()),
            }
        }
    }

    impl ForeignParser for Recording {
        fn compile(&self, source: &[u8], options: &RawCompileOptions) -> RawStencil {
            self.sources.borrow_mut().push(source.to_vec());
            self.seen_options.set(Some(*options));
            self.reply.clone().into_raw()
        }

        unsafe fn release(&self, stencil: RawStencil) {
            self.released.set(self.released.get() + 1);
            free_raw_stencil(stencil);
        }

        fn can_parse_as_script(&self, source: &[u8]) -> bool {
            !source.starts_with(b"import")
        }

        fn can_parse_as_module(&self, _source: &[u8]) -> bool {
            true
        }
    }

    #[test]
    fn test_guard_releases_once_on_drop() {
        let parser = Recording::new(StencilParts::success(vec![0x99], Vec::new()));
        let bridge = CompileBridge::new(&parser);
        {
            let guard = bridge.compile(b"1", &CompileOptions::default());
            assert_eq!(guard.descriptor().unwrap().bytecode, &[0x99]);
            assert_eq!(parser.released.get(), 0);
        }
        assert_eq!(parser.released.get(), 1);
        assert_eq!(parser.sources.borrow().as_slice(), &[b"1".to_vec()]);
    }

    #[test]
    fn test_guard_releases_when_descriptor_is_rejected() {
        let mut reply = StencilParts::success(vec![0x99], Vec::new());
        reply.version = 0;
        let parser = Recording::new(reply);
        let bridge = CompileBridge::new(&parser);

        let result = (|| -> Result<(), DescriptorError> {
            let guard = bridge.compile(b"1", &CompileOptions::default());
            guard.descriptor()?;
            Ok(())
        })();

        assert!(result.is_err());
        assert_eq!(parser.released.get(), 1);
    }

    #[test]
    fn test_options_are_forwarded() {
        let parser = Recording::new(StencilParts::unimplemented());
        let bridge = CompileBridge::new(&parser);
        let options = CompileOptions {
            no_result_value: true,
        };
        drop(bridge.compile(b"", &options));
        assert_eq!(
            parser.seen_options.get(),
            Some(RawCompileOptions {
                no_script_rval: true
            })
        );
    }

    #[test]
    fn test_probes_do_not_compile() {
        let parser = Recording::new(StencilParts::unimplemented());
        let bridge = CompileBridge::new(&parser);
        assert!(!bridge.can_parse_as_script(b"import x from 'y'"));
        assert!(bridge.can_parse_as_module(b"import x from 'y'"));
        assert!(parser.sources.borrow().is_empty());
        assert_eq!(parser.released.get(), 0);
    }
}
