use std::cell::Cell;

use stencil_ffi::{
    free_raw_stencil, CompileBridge, ForeignParser, RawCompileOptions, RawStencil, SchemaVersion,
    StencilParts,
};
use stencil_source::CompileOptions;

struct Versioned {
    version: Cell<u32>,
    released: Cell<usize>,
}

impl ForeignParser for Versioned {
    fn compile(&self, source: &[u8], _options: &RawCompileOptions) -> RawStencil {
        let mut parts = StencilParts::success(source.to_vec(), vec![source.to_vec()]);
        parts.version = self.version.get();
        parts.error = Some(b"ignored before v3".to_vec());
        parts.lineno = 5;
        parts.flags.is_module = true;
        parts.into_raw()
    }

    unsafe fn release(&self, stencil: RawStencil) {
        self.released.set(self.released.get() + 1);
        free_raw_stencil(stencil);
    }

    fn can_parse_as_script(&self, _source: &[u8]) -> bool {
        true
    }

    fn can_parse_as_module(&self, _source: &[u8]) -> bool {
        true
    }
}

#[test]
fn test_each_schema_version_reads_its_own_fields() {
    let _ = env_logger::builder().is_test(true).try_init();
    let parser = Versioned {
        version: Cell::new(0),
        released: Cell::new(0),
    };
    let bridge = CompileBridge::new(&parser);

    for version in 1..=SchemaVersion::CURRENT as u32 {
        parser.version.set(version);
        let guard = bridge.compile(b"src", &CompileOptions::default());
        let descriptor = guard.descriptor().unwrap();
        let declared = SchemaVersion::from_raw(version).unwrap();

        assert_eq!(descriptor.version, declared);
        assert_eq!(descriptor.bytecode, b"src");
        assert_eq!(descriptor.strings.len(), usize::from(declared.has_strings()));
        assert_eq!(descriptor.error.is_some(), declared.has_outcome());
        assert_eq!(descriptor.metadata.lineno, if declared.has_metadata() { 5 } else { 1 });
        assert_eq!(descriptor.flags.is_module, declared.has_flags());
    }
    assert_eq!(parser.released.get(), SchemaVersion::CURRENT as usize);
}

#[test]
fn test_rejected_version_is_released() {
    let parser = Versioned {
        version: Cell::new(SchemaVersion::CURRENT as u32 + 1),
        released: Cell::new(0),
    };
    let bridge = CompileBridge::new(&parser);
    {
        let guard = bridge.compile(b"src", &CompileOptions::default());
        assert!(guard.descriptor().is_err());
    }
    assert_eq!(parser.released.get(), 1);
}
