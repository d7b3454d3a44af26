//! End-to-End Emission Tests
//!
//! Drives the emission entry points over a scripted fixture backend whose
//! object pipeline streams a placeholder size field and backpatches it
//! once the body length is known: the write pattern that makes the
//! random-access path necessary in the first place.

use std::cell::{Cell, RefCell};
use std::io::Cursor;

use pretty_assertions::assert_eq;

use ebb_emit::{
    emit_to_sink, stream_bitcode, stream_bitcode_to_writer, stream_ir, stream_ir_to_writer,
    EmitError, Emitter, ModuleIr, OutputKind, PassPipeline, TargetMachine,
};
use ebb_stream::{Output, PwriteOutput, SinkCallbacks};

/// Program fixture: named functions with fixed body bytes.
struct TestModule {
    name: &'static str,
    functions: Vec<(&'static str, Vec<u8>)>,
    layout: Option<String>,
}

impl ModuleIr for TestModule {
    fn set_data_layout(&mut self, layout: &str) {
        self.layout = Some(layout.to_string());
    }

    fn write_bitcode(&self, out: &mut dyn Output) {
        out.write(b"BC\xc0\xde");
        for (name, body) in &self.functions {
            out.write(name.as_bytes());
            out.write(body);
        }
    }

    fn print_ir(&self, out: &mut dyn Output) {
        out.write(format!("; ModuleID = '{}'\n", self.name).as_bytes());
        for (name, _) in &self.functions {
            out.write(format!("define void @{name}()\n").as_bytes());
        }
    }
}

/// Target fixture emitting a tiny sectioned container: magic, a little-
/// endian `u32` body size backpatched after the body has streamed, then
/// the body itself.
struct TestTarget {
    assembly_supported: bool,
}

impl TargetMachine for TestTarget {
    type Module = TestModule;

    fn data_layout(&self) -> String {
        "e-m:e-i64:64-n32:64".to_string()
    }

    fn passes_to_emit(
        &self,
        kind: OutputKind,
    ) -> Result<Box<dyn PassPipeline<TestModule> + '_>, String> {
        match kind {
            OutputKind::Object => Ok(Box::new(ObjectPasses)),
            OutputKind::Assembly if self.assembly_supported => Ok(Box::new(AsmPasses)),
            OutputKind::Assembly => {
                Err("assembly emission is not implemented for this target".to_string())
            }
        }
    }
}

struct ObjectPasses;

impl PassPipeline<TestModule> for ObjectPasses {
    fn run(&mut self, module: &mut TestModule, out: &mut dyn PwriteOutput) {
        out.write(b"\x7fEBB");
        let size_field = out.position();
        out.write(&[0u8; 4]);
        let body_start = out.position();
        for (name, body) in &module.functions {
            out.write(name.as_bytes());
            out.write(body);
        }
        let body_len = u32::try_from(out.position() - body_start).unwrap_or(u32::MAX);
        out.pwrite(&body_len.to_le_bytes(), size_field);
    }
}

struct AsmPasses;

impl PassPipeline<TestModule> for AsmPasses {
    fn run(&mut self, module: &mut TestModule, out: &mut dyn PwriteOutput) {
        for (name, body) in &module.functions {
            out.write(format!("{name}:\n").as_bytes());
            for byte in body {
                out.write(format!("  .byte {byte}\n").as_bytes());
            }
        }
    }
}

fn module() -> TestModule {
    TestModule {
        name: "demo",
        functions: vec![("f", vec![1, 2, 3]), ("g", vec![4, 5])],
        layout: None,
    }
}

fn expected_object() -> Vec<u8> {
    let mut bytes = b"\x7fEBB".to_vec();
    // Body: "f" + 3 bytes + "g" + 2 bytes.
    bytes.extend_from_slice(&7u32.to_le_bytes());
    bytes.extend_from_slice(b"f");
    bytes.extend_from_slice(&[1, 2, 3]);
    bytes.extend_from_slice(b"g");
    bytes.extend_from_slice(&[4, 5]);
    bytes
}

fn expected_bitcode() -> Vec<u8> {
    let mut bytes = b"BC\xc0\xde".to_vec();
    bytes.extend_from_slice(b"f");
    bytes.extend_from_slice(&[1, 2, 3]);
    bytes.extend_from_slice(b"g");
    bytes.extend_from_slice(&[4, 5]);
    bytes
}

#[derive(Default)]
struct Calls {
    appends: Vec<Vec<u8>>,
    patches: Vec<(Vec<u8>, u64)>,
    flushes: usize,
}

#[test]
fn emit_to_memory_produces_the_patched_object() {
    let emitter = Emitter::new(TestTarget {
        assembly_supported: true,
    });
    let mut module = module();
    let bytes = emitter
        .emit_to_memory(&mut module, OutputKind::Object)
        .unwrap();
    assert_eq!(bytes, expected_object());
    // The driver configured the module before running the pipeline.
    assert_eq!(module.layout.as_deref(), Some("e-m:e-i64:64-n32:64"));
}

#[test]
fn emit_to_writer_patches_through_the_seekable_store() {
    let emitter = Emitter::new(TestTarget {
        assembly_supported: true,
    });
    let mut module = module();
    let mut store = Cursor::new(Vec::new());
    emitter
        .emit_to_writer(&mut module, OutputKind::Object, &mut store)
        .unwrap();
    assert_eq!(store.into_inner(), expected_object());
}

#[test]
fn emit_to_sink_forwards_writes_one_for_one() {
    let target = TestTarget {
        assembly_supported: true,
    };
    let mut module = module();
    let calls = RefCell::new(Calls::default());

    let callbacks = SinkCallbacks::new()
        .on_append(|buf| {
            calls.borrow_mut().appends.push(buf.to_vec());
            Ok(())
        })
        .on_patch(|buf, offset| {
            calls.borrow_mut().patches.push((buf.to_vec(), offset));
            Ok(())
        })
        .on_flush(|| {
            calls.borrow_mut().flushes += 1;
            Ok(())
        });

    emit_to_sink(&target, &mut module, OutputKind::Object, callbacks).unwrap();

    let calls = calls.into_inner();
    // No coalescing, no splitting: one sink invocation per pipeline write.
    assert_eq!(
        calls.appends,
        vec![
            b"\x7fEBB".to_vec(),
            vec![0, 0, 0, 0],
            b"f".to_vec(),
            vec![1, 2, 3],
            b"g".to_vec(),
            vec![4, 5],
        ]
    );
    assert_eq!(calls.patches, vec![(7u32.to_le_bytes().to_vec(), 4)]);
    assert_eq!(calls.flushes, 1);
}

#[test]
fn missing_patch_operation_is_rejected_up_front() {
    let target = TestTarget {
        assembly_supported: true,
    };
    let mut module = module();
    let appends = Cell::new(0usize);

    let callbacks = SinkCallbacks::new().on_append(|_| {
        appends.set(appends.get() + 1);
        Ok(())
    });
    let err = emit_to_sink(&target, &mut module, OutputKind::Object, callbacks).unwrap_err();

    assert_eq!(err, EmitError::MissingCallback { name: "patch" });
    assert_eq!(appends.get(), 0);
}

#[test]
fn missing_append_operation_is_rejected_up_front() {
    let target = TestTarget {
        assembly_supported: true,
    };
    let mut module = module();
    let callbacks = SinkCallbacks::new().on_patch(|_, _| Ok(()));
    let err = emit_to_sink(&target, &mut module, OutputKind::Object, callbacks).unwrap_err();
    assert_eq!(err, EmitError::MissingCallback { name: "append" });
}

#[test]
fn unsupported_kind_fails_before_any_write() {
    let target = TestTarget {
        assembly_supported: false,
    };
    let mut module = module();
    let calls = RefCell::new(Calls::default());

    let callbacks = SinkCallbacks::new()
        .on_append(|buf| {
            calls.borrow_mut().appends.push(buf.to_vec());
            Ok(())
        })
        .on_patch(|buf, offset| {
            calls.borrow_mut().patches.push((buf.to_vec(), offset));
            Ok(())
        });
    let err = emit_to_sink(&target, &mut module, OutputKind::Assembly, callbacks).unwrap_err();

    assert!(matches!(err, EmitError::UnsupportedOutput { .. }));
    assert!(!err.to_string().is_empty());
    let calls = calls.into_inner();
    assert!(calls.appends.is_empty());
    assert!(calls.patches.is_empty());
}

#[test]
fn sink_failure_is_reported_after_the_pipeline_finishes() {
    let target = TestTarget {
        assembly_supported: true,
    };
    let mut module = module();
    let appends = Cell::new(0usize);
    let patches = Cell::new(0usize);
    let flushes = Cell::new(0usize);

    let callbacks = SinkCallbacks::new()
        .on_append(|_| {
            let n = appends.get();
            appends.set(n + 1);
            if n == 1 {
                return Err(std::io::Error::other("sink closed"));
            }
            Ok(())
        })
        .on_patch(|_, _| {
            patches.set(patches.get() + 1);
            Ok(())
        })
        .on_flush(|| {
            flushes.set(flushes.get() + 1);
            Ok(())
        });
    let err = emit_to_sink(&target, &mut module, OutputKind::Object, callbacks).unwrap_err();

    assert_eq!(err, EmitError::Forwarding);
    // The second append failed; everything after was swallowed, including
    // the backpatch and the terminal flush.
    assert_eq!(appends.get(), 2);
    assert_eq!(patches.get(), 0);
    assert_eq!(flushes.get(), 0);
}

#[test]
fn assembly_kind_emits_text() {
    let emitter = Emitter::new(TestTarget {
        assembly_supported: true,
    });
    let mut module = module();
    let bytes = emitter
        .emit_to_memory(&mut module, OutputKind::Assembly)
        .unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(
        text,
        "f:\n  .byte 1\n  .byte 2\n  .byte 3\ng:\n  .byte 4\n  .byte 5\n"
    );
}

#[test]
fn emit_to_file_writes_the_artifact() {
    let emitter = Emitter::new(TestTarget {
        assembly_supported: true,
    });
    let mut module = module();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demo.o");

    emitter
        .emit_to_file(&mut module, OutputKind::Object, &path)
        .unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), expected_object());
}

#[test]
fn emit_to_file_rejects_a_missing_parent_directory() {
    let emitter = Emitter::new(TestTarget {
        assembly_supported: true,
    });
    let mut module = module();
    let err = emitter
        .emit_to_file(
            &mut module,
            OutputKind::Object,
            std::path::Path::new("/nonexistent_dir_12345/demo.o"),
        )
        .unwrap_err();
    assert!(matches!(err, EmitError::InvalidPath { .. }));
}

#[test]
fn stream_bitcode_forwards_every_chunk() {
    let module = module();
    let calls = RefCell::new(Calls::default());

    let callbacks = SinkCallbacks::new()
        .on_append(|buf| {
            calls.borrow_mut().appends.push(buf.to_vec());
            Ok(())
        })
        .on_flush(|| {
            calls.borrow_mut().flushes += 1;
            Ok(())
        });
    stream_bitcode(&module, callbacks).unwrap();

    let calls = calls.into_inner();
    let streamed: Vec<u8> = calls.appends.concat();
    assert_eq!(streamed, expected_bitcode());
    assert_eq!(calls.appends[0], b"BC\xc0\xde");
    assert_eq!(calls.flushes, 1);
}

#[test]
fn stream_bitcode_requires_an_append_operation() {
    let module = module();
    let err = stream_bitcode(&module, SinkCallbacks::new()).unwrap_err();
    assert_eq!(err, EmitError::MissingCallback { name: "append" });
}

#[test]
fn stream_ir_requires_an_append_operation() {
    let module = module();
    let err = stream_ir(&module, SinkCallbacks::new()).unwrap_err();
    assert_eq!(err, EmitError::MissingCallback { name: "append" });
}

#[test]
fn stream_bitcode_to_writer_matches_the_callback_path() {
    let module = module();
    let mut via_writer = Vec::new();
    stream_bitcode_to_writer(&module, &mut via_writer).unwrap();
    assert_eq!(via_writer, expected_bitcode());
}

#[test]
fn stream_ir_to_writer_prints_the_module() {
    let module = module();
    let mut out = Vec::new();
    stream_ir_to_writer(&module, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(
        text,
        "; ModuleID = 'demo'\ndefine void @f()\ndefine void @g()\n"
    );
}
