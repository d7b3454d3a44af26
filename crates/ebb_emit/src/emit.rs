//! Emission Driver
//!
//! Entry points that run one code-generation-to-bytes operation against a
//! caller-owned sink:
//!
//! ```text
//! ┌───────────────┐   build/run   ┌──────────────┐  append/patch  ┌──────┐
//! │ emit_to_sink  │──────────────▶│ PassPipeline │───────────────▶│ sink │
//! │ stream_* ops  │               │ (backend)    │                │      │
//! └───────────────┘               └──────────────┘                └──────┘
//! ```
//!
//! `emit_to_sink` drives the random-access path (object/assembly, with
//! backpatching); the `stream_*` operations drive the forward-only path
//! (bitcode, IR text). Every entry point validates its required sink
//! operations up front, before the backend does any work, and reports all
//! errors as [`EmitError`].

use std::fmt;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use tracing::debug;

use ebb_stream::{
    ForwardSink, ForwardStream, MemorySink, Output, RandomAccessSink, RandomAccessStream,
    SeekSink, SinkCallbacks, WriterSink,
};

use crate::backend::{ModuleIr, OutputKind, TargetMachine};

/// Error type for emission operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// A required operation is missing from the sink callback table.
    MissingCallback { name: &'static str },
    /// The target cannot produce the requested output kind.
    UnsupportedOutput { kind: OutputKind, reason: String },
    /// Preparing the sink failed before any byte was produced.
    SinkSetup { message: String },
    /// Output path is not usable.
    InvalidPath { path: String, reason: String },
    /// A sink operation failed while the artifact was being forwarded.
    ///
    /// The failing offset and length are not preserved; the sink saw the
    /// original `io::Error` and is the place to keep detail if needed.
    Forwarding,
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCallback { name } => {
                write!(f, "invalid arguments: sink is missing the required {name} operation")
            }
            Self::UnsupportedOutput { kind, reason } => {
                write!(f, "target cannot emit {}: {reason}", kind.description())
            }
            Self::SinkSetup { message } => {
                write!(f, "failed to prepare sink: {message}")
            }
            Self::InvalidPath { path, reason } => {
                write!(f, "invalid output path '{path}': {reason}")
            }
            Self::Forwarding => {
                write!(f, "error while forwarding output to sink")
            }
        }
    }
}

impl std::error::Error for EmitError {}

/// Validate that the parent directory exists for an output path.
fn validate_parent_exists(path: &Path) -> Result<(), EmitError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(EmitError::InvalidPath {
                path: path.to_string_lossy().into_owned(),
                reason: "parent directory does not exist".to_string(),
            });
        }
    }
    Ok(())
}

/// Run one code-generation pipeline, forwarding the artifact through the
/// sink callback table.
///
/// The append and patch operations are required; reposition and flush are
/// optional. A missing required operation fails here, before the backend
/// does any work and before any sink operation is invoked.
pub fn emit_to_sink<T: TargetMachine>(
    target: &T,
    module: &mut T::Module,
    kind: OutputKind,
    callbacks: SinkCallbacks<'_>,
) -> Result<(), EmitError> {
    if !callbacks.has_append() {
        return Err(EmitError::MissingCallback { name: "append" });
    }
    if !callbacks.has_patch() {
        return Err(EmitError::MissingCallback { name: "patch" });
    }
    let mut sink = callbacks;
    emit_via(target, module, kind, &mut sink)
}

/// Shared random-access emission path over any sink.
fn emit_via<T: TargetMachine>(
    target: &T,
    module: &mut T::Module,
    kind: OutputKind,
    sink: &mut dyn RandomAccessSink,
) -> Result<(), EmitError> {
    let layout = target.data_layout();
    debug!(kind = kind.description(), layout = %layout, "starting emission pipeline");
    module.set_data_layout(&layout);

    let mut passes = target
        .passes_to_emit(kind)
        .map_err(|reason| EmitError::UnsupportedOutput { kind, reason })?;

    let mut out = RandomAccessStream::new(sink);
    passes.run(module, &mut out);
    out.flush();
    if out.has_error() {
        debug!("sink reported failure during emission");
        return Err(EmitError::Forwarding);
    }
    debug!(bytes = out.position(), "emission pipeline finished");
    Ok(())
}

/// Shared forward streaming path over any sink.
fn stream_via(
    sink: &mut dyn ForwardSink,
    produce: impl FnOnce(&mut dyn Output),
) -> Result<(), EmitError> {
    let mut out = ForwardStream::new(sink);
    produce(&mut out);
    out.flush();
    if out.has_error() {
        return Err(EmitError::Forwarding);
    }
    Ok(())
}

/// Stream the module's bitcode encoding through the sink callback table.
///
/// The append operation is required; flush is optional.
pub fn stream_bitcode<M: ModuleIr>(
    module: &M,
    callbacks: SinkCallbacks<'_>,
) -> Result<(), EmitError> {
    if !callbacks.has_append() {
        return Err(EmitError::MissingCallback { name: "append" });
    }
    let mut sink = callbacks;
    stream_via(&mut sink, |out| module.write_bitcode(out))
}

/// Stream the module's textual IR through the sink callback table.
///
/// The append operation is required; flush is optional.
pub fn stream_ir<M: ModuleIr>(module: &M, callbacks: SinkCallbacks<'_>) -> Result<(), EmitError> {
    if !callbacks.has_append() {
        return Err(EmitError::MissingCallback { name: "append" });
    }
    let mut sink = callbacks;
    stream_via(&mut sink, |out| module.print_ir(out))
}

/// Stream the module's bitcode encoding into any writer.
pub fn stream_bitcode_to_writer<M: ModuleIr>(
    module: &M,
    writer: impl Write,
) -> Result<(), EmitError> {
    let mut sink = WriterSink::new(writer);
    stream_via(&mut sink, |out| module.write_bitcode(out))
}

/// Stream the module's textual IR into any writer.
pub fn stream_ir_to_writer<M: ModuleIr>(module: &M, writer: impl Write) -> Result<(), EmitError> {
    let mut sink = WriterSink::new(writer);
    stream_via(&mut sink, |out| module.print_ir(out))
}

/// Convenience wrapper binding a target description to the emission entry
/// points.
#[derive(Debug)]
pub struct Emitter<T> {
    target: T,
}

impl<T: TargetMachine> Emitter<T> {
    /// Create an emitter for `target`.
    pub fn new(target: T) -> Self {
        Self { target }
    }

    /// The wrapped target description.
    #[must_use]
    pub fn target(&self) -> &T {
        &self.target
    }

    /// Emit through a caller-assembled sink callback table.
    pub fn emit(
        &self,
        module: &mut T::Module,
        kind: OutputKind,
        callbacks: SinkCallbacks<'_>,
    ) -> Result<(), EmitError> {
        emit_to_sink(&self.target, module, kind, callbacks)
    }

    /// Emit into any seekable writer.
    pub fn emit_to_writer<W: Write + Seek>(
        &self,
        module: &mut T::Module,
        kind: OutputKind,
        writer: W,
    ) -> Result<(), EmitError> {
        let mut sink = SeekSink::new(writer).map_err(|e| EmitError::SinkSetup {
            message: e.to_string(),
        })?;
        emit_via(&self.target, module, kind, &mut sink)
    }

    /// Emit into a fresh in-memory store and hand the artifact back.
    pub fn emit_to_memory(
        &self,
        module: &mut T::Module,
        kind: OutputKind,
    ) -> Result<Vec<u8>, EmitError> {
        let mut sink = MemorySink::new();
        emit_via(&self.target, module, kind, &mut sink)?;
        Ok(sink.into_bytes())
    }

    /// Emit into a file at `path`.
    pub fn emit_to_file(
        &self,
        module: &mut T::Module,
        kind: OutputKind,
        path: &Path,
    ) -> Result<(), EmitError> {
        validate_parent_exists(path)?;
        let file = File::create(path).map_err(|e| EmitError::InvalidPath {
            path: path.to_string_lossy().into_owned(),
            reason: e.to_string(),
        })?;
        let mut sink = SeekSink::new(file).map_err(|e| EmitError::SinkSetup {
            message: e.to_string(),
        })?;
        emit_via(&self.target, module, kind, &mut sink)
    }
}
