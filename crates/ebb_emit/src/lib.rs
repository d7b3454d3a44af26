//! Emission Driver for Codegen Backends
//!
//! Runs one code-generation-to-bytes pipeline against an opaque backend
//! and transports the artifact to a caller-owned sink through the
//! `ebb_stream` adapters: no intermediate copy, and random-access patch
//! writes for the fixups object emission needs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌────────────────────┐    ┌────────────────┐
//! │ TargetMachine│───▶│    PassPipeline    │───▶│ RandomAccess-  │──▶ sink
//! │  + ModuleIr  │    │ (opaque backend)   │    │ Stream         │
//! └──────────────┘    └────────────────────┘    └────────────────┘
//! ```
//!
//! The driver propagates the target's data layout onto the module, builds
//! the pipeline for the requested [`OutputKind`], runs it, flushes, and
//! reports a single status. Bitcode and IR text take the forward-only path
//! through the `stream_*` operations.
//!
//! # Key Types
//!
//! - [`TargetMachine`] / [`ModuleIr`] / [`PassPipeline`]: the backend seam
//! - [`OutputKind`]: object vs. assembly selection
//! - [`emit_to_sink`] and the `stream_*` operations: callback boundary ops
//! - [`Emitter`]: writer/memory/file conveniences over one target
//! - [`EmitError`]: every failure the boundary reports
//!
//! # Example
//!
//! ```ignore
//! use ebb_emit::{Emitter, OutputKind};
//!
//! let emitter = Emitter::new(target);
//! let object = emitter.emit_to_memory(&mut module, OutputKind::Object)?;
//! emitter.emit_to_file(&mut module, OutputKind::Assembly, "out.s".as_ref())?;
//! ```
//!
//! # Debugging
//!
//! - `RUST_LOG=ebb_emit=debug`: pipeline milestones (kind, layout, byte
//!   counts).
//! - `RUST_LOG=ebb_stream=trace`: every forwarded write.
//!
//! Call [`init_tracing`] once at startup to install the subscriber.

pub mod backend;
pub mod emit;

pub use backend::{ModuleIr, OutputKind, PassPipeline, TargetMachine};
pub use emit::{
    emit_to_sink, stream_bitcode, stream_bitcode_to_writer, stream_ir, stream_ir_to_writer,
    EmitError, Emitter,
};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=ebb_emit=debug` or `RUST_LOG=ebb_stream=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
