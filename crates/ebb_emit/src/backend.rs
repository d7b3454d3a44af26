//! Backend Seam Traits
//!
//! The code generation backend is an opaque collaborator: it selects
//! instructions, resolves relocations, and lays out the artifact. This
//! crate only drives it and transports its bytes. These traits are the
//! entire seam, following the backend-trait pattern from
//! `rustc_codegen_ssa`:
//!
//! - [`TargetMachine`]: a target description that can build emission
//!   pipelines
//! - [`ModuleIr`]: a program representation the backend can lower and
//!   print
//! - [`PassPipeline`]: a constructed pipeline, run once against a module
//!   and an output stream

use ebb_stream::{Output, PwriteOutput};

/// Artifact format requested from the code generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Native object bytes (`.o`).
    Object,
    /// Assembly text (`.s`).
    Assembly,
}

impl OutputKind {
    /// Get the typical file extension for this kind.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Object => "o",
            Self::Assembly => "s",
        }
    }

    /// Get a human-readable description of this kind.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Object => "object code",
            Self::Assembly => "assembly text",
        }
    }
}

/// A program representation the backend can lower and print.
pub trait ModuleIr {
    /// Adopt the target's data layout, so generated code addresses and
    /// aligns consistently with the chosen target.
    fn set_data_layout(&mut self, layout: &str);

    /// Stream the module's bitcode encoding into `out`.
    fn write_bitcode(&self, out: &mut dyn Output);

    /// Stream the module's textual IR into `out`.
    fn print_ir(&self, out: &mut dyn Output);
}

/// A constructed pass pipeline, ready to run once.
pub trait PassPipeline<M: ?Sized> {
    /// Lower `module` and write the artifact into `out`, appending and
    /// patching in backend-determined order.
    ///
    /// Write failures never surface here: they latch `out`, which swallows
    /// the rest of the run, and the driver reports a single failure
    /// afterwards. The pipeline is free to keep going.
    fn run(&mut self, module: &mut M, out: &mut dyn PwriteOutput);
}

/// A target description that can build emission pipelines.
pub trait TargetMachine {
    /// The program representation this target lowers.
    type Module: ModuleIr;

    /// The data layout convention to propagate onto modules.
    fn data_layout(&self) -> String;

    /// Build the pass pipeline that emits `kind`.
    ///
    /// `Err` carries the backend's reason when the target cannot produce
    /// the requested output kind.
    fn passes_to_emit(
        &self,
        kind: OutputKind,
    ) -> Result<Box<dyn PassPipeline<Self::Module> + '_>, String>;
}
