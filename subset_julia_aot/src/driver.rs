//! The packaging pass: collect, select, generate, serialize.
//!
//! Runs once, synchronously, after program execution completes. The
//! method-table universe is read-only for the whole pass; all scratch
//! state lives in this invocation and is dropped when it returns. Both
//! output streams are owned buffers, so they are finalized on every exit
//! path, including early-return failures.
//!
//! Control flow:
//!
//! ```text
//! collect (scope = whole program | init-order modules)
//!   → work-list assembly (enumeration + policy)
//!     → metadata serialization
//!       → native code generation (split mode: first, fed the metadata)
//!         → image writing (checksum + offset patching, source-text table)
//! ```

use std::path::Path;

use crate::collect::{collect, CollectScope};
use crate::error::{CodegenError, PackageError};
use crate::image::{ImageMetadata, ImageWriter, SourceDependency};
use crate::method_table::Universe;
use crate::worklist::{build_worklist, WorkList, WorklistOptions};

/// Output of one code-generation run over a work-list.
#[derive(Debug, Clone, Default)]
pub struct NativeArtifact {
    /// The native object blob, written to its own stream.
    pub object: Vec<u8>,
    /// Clone/relocation-target table, embedded into the metadata stream.
    pub clone_targets: Vec<u8>,
}

/// External code generator consuming the ordered work-list.
///
/// Implementations must be idempotent per distinct input signature: the
/// work-list is not a set and may hand over the same signature twice.
pub trait CodeGenerator {
    /// Produce native code for every compile target in `worklist`.
    /// `metadata` is the finalized metadata data section, available as an
    /// embedding input for relocation and clone-target tables.
    fn generate(
        &mut self,
        worklist: &WorkList,
        metadata: &[u8],
    ) -> Result<NativeArtifact, CodegenError>;
}

/// Options for one packaging invocation, as requested by the driver
/// process.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Emit the metadata image stream.
    pub emit_metadata: bool,
    /// Emit the native-code stream.
    pub emit_native: bool,
    /// Package only the modules initialized during this run instead of
    /// the whole program.
    pub incremental: bool,
    /// Compile every reachable definition, enumerating leaf candidates
    /// for generic signatures. Only honored in whole-program mode.
    pub full_coverage: bool,
    /// The program's own root namespace; its source dependencies are
    /// assumed embedded already and excluded from the source-text table.
    pub root_module: String,
}

impl PackageOptions {
    /// Whether any compiler output was requested at all.
    pub fn generating_output(&self) -> bool {
        self.emit_metadata || self.emit_native
    }
}

/// Result of one packaging pass.
#[derive(Debug, Default)]
pub struct PackageOutput {
    /// The metadata image, when requested.
    pub metadata_image: Option<Vec<u8>>,
    /// The native object blob, when requested.
    pub native_object: Option<Vec<u8>>,
    /// Non-fatal diagnostics: unreadable source dependencies, unclosed
    /// module scopes. The embedding driver decides how to report them.
    pub warnings: Vec<String>,
}

/// Run the whole packaging pass and produce the requested output streams.
///
/// Returns an empty output when no stream was requested. Fails with
/// [`PackageError::NoModulesInitialized`] when output was requested but
/// the run never initialized a module.
pub fn write_compiler_output(
    universe: &dyn Universe,
    deps: &[SourceDependency],
    codegen: &mut dyn CodeGenerator,
    options: &PackageOptions,
) -> Result<PackageOutput, PackageError> {
    if !options.generating_output() {
        return Ok(PackageOutput::default());
    }
    if universe.init_order().is_empty() {
        return Err(PackageError::NoModulesInitialized);
    }

    let scope = if options.incremental {
        CollectScope::Modules(universe.init_order().to_vec())
    } else {
        CollectScope::WholeProgram
    };
    let worklist_options = WorklistOptions {
        full_coverage: options.full_coverage && !options.incremental,
    };

    let collected = collect(universe, &scope);
    let worklist = build_worklist(&collected, &worklist_options);

    let metadata = ImageMetadata::from_worklist(&worklist);
    let payload = metadata.to_bytes()?;

    let mut writer = ImageWriter::new();
    writer.write_header()?;
    writer.open_data_section()?;
    writer.append(&payload)?;
    writer.close_data_section()?;

    // Split-output mode: the native stream is produced first, because the
    // code generator embeds the finalized metadata bytes into its
    // relocation and clone-target tables.
    let native = if options.emit_native {
        let artifact = codegen.generate(&worklist, writer.data_section()?)?;
        writer.embed_clone_targets(&artifact.clone_targets)?;
        Some(artifact)
    } else {
        None
    };

    writer.write_srctext_table(deps, &options.root_module)?;

    let mut warnings: Vec<String> = writer.warnings().to_vec();
    for module in universe.open_modules() {
        warnings.push(format!(
            "detected unclosed module: {} ** incremental compilation may be broken for this module **",
            module
        ));
    }

    let image = writer.finish()?;
    Ok(PackageOutput {
        metadata_image: options.emit_metadata.then_some(image),
        native_object: native.map(|a| a.object),
        warnings,
    })
}

/// Write finished image bytes to `path`.
///
/// The open failure is fatal to the pass; the caller is responsible for
/// process-level reporting.
pub fn save_image<P: AsRef<Path>>(path: P, bytes: &[u8]) -> Result<(), PackageError> {
    let path = path.as_ref();
    std::fs::write(path, bytes).map_err(|source| PackageError::OutputFile {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method_table::{Method, MethodTable, RuntimeSnapshot};
    use crate::types::JuliaType;

    /// Code generator stub recording what it was asked to compile.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingCodegen {
        pub calls: usize,
        pub last_target_count: usize,
    }

    impl CodeGenerator for RecordingCodegen {
        fn generate(
            &mut self,
            worklist: &WorkList,
            metadata: &[u8],
        ) -> Result<NativeArtifact, CodegenError> {
            self.calls += 1;
            self.last_target_count = worklist.len();
            assert!(!metadata.is_empty(), "metadata must be finalized first");
            Ok(NativeArtifact {
                object: vec![0x7f, b'E', b'L', b'F'],
                clone_targets: b"CT".to_vec(),
            })
        }
    }

    fn snapshot_with_method() -> RuntimeSnapshot {
        let mut snap = RuntimeSnapshot::new();
        let mut table = MethodTable::new("f");
        table
            .methods
            .push(Method::new("A", "f", vec![JuliaType::Int64]));
        snap.add_table("A", table);
        snap.mark_initialized("A");
        snap
    }

    fn metadata_options() -> PackageOptions {
        PackageOptions {
            emit_metadata: true,
            root_module: "Main".to_string(),
            ..PackageOptions::default()
        }
    }

    #[test]
    fn test_nothing_requested_is_a_noop() {
        let snap = RuntimeSnapshot::new();
        let mut codegen = RecordingCodegen::default();
        let output = write_compiler_output(&snap, &[], &mut codegen, &PackageOptions::default())
            .expect("no-op pass succeeds");
        assert!(output.metadata_image.is_none());
        assert!(output.native_object.is_none());
        assert_eq!(codegen.calls, 0);
    }

    #[test]
    fn test_no_initialized_modules_is_fatal() {
        let snap = RuntimeSnapshot::new(); // nothing marked initialized
        let mut codegen = RecordingCodegen::default();
        let result = write_compiler_output(&snap, &[], &mut codegen, &metadata_options());
        assert!(matches!(result, Err(PackageError::NoModulesInitialized)));
    }

    #[test]
    fn test_metadata_only_pass_skips_codegen() {
        let snap = snapshot_with_method();
        let mut codegen = RecordingCodegen::default();
        let output = write_compiler_output(&snap, &[], &mut codegen, &metadata_options())
            .expect("metadata pass succeeds");
        assert!(output.metadata_image.is_some());
        assert!(output.native_object.is_none());
        assert_eq!(codegen.calls, 0);
    }

    #[test]
    fn test_split_mode_generates_native_first_and_embeds_clone_targets() {
        let snap = snapshot_with_method();
        let mut codegen = RecordingCodegen::default();
        let options = PackageOptions {
            emit_native: true,
            ..metadata_options()
        };
        let output = write_compiler_output(&snap, &[], &mut codegen, &options)
            .expect("split pass succeeds");
        assert_eq!(codegen.calls, 1);
        assert_eq!(codegen.last_target_count, 1);

        let image = output.metadata_image.expect("metadata stream present");
        let native = output.native_object.expect("native stream present");
        assert_eq!(native, vec![0x7f, b'E', b'L', b'F']);
        assert!(
            image.windows(2).any(|w| w == b"CT"),
            "clone-target table embedded in the metadata stream"
        );
    }

    #[test]
    fn test_unclosed_module_is_an_advisory_warning() {
        let mut snap = snapshot_with_method();
        snap.mark_open("Dangling");
        let mut codegen = RecordingCodegen::default();
        let output = write_compiler_output(&snap, &[], &mut codegen, &metadata_options())
            .expect("advisory warnings never block packaging");
        assert!(output.metadata_image.is_some());
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("Dangling"));
    }

    #[test]
    fn test_save_image_reports_unwritable_path() {
        let result = save_image("/nonexistent-dir/image.ji", b"bytes");
        match result {
            Err(PackageError::OutputFile { path, .. }) => {
                assert!(path.contains("image.ji"));
            }
            other => panic!("expected OutputFile error, got {:?}", other),
        }
    }
}
