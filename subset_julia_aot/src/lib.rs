//! AoT specialization selection and system-image packaging.
//!
//! Given a read-only snapshot of the method-table universe after a program
//! run, this crate decides which type-specialized compiled bodies are
//! worth materializing natively, expands union-typed and
//! `where`-parameterized signatures into concrete leaf candidates, and
//! serializes the selected artifacts plus provenance metadata into a
//! versioned, checksummed image that can be reloaded without re-running
//! the program.
//!
//! # Architecture
//!
//! ```text
//! Universe snapshot → Collect → Enumerate + Policy → WorkList
//!                                                       │
//!                                  CodeGenerator ◄──────┤
//!                                        │              │
//!                                        ▼              ▼
//!                                  native stream   ImageWriter → .ji image
//! ```
//!
//! Type inference, the dispatch algorithm, and machine-code generation are
//! external collaborators behind the [`method_table::Universe`] and
//! [`driver::CodeGenerator`] seams; this crate only selects inputs for
//! code generation and packages outputs.

// Prevent accidental debug output in library code; diagnostics surface as
// structured warnings on the packaging output.
#![deny(clippy::print_stderr)]
#![deny(clippy::print_stdout)]

// Type-signature algebra
pub mod types;

// Runtime snapshot: method tables, specializations, compiled-code records
pub mod method_table;

// Leaf-signature enumeration (union splitting + type-variable expansion)
pub mod enumerate;

// Reachable-definition collection
pub mod collect;

// Inclusion policy for compiled-code records
pub mod policy;

// Work-list assembly
pub mod worklist;

// System-image file format
pub mod image;

// Error types
pub mod error;

// The packaging pass
pub mod driver;

pub use collect::{collect, CollectScope, Collected};
pub use driver::{
    save_image, write_compiler_output, CodeGenerator, NativeArtifact, PackageOptions,
    PackageOutput,
};
pub use enumerate::{enumerate_leaf_signatures, MAX_UNION_SPLITS};
pub use error::{CodegenError, PackageError};
pub use image::{parse_image, ImageMetadata, ImageWriter, SourceDependency};
pub use method_table::{
    CompiledArtifact, EntryPoint, InferredBody, Method, MethodTable, RuntimeSnapshot,
    Specialization, Universe, INLINE_COST_NEVER,
};
pub use policy::{forces_entry_point, should_emit};
pub use types::{InstantiationError, JuliaType, Signature, TypeParam};
pub use worklist::{build_worklist, CompileTarget, WorkItem, WorkList, WorklistOptions};
