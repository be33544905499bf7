//! Error types for the packaging pass.
//!
//! Per-candidate failures (invalid instantiations, uncallable tuples) never
//! surface here - the enumerator discards them and continues. These are the
//! errors that stop or gate the whole pass.

use thiserror::Error;

use crate::image::ImageError;

/// Failure reported by an external code generator.
#[derive(Debug, Error)]
#[error("code generation failed: {0}")]
pub struct CodegenError(pub String);

/// Fatal errors of one packaging invocation.
#[derive(Debug, Error)]
pub enum PackageError {
    /// Output was requested but no modules were initialized during the
    /// run; there is nothing to package.
    #[error("output requested, but no modules were initialized during the run")]
    NoModulesInitialized,

    /// The external code generator failed.
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// Image serialization or layout failure.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The output file could not be opened or written.
    #[error("cannot open system image file \"{path}\" for writing: {source}")]
    OutputFile {
        path: String,
        source: std::io::Error,
    },
}
