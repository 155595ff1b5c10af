// src/error.rs

//! Error types for the kitchen
//!
//! Every pipeline stage has its own error kind so the client can report
//! which stage failed. Tool failures keep the exit status and stderr text
//! of the underlying process verbatim.

use crate::recipe::Stage;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring or cooking a recipe
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid option or settings combination, raised before any stage runs
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Source acquisition failed (clone, checkout, missing subfolder)
    #[error("fetch failed: {0}")]
    FetchError(String),

    /// A patch target or patch file is missing, or a patch did not apply
    #[error("patch failed: {0}")]
    PatchError(String),

    /// The build tool could not be run or exited non-zero
    #[error("build failed: {0}")]
    BuildError(String),

    /// A required file is missing from the build output, or copying failed
    #[error("packaging failed: {0}")]
    PackagingError(String),

    /// Recipe or profile could not be parsed
    #[error("parse error: {0}")]
    ParseError(String),

    /// Checksum of a patch file did not match the recipe
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Filesystem failure outside of a stage-specific context
    #[error("I/O error: {0}")]
    IoError(String),
}

impl Error {
    /// The pipeline stage this error belongs to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::ConfigurationError(_) => Some(Stage::Configure),
            Error::FetchError(_) => Some(Stage::Source),
            Error::PatchError(_) | Error::ChecksumMismatch { .. } => Some(Stage::Patch),
            Error::BuildError(_) => Some(Stage::Build),
            Error::PackagingError(_) => Some(Stage::Package),
            Error::ParseError(_) | Error::IoError(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IoError(e.to_string())
    }
}
