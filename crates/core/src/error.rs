//! Error types for document normalization.

use crate::style::StyleRole;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, normalizing, or saving a document.
///
/// Every variant is terminal: nothing is retried and no partial output is written.
#[derive(Error, Debug)]
pub enum Error {
    /// The input path does not resolve to a readable file.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The input is not a valid document of the expected format.
    #[error("Failed to load document: {0}")]
    LoadFailure(String),

    /// The output could not be produced or written.
    #[error("Failed to save document: {0}")]
    SaveFailure(String),

    /// A style the normalizer assigns is not defined by the document.
    #[error("Required style '{name}' ({role}) is not defined in the document")]
    StyleMissing {
        /// The role that could not be resolved.
        role: StyleRole,
        /// The style name that was looked up.
        name: &'static str,
    },
}
