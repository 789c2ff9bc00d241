//! Error type for locating and merging file pairs.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating or merging pairs.
///
/// Root and construction errors (`InvalidRoot`, `ReadDir`, `InvalidExtensions`, encoding
/// lookups) reach the caller. Everything else is caught at the pair boundary and becomes
/// an `IoError` outcome.
#[derive(Debug, Error)]
pub enum MergeError {
    // Root directory
    #[error("Invalid directory {path}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("Cannot list directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Per-pair filesystem
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot inspect {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Counterpart {path} exists but is not a regular file.")]
    CounterpartNotFile { path: PathBuf },

    #[error("Cannot open {path} for appending: {source}")]
    OpenAppend {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Construction
    #[error("Invalid extension pair '{input}': {reason}")]
    InvalidExtensions { input: String, reason: String },

    #[error("Unknown encoding label '{label}'.")]
    UnknownEncoding { label: String },

    #[error("Encoding '{name}' cannot be used as a merge candidate: {reason}")]
    UnsupportedEncoding { name: String, reason: String },

    #[error("Encoding candidate list is empty; at least one encoding is required.")]
    EmptyEncodingList,
}
