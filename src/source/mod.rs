//! Record source descriptors and the backend interface.
//!
//! Ownership model:
//! - `SourceParams` names one source (location + format) and is the memo key.
//! - `SourceBackend` turns a location into raw text; it knows nothing about
//!   record formats or caching.
//! - `ingestion::RecordLoader` picks a backend, decodes, and memoizes.

use std::fmt;
use std::path::PathBuf;

use crate::errors::SourceError;
use crate::types::{BlobName, ContainerName, LocationLabel};

/// Built-in source backends.
pub mod backends;
/// Record decoding for JSON and JSON-lines sources.
pub mod format;

pub use backends::{BlobBackend, FileBackend};
pub use format::RecordFormat;

/// Where a record source lives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceLocation {
    /// A file on the local filesystem.
    LocalFile {
        /// File path, absolute or relative to the backend's base dir.
        path: PathBuf,
    },
    /// An object in blob storage.
    Blob {
        /// Container name.
        container: ContainerName,
        /// Blob name inside the container.
        blob: BlobName,
    },
}

impl SourceLocation {
    /// Local file location.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        SourceLocation::LocalFile { path: path.into() }
    }

    /// Blob storage location.
    pub fn blob(container: impl Into<ContainerName>, blob: impl Into<BlobName>) -> Self {
        SourceLocation::Blob {
            container: container.into(),
            blob: blob.into(),
        }
    }

    /// Human-readable label used in logs and errors.
    pub fn label(&self) -> LocationLabel {
        self.to_string()
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::LocalFile { path } => write!(f, "{}", path.display()),
            SourceLocation::Blob { container, blob } => write!(f, "blob://{container}/{blob}"),
        }
    }
}

/// Exact parameters of one load; identical params hit the same cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceParams {
    /// Where to read from.
    pub location: SourceLocation,
    /// How to decode what was read.
    pub format: RecordFormat,
}

impl SourceParams {
    /// Create params from a location and format.
    pub fn new(location: SourceLocation, format: RecordFormat) -> Self {
        Self { location, format }
    }
}

/// Backend capable of reading raw text for some kinds of locations.
///
/// Implementations read the whole source into memory; there is no streaming.
pub trait SourceBackend: Send + Sync {
    /// Stable backend identifier used in logs and errors.
    fn id(&self) -> &str;
    /// Whether this backend can read `location`.
    fn supports(&self, location: &SourceLocation) -> bool;
    /// Read the full contents of `location` as text.
    fn read(&self, location: &SourceLocation) -> Result<String, SourceError>;
}
