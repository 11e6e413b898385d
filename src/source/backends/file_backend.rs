use std::path::PathBuf;

use crate::constants::source::FILE_BACKEND_ID;
use crate::errors::SourceError;
use crate::source::{SourceBackend, SourceLocation};
use crate::transport::fs::read_utf8;

/// Reads local files, optionally relative to a base directory.
#[derive(Clone, Debug, Default)]
pub struct FileBackend {
    base_dir: Option<PathBuf>,
}

impl FileBackend {
    /// Backend resolving relative paths against the working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative paths against `base_dir` instead.
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }
}

impl SourceBackend for FileBackend {
    fn id(&self) -> &str {
        FILE_BACKEND_ID
    }

    fn supports(&self, location: &SourceLocation) -> bool {
        matches!(location, SourceLocation::LocalFile { .. })
    }

    fn read(&self, location: &SourceLocation) -> Result<String, SourceError> {
        let SourceLocation::LocalFile { path } = location else {
            return Err(SourceError::NoBackend {
                location: location.label(),
            });
        };
        match &self.base_dir {
            Some(base) if path.is_relative() => read_utf8(&base.join(path)),
            _ => read_utf8(path),
        }
    }
}
