// Byte-source seam: the codecs never touch a filesystem themselves.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// Where map and replay bytes come from.
pub trait ByteSource {
    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    fn last_modified(&self, path: &Path) -> Result<DateTime<Utc>>;
}

/// Builds the error a source reports for a missing path.
pub fn not_found(path: &Path) -> Error {
    Error::FileAccess {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::NotFound, "no such entry"),
    }
}

/// In-memory source, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, (Vec<u8>, DateTime<Utc>)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>, modified: DateTime<Utc>) {
        self.files.insert(path.into(), (bytes.into(), modified));
    }
}

impl ByteSource for MemorySource {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.files
            .get(path)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| not_found(path))
    }

    fn last_modified(&self, path: &Path) -> Result<DateTime<Utc>> {
        self.files
            .get(path)
            .map(|(_, modified)| *modified)
            .ok_or_else(|| not_found(path))
    }
}
