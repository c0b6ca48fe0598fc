// Filesystem byte source for the codecs.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use osu_model::{ByteSource, Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl ByteSource for FsSource {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        })
    }

    fn last_modified(&self, path: &Path) -> Result<DateTime<Utc>> {
        let modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(|source| Error::FileAccess {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(DateTime::<Utc>::from(modified))
    }
}
