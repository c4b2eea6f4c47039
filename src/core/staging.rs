//! Staging resource management
//!
//! Every intermediate artifact of a run (chunk inputs, chunk outputs,
//! unmapped lists, transform scratch files) is a [`StagedFile`] created
//! under a caller-supplied [`StagingDir`]. A staged file removes itself
//! when released or dropped, so cleanup happens on every exit path.

use crate::core::error::StagingError;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// Random characters substituted for `*` in a name pattern
const RANDOM_NAME_LEN: usize = 10;

/// Directory under which staged files are created
#[derive(Debug, Clone)]
pub struct StagingDir {
    dir: PathBuf,
}

impl StagingDir {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Create a uniquely named, empty file
    ///
    /// `pattern` contains at most one `*`, replaced by random characters
    /// (`"chunk_in_*.bed"`). Without `*` the random part is appended.
    pub fn acquire(&self, pattern: &str) -> Result<StagedFile, StagingError> {
        let (prefix, suffix) = pattern.split_once('*').unwrap_or((pattern, ""));

        let temp = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .rand_bytes(RANDOM_NAME_LEN)
            .tempfile_in(&self.dir)
            .map_err(|source| StagingError {
                dir: self.dir.clone(),
                pattern: pattern.to_string(),
                source,
            })?;

        // The handle is dropped here; users reopen by path.
        let (_, temp_path) = temp.into_parts();
        let path = temp_path.to_path_buf();
        log::trace!("Acquired staging file {:?}", path);

        Ok(StagedFile {
            path,
            temp: Some(temp_path),
        })
    }

    /// Acquire several files at once; on failure none of them remain
    pub fn acquire_many(&self, patterns: &[&str]) -> Result<Vec<StagedFile>, StagingError> {
        let mut files = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            // Already-acquired files are released when `files` drops.
            files.push(self.acquire(pattern)?);
        }
        Ok(files)
    }
}

/// An ephemeral file owned by one scope
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    temp: Option<TempPath>,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_released(&self) -> bool {
        self.temp.is_none()
    }

    /// Delete the underlying file
    ///
    /// Idempotent. Deletion errors are logged, never returned.
    pub fn release(&mut self) {
        let Some(temp) = self.temp.take() else {
            return;
        };
        match temp.close() {
            Ok(()) => log::trace!("Released staging file {:?}", self.path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::trace!("Staging file {:?} already gone", self.path)
            }
            Err(e) => log::warn!("Failed to remove staging file {:?}: {}", self.path, e),
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        self.release();
    }
}
