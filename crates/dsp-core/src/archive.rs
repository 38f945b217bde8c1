//! Transient archive file lifecycle.
//!
//! `ArchiveFile` owns the on-disk zip between download and extraction and
//! deletes it when dropped, so the file never outlives the run regardless of
//! which step fails.

use crate::error::{IoContext, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Suffix appended to the target directory to form the default archive path.
pub const ARCHIVE_SUFFIX: &str = ".zip";

/// Default archive path for a target directory: appends `.zip`
/// (e.g. `test_data/pizza_steak_sushi` -> `test_data/pizza_steak_sushi.zip`).
pub fn archive_path_for(target_dir: &Path) -> PathBuf {
    match target_dir.file_name() {
        Some(name) => {
            let mut o = name.to_os_string();
            o.push(ARCHIVE_SUFFIX);
            target_dir.with_file_name(o)
        }
        None => target_dir.join(format!("dataset{}", ARCHIVE_SUFFIX)),
    }
}

/// Scoped owner of the downloaded archive. Removed on drop if still present.
#[derive(Debug)]
pub struct ArchiveFile {
    file: Option<File>,
    path: PathBuf,
    /// Cleared once the file has been removed explicitly.
    armed: bool,
}

impl ArchiveFile {
    /// Create (or truncate) the archive file at `path`, creating parent dirs.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .io_context(|| format!("create directory {}", parent.display()))?;
        }
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .io_context(|| format!("create archive file {}", path.display()))?;
        Ok(ArchiveFile {
            file: Some(file),
            path: path.to_path_buf(),
            armed: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write handle for the download body.
    pub fn writer(&mut self) -> Result<&mut File> {
        let path = &self.path;
        self.file.as_mut().ok_or_else(|| {
            crate::ProvisionError::io(
                format!("archive file {} already closed", path.display()),
                io::Error::from(io::ErrorKind::BrokenPipe),
            )
        })
    }

    /// Flush data to disk and close the write handle so the path can be
    /// reopened for reading.
    pub fn sync(&mut self) -> Result<()> {
        if let Some(file) = self.file.take() {
            file.sync_all()
                .io_context(|| format!("sync archive file {}", self.path.display()))?;
        }
        Ok(())
    }

    /// Delete the archive now, reporting failure. Consumes the guard.
    pub fn remove(mut self) -> Result<()> {
        self.file.take();
        self.armed = false;
        remove_if_present(&self.path)
            .io_context(|| format!("remove archive file {}", self.path.display()))?;
        Ok(())
    }
}

impl Drop for ArchiveFile {
    fn drop(&mut self) {
        self.file.take();
        if !self.armed {
            return;
        }
        match remove_if_present(&self.path) {
            Ok(true) => tracing::debug!("removed leftover archive {}", self.path.display()),
            Ok(false) => {}
            Err(e) => tracing::warn!("failed to remove archive {}: {}", self.path.display(), e),
        }
    }
}

/// Returns Ok(true) if a file was removed, Ok(false) if nothing was there.
fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
