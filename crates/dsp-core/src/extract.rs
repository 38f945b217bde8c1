//! Zip extraction into the target directory.

use crate::error::{IoContext, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Counts of what an extraction wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub files: usize,
    pub dirs: usize,
    /// Uncompressed bytes written.
    pub bytes: u64,
}

/// Extract every entry of the zip at `archive_path` into `destination`.
///
/// Entries whose names would land outside `destination` (absolute paths,
/// `..` components) are skipped. On Unix, stored permission bits are applied:
/// file modes right after each file is written, directory modes only once
/// every entry is in place, so a read-only directory cannot block its children.
pub fn extract_zip(archive_path: &Path, destination: &Path) -> Result<ExtractSummary> {
    let file = File::open(archive_path)
        .io_context(|| format!("open archive {}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut summary = ExtractSummary::default();
    let mut dir_modes: Vec<(PathBuf, u32)> = Vec::new();

    fs::create_dir_all(destination)
        .io_context(|| format!("create directory {}", destination.display()))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let outpath = match entry.enclosed_name() {
            Some(rel) => destination.join(rel),
            None => {
                tracing::warn!("skipping unsafe archive entry {:?}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath)
                .io_context(|| format!("create directory {}", outpath.display()))?;
            summary.dirs += 1;
            if let Some(mode) = entry.unix_mode() {
                dir_modes.push((outpath, mode));
            }
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)
                    .io_context(|| format!("create directory {}", parent.display()))?;
            }
            let mut out = File::create(&outpath)
                .io_context(|| format!("create {}", outpath.display()))?;
            let n = io::copy(&mut entry, &mut out)
                .io_context(|| format!("extract {}", outpath.display()))?;
            summary.files += 1;
            summary.bytes += n;
            if let Some(mode) = entry.unix_mode() {
                apply_mode(&outpath, mode)?;
            }
        }
    }

    // Deepest first, so a restrictive parent mode cannot block a child chmod.
    dir_modes.sort_by_key(|(p, _)| std::cmp::Reverse(p.components().count()));
    for (path, mode) in &dir_modes {
        apply_mode(path, *mode)?;
    }

    tracing::debug!(
        files = summary.files,
        dirs = summary.dirs,
        bytes = summary.bytes,
        "extracted {}",
        archive_path.display()
    );
    Ok(summary)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .io_context(|| format!("set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
