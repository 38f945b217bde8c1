//! Dataset provisioning: make sure the target directory exists and holds the
//! extracted archive, downloading only when the directory is absent.
//!
//! Flow: existence check -> create dir -> GET archive -> extract -> delete
//! archive. The archive is owned by an [`ArchiveFile`] guard so it is removed
//! on every exit path; a directory created by a failed run is rolled back
//! when `rollback_on_failure` is set.

use crate::archive::{archive_path_for, ArchiveFile};
use crate::error::{IoContext, ProvisionError, Result};
use crate::extract::{self, ExtractSummary};
use crate::fetch::{self, FetchOptions};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Dataset served by default: pizza/steak/sushi image classes.
pub const DEFAULT_DATASET_URL: &str =
    "https://github.com/mrdbourke/pytorch-deep-learning/raw/main/data/pizza_steak_sushi.zip";

/// Default extraction directory, relative to the working directory.
pub const DEFAULT_TARGET_DIR: &str = "test_data/pizza_steak_sushi";

/// What to fetch and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    pub url: String,
    pub target_dir: PathBuf,
    /// Where the downloaded zip is kept until extraction finishes.
    pub archive_path: PathBuf,
}

impl DatasetSpec {
    pub fn new(url: impl Into<String>, target_dir: impl Into<PathBuf>) -> Self {
        let target_dir = target_dir.into();
        let archive_path = archive_path_for(&target_dir);
        Self {
            url: url.into(),
            target_dir,
            archive_path,
        }
    }

    pub fn with_archive_path(mut self, archive_path: impl Into<PathBuf>) -> Self {
        self.archive_path = archive_path.into();
        self
    }

    /// Reject URLs curl would not fetch over HTTP before anything touches disk.
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.url).map_err(|e| ProvisionError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ProvisionError::InvalidUrl {
                url: self.url.clone(),
                reason: format!("unsupported scheme {:?}", other),
            }),
        }
    }
}

impl Default for DatasetSpec {
    fn default() -> Self {
        DatasetSpec::new(DEFAULT_DATASET_URL, DEFAULT_TARGET_DIR)
    }
}

#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub fetch: FetchOptions,
    /// Remove the target directory again if this run created it and then failed.
    pub rollback_on_failure: bool,
    /// Set to true to stop a run in progress; cleanup and rollback still happen.
    pub abort: Option<Arc<AtomicBool>>,
}

impl ProvisionOptions {
    fn aborted(&self) -> bool {
        self.abort
            .as_ref()
            .map(|a| a.load(Ordering::Relaxed))
            .unwrap_or(false)
    }
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            fetch: FetchOptions::default(),
            rollback_on_failure: true,
            abort: None,
        }
    }
}

/// Progress notices emitted once per phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    AlreadyPresent { target_dir: PathBuf },
    CreatingDirectory { target_dir: PathBuf },
    Downloading { url: String },
    Downloaded { bytes: u64 },
    Extracting { archive: PathBuf },
    Extracted(ExtractSummary),
    RemovingArchive { archive: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Target directory already existed; nothing was touched.
    AlreadyPresent { target_dir: PathBuf },
    Provisioned {
        target_dir: PathBuf,
        bytes_downloaded: u64,
        extracted: ExtractSummary,
    },
}

impl Outcome {
    pub fn target_dir(&self) -> &Path {
        match self {
            Outcome::AlreadyPresent { target_dir } | Outcome::Provisioned { target_dir, .. } => {
                target_dir
            }
        }
    }
}

/// Read-only view of the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Absent,
    /// Directory exists; `entries` counts its top-level children.
    Present { entries: usize },
    /// Something other than a directory occupies the path.
    NotADirectory,
}

/// Inspect `target_dir` without modifying anything.
pub fn inspect(target_dir: &Path) -> Result<TargetState> {
    let meta = match fs::metadata(target_dir) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(TargetState::Absent),
        Err(e) => return Err(ProvisionError::io(format!("stat {}", target_dir.display()), e)),
    };
    if !meta.is_dir() {
        return Ok(TargetState::NotADirectory);
    }
    let entries = fs::read_dir(target_dir)
        .io_context(|| format!("read directory {}", target_dir.display()))?
        .count();
    Ok(TargetState::Present { entries })
}

/// Ensure `target_directory` holds the extracted archive from `archive_url`.
///
/// Uses default transfer options, the default archive path and rollback on
/// failure. Returns immediately without any request if the directory exists.
pub fn ensure_dataset_present(target_directory: &Path, archive_url: &str) -> Result<Outcome> {
    let spec = DatasetSpec::new(archive_url, target_directory);
    provision(&spec, &ProvisionOptions::default(), |_| {})
}

/// General form of [`ensure_dataset_present`]: explicit spec and options, and
/// an observer called once per phase.
pub fn provision<F>(spec: &DatasetSpec, opts: &ProvisionOptions, mut on_phase: F) -> Result<Outcome>
where
    F: FnMut(&Phase),
{
    match inspect(&spec.target_dir)? {
        TargetState::Present { entries } => {
            tracing::info!(
                entries,
                "directory {} already exists, skipping download",
                spec.target_dir.display()
            );
            on_phase(&Phase::AlreadyPresent {
                target_dir: spec.target_dir.clone(),
            });
            return Ok(Outcome::AlreadyPresent {
                target_dir: spec.target_dir.clone(),
            });
        }
        TargetState::NotADirectory => {
            return Err(ProvisionError::NotADirectory(spec.target_dir.clone()));
        }
        TargetState::Absent => {}
    }

    spec.validate()?;

    on_phase(&Phase::CreatingDirectory {
        target_dir: spec.target_dir.clone(),
    });
    fs::create_dir_all(&spec.target_dir)
        .io_context(|| format!("create directory {}", spec.target_dir.display()))?;

    let result = download_and_extract(spec, opts, &mut on_phase);
    if result.is_err() && opts.rollback_on_failure {
        rollback_target(&spec.target_dir);
    }
    result
}

fn download_and_extract<F>(spec: &DatasetSpec, opts: &ProvisionOptions, on_phase: &mut F) -> Result<Outcome>
where
    F: FnMut(&Phase),
{
    let mut archive = ArchiveFile::create(&spec.archive_path)?;

    tracing::info!("downloading {} to {}", spec.url, archive.path().display());
    on_phase(&Phase::Downloading {
        url: spec.url.clone(),
    });
    let bytes = fetch::fetch_to_writer(
        &spec.url,
        archive.writer()?,
        &opts.fetch,
        opts.abort.as_deref(),
    )?;
    archive.sync()?;
    on_phase(&Phase::Downloaded { bytes });
    if opts.aborted() {
        return Err(ProvisionError::Aborted);
    }

    tracing::info!(
        "extracting {} into {}",
        archive.path().display(),
        spec.target_dir.display()
    );
    on_phase(&Phase::Extracting {
        archive: archive.path().to_path_buf(),
    });
    let extracted = extract::extract_zip(archive.path(), &spec.target_dir)?;
    on_phase(&Phase::Extracted(extracted));

    on_phase(&Phase::RemovingArchive {
        archive: archive.path().to_path_buf(),
    });
    archive.remove()?;

    tracing::info!(
        bytes,
        files = extracted.files,
        "provisioned {}",
        spec.target_dir.display()
    );
    Ok(Outcome::Provisioned {
        target_dir: spec.target_dir.clone(),
        bytes_downloaded: bytes,
        extracted,
    })
}

/// Remove a target directory this run created. Failures are logged only;
/// the original error is what the caller sees.
fn rollback_target(target_dir: &Path) {
    match fs::remove_dir_all(target_dir) {
        Ok(()) => tracing::info!("rolled back partially provisioned {}", target_dir.display()),
        Err(e) => tracing::warn!("rollback of {} failed: {}", target_dir.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_uses_fixed_paths() {
        let spec = DatasetSpec::default();
        assert_eq!(spec.url, DEFAULT_DATASET_URL);
        assert_eq!(spec.target_dir, PathBuf::from("test_data/pizza_steak_sushi"));
        assert_eq!(spec.archive_path, PathBuf::from("test_data/pizza_steak_sushi.zip"));
    }

    #[test]
    fn validate_rejects_non_http() {
        let spec = DatasetSpec::new("ftp://example.com/x.zip", "out");
        assert!(matches!(spec.validate(), Err(ProvisionError::InvalidUrl { .. })));
        let spec = DatasetSpec::new("not a url", "out");
        assert!(matches!(spec.validate(), Err(ProvisionError::InvalidUrl { .. })));
        assert!(DatasetSpec::default().validate().is_ok());
    }

    #[test]
    fn inspect_reports_each_state() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("set");
        assert_eq!(inspect(&target).unwrap(), TargetState::Absent);
        fs::create_dir(&target).unwrap();
        assert_eq!(inspect(&target).unwrap(), TargetState::Present { entries: 0 });
        fs::write(target.join("a.jpg"), b"x").unwrap();
        assert_eq!(inspect(&target).unwrap(), TargetState::Present { entries: 1 });
        let file = dir.path().join("file");
        fs::write(&file, b"x").unwrap();
        assert_eq!(inspect(&file).unwrap(), TargetState::NotADirectory);
    }

    #[test]
    fn existing_empty_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("set");
        fs::create_dir(&target).unwrap();
        // Unroutable URL: reaching the network would fail the test.
        let spec = DatasetSpec::new("http://127.0.0.1:1/never.zip", &target);
        let mut phases = Vec::new();
        let outcome = provision(&spec, &ProvisionOptions::default(), |p| phases.push(p.clone())).unwrap();
        assert_eq!(outcome, Outcome::AlreadyPresent { target_dir: target.clone() });
        assert_eq!(phases, vec![Phase::AlreadyPresent { target_dir: target.clone() }]);
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
        assert!(!spec.archive_path.exists());
    }

    #[test]
    fn file_at_target_is_rejected_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("set");
        fs::write(&target, b"occupied").unwrap();
        let err = ensure_dataset_present(&target, DEFAULT_DATASET_URL).unwrap_err();
        assert!(matches!(err, ProvisionError::NotADirectory(_)));
        assert_eq!(fs::read(&target).unwrap(), b"occupied");
    }

    #[test]
    fn invalid_url_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/set");
        let err = ensure_dataset_present(&target, "file:///etc/passwd").unwrap_err();
        assert!(matches!(err, ProvisionError::InvalidUrl { .. }));
        assert!(!dir.path().join("nested").exists());
    }

    #[test]
    fn network_failure_rolls_back_and_cleans_archive() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("set");
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{}/set.zip", port);
        let err = ensure_dataset_present(&target, &url).unwrap_err();
        assert!(matches!(err, ProvisionError::Network(_)), "got {:?}", err);
        assert!(!target.exists());
        assert!(!dir.path().join("set.zip").exists());
    }
}
