use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::FetchOptions;
use crate::provision::{DatasetSpec, ProvisionOptions, DEFAULT_DATASET_URL, DEFAULT_TARGET_DIR};

/// Which archive to fetch and where to extract it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// HTTP/HTTPS URL of the zip archive.
    pub url: String,
    /// Extraction directory (relative paths resolve against the working directory).
    pub target_dir: PathBuf,
    /// Where the zip is kept during extraction; defaults to `<target_dir>.zip`.
    pub archive_path: Option<PathBuf>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATASET_URL.to_string(),
            target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
            archive_path: None,
        }
    }
}

/// Transfer limits for the archive GET (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Abort when throughput stays below this for `low_speed_time_secs`.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
    /// Overall transfer timeout; unlimited if absent.
    pub timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let d = FetchOptions::default();
        Self {
            connect_timeout_secs: d.connect_timeout.as_secs(),
            low_speed_limit_bytes: d.low_speed_limit,
            low_speed_time_secs: d.low_speed_time.as_secs(),
            timeout_secs: None,
            user_agent: None,
        }
    }
}

impl HttpConfig {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            low_speed_limit: self.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
            timeout: self.timeout_secs.map(Duration::from_secs),
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or_else(crate::fetch::default_user_agent),
        }
    }
}

/// Global configuration loaded from `~/.config/dsp/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DspConfig {
    /// Remove a target directory this run created if provisioning fails.
    pub rollback_on_failure: bool,
    pub dataset: DatasetConfig,
    pub http: HttpConfig,
}

impl Default for DspConfig {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
            dataset: DatasetConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl DspConfig {
    pub fn dataset_spec(&self) -> DatasetSpec {
        let spec = DatasetSpec::new(self.dataset.url.clone(), self.dataset.target_dir.clone());
        match &self.dataset.archive_path {
            Some(p) => spec.with_archive_path(p.clone()),
            None => spec,
        }
    }

    pub fn provision_options(&self) -> ProvisionOptions {
        ProvisionOptions {
            fetch: self.http.fetch_options(),
            rollback_on_failure: self.rollback_on_failure,
            abort: None,
        }
    }
}

/// `~/.config/dsp/config.toml`. Only computes the path; creates nothing.
pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dsp")?;
    Ok(xdg_dirs.get_config_home().join("dsp").join("config.toml"))
}

/// Load configuration from disk; built-in defaults if no file exists.
/// Never writes anything.
pub fn load_or_default() -> Result<DspConfig> {
    load_or_default_at(&config_path()?)
}

pub fn load_or_default_at(path: &Path) -> Result<DspConfig> {
    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(DspConfig::default());
    }
    load_from_path(path)
}

/// Write the default configuration to `path`, creating parent dirs.
/// Returns false (and leaves the file alone) if one already exists.
pub fn init_at(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    let toml = toml::to_string_pretty(&DspConfig::default())?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, toml).with_context(|| format!("write {}", path.display()))?;
    tracing::info!("created default config at {}", path.display());
    Ok(true)
}

/// Load configuration from a specific file.
pub fn load_from_path(path: &Path) -> Result<DspConfig> {
    let data = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: DspConfig =
        toml::from_str(&data).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}
