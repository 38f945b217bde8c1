//! `dsp fetch` – provision the dataset directory.

use anyhow::{Context, Result};
use dsp_core::config::DspConfig;
use dsp_core::provision::{self, DatasetSpec, Outcome, Phase, ProvisionOptions};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct FetchOverrides {
    pub url: Option<String>,
    pub target_dir: Option<PathBuf>,
    pub archive: Option<PathBuf>,
    pub no_rollback: bool,
}

/// Merge CLI overrides onto the config. A new target dir without an explicit
/// archive path gets the default `<dir>.zip` rather than the configured one.
pub fn resolve(cfg: &DspConfig, o: FetchOverrides) -> (DatasetSpec, ProvisionOptions) {
    let mut spec = cfg.dataset_spec();
    if let Some(url) = o.url {
        spec.url = url;
    }
    if let Some(dir) = o.target_dir {
        spec = DatasetSpec::new(spec.url, dir);
    }
    if let Some(archive) = o.archive {
        spec = spec.with_archive_path(archive);
    }
    let mut opts = cfg.provision_options();
    if o.no_rollback {
        opts.rollback_on_failure = false;
    }
    (spec, opts)
}

fn print_phase(phase: &Phase) {
    match phase {
        Phase::AlreadyPresent { target_dir } => {
            println!("Directory \"{}\" already exists", target_dir.display())
        }
        Phase::CreatingDirectory { target_dir } => {
            println!("Creating {}", target_dir.display())
        }
        Phase::Downloading { url } => println!("Downloading {}", url),
        Phase::Downloaded { bytes } => {
            println!("Downloaded {:.2} MiB", *bytes as f64 / 1_048_576.0)
        }
        Phase::Extracting { archive } => println!("Unzipping {}", archive.display()),
        Phase::Extracted(s) => println!("Extracted {} files in {} directories", s.files, s.dirs),
        Phase::RemovingArchive { archive } => println!("Removing {}", archive.display()),
    }
}

/// Raise `flag` on Ctrl-C so the blocking run stops and cleans up after itself.
async fn abort_on_ctrl_c(flag: Arc<AtomicBool>) {
    if tokio::signal::ctrl_c().await.is_ok() {
        eprintln!("Interrupted, cleaning up...");
        tracing::info!("ctrl-c received, aborting provisioning");
        flag.store(true, Ordering::Relaxed);
    }
}

pub async fn run_fetch(cfg: &DspConfig, overrides: FetchOverrides) -> Result<()> {
    let (spec, mut opts) = resolve(cfg, overrides);
    tracing::debug!(?spec, "fetch");
    let abort = Arc::new(AtomicBool::new(false));
    opts.abort = Some(Arc::clone(&abort));
    let watcher = tokio::spawn(abort_on_ctrl_c(abort));
    let joined =
        tokio::task::spawn_blocking(move || provision::provision(&spec, &opts, print_phase)).await;
    watcher.abort();
    let outcome = joined.context("provision task join")??;
    if let Outcome::Provisioned { target_dir, .. } = outcome {
        println!("Dataset ready at {}", target_dir.display());
    }
    Ok(())
}
