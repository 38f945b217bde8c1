//! CLI for the DSP dataset provisioner.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dsp_core::config;
use std::path::PathBuf;

use commands::{run_config_path, run_fetch, run_status, FetchOverrides};

/// Top-level CLI for the DSP dataset provisioner.
#[derive(Debug, Parser)]
#[command(name = "dsp")]
#[command(about = "DSP: download and unpack a dataset archive if it is not already present", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download and extract the dataset unless the target directory already exists.
    Fetch {
        /// HTTP/HTTPS URL of the zip archive (overrides config).
        #[arg(long)]
        url: Option<String>,
        /// Extraction directory (overrides config).
        #[arg(long, value_name = "DIR")]
        target_dir: Option<PathBuf>,
        /// Where to keep the zip while extracting (default: <DIR>.zip).
        #[arg(long, value_name = "PATH")]
        archive: Option<PathBuf>,
        /// Keep a directory created by a failed run instead of removing it.
        #[arg(long)]
        no_rollback: bool,
    },

    /// Show whether the target directory is present.
    Status {
        /// Directory to inspect (overrides config).
        #[arg(long, value_name = "DIR")]
        target_dir: Option<PathBuf>,
    },

    /// Print the location of the config file.
    ConfigPath {
        /// Write a default config there if none exists yet.
        #[arg(long)]
        init: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Fetch {
                url,
                target_dir,
                archive,
                no_rollback,
            } => {
                let cfg = load_config()?;
                let overrides = FetchOverrides {
                    url,
                    target_dir,
                    archive,
                    no_rollback,
                };
                run_fetch(&cfg, overrides).await?;
            }
            CliCommand::Status { target_dir } => {
                let dir = match target_dir {
                    Some(dir) => dir,
                    None => load_config()?.dataset.target_dir,
                };
                run_status(&dir)?;
            }
            CliCommand::ConfigPath { init } => run_config_path(init)?,
        }

        Ok(())
    }
}

fn load_config() -> Result<config::DspConfig> {
    let cfg = config::load_or_default()?;
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

#[cfg(test)]
mod tests;
