//! `dsp status` – report whether the dataset directory is present.

use anyhow::Result;
use dsp_core::provision::{self, TargetState};
use std::path::Path;

pub fn run_status(target_dir: &Path) -> Result<()> {
    match provision::inspect(target_dir)? {
        TargetState::Absent => println!("{}: absent", target_dir.display()),
        TargetState::Present { entries } => {
            println!("{}: present ({} entries)", target_dir.display(), entries)
        }
        TargetState::NotADirectory => {
            println!("{}: occupied by a non-directory", target_dir.display())
        }
    }
    Ok(())
}
