//! `dsp config-path` – print where the config file lives.

use anyhow::Result;
use dsp_core::config;

pub fn run_config_path(init: bool) -> Result<()> {
    let path = config::config_path()?;
    if init && config::init_at(&path)? {
        println!("wrote default config to {}", path.display());
    } else {
        println!("{}", path.display());
    }
    Ok(())
}
