//! CLI command handlers. Each command is in its own file.

mod config_path;
mod fetch;
mod status;

pub use config_path::run_config_path;
pub use fetch::{run_fetch, FetchOverrides};
pub use status::run_status;
