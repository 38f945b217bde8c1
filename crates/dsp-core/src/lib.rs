pub mod config;
pub mod logging;

pub mod archive;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod provision;

pub use error::ProvisionError;
pub use provision::{ensure_dataset_present, provision, DatasetSpec, Outcome, Phase};
