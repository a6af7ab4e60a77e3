pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::HttpCloudApi;
pub use config::{cli::FileStateStore, toml_config::WorkflowConfig};
pub use crate::core::workflow::Workflow;
pub use utils::error::{Result, WorkflowError};
