pub mod deploy;
pub mod estimator;
pub mod fields;
pub mod iac;
pub mod rules;
pub mod workflow;

pub use crate::domain::ports::{CloudApi, StateStore};
pub use crate::utils::error::Result;
