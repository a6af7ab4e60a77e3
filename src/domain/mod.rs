// Domain layer: models, static catalog, workflow state and ports (interfaces).

pub mod catalog;
pub mod model;
pub mod ports;
pub mod state;
