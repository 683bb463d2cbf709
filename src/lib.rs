//! Bike-sharing demand exploration: load an hourly rental dataset, derive
//! calendar and categorical fields, filter, and aggregate for the dashboard.

pub mod config;
pub mod data;
pub mod error;
pub mod state;
