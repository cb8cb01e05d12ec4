pub mod config;
pub mod decisioning;
pub mod error;
pub mod telemetry;
