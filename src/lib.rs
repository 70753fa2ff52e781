pub mod config;
pub mod error;
pub mod reliability;
pub mod telemetry;
