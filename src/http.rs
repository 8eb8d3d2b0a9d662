pub mod client;
pub mod config;
pub mod rate_limit;
pub mod telemetry;
