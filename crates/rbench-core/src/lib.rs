pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod plan;
pub mod providers;
pub mod results;
pub mod telemetry;

pub use error::RbenchError;
