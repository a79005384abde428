pub mod io;
pub mod model;
pub mod validation;

pub use io::{read_config, write_config};
pub use model::{AuthSettings, BenchConfig, SlaSettings, TelemetrySettings};
pub use validation::validate_config;
