pub mod aggregator;
pub mod pipeline;
pub mod runner;

pub use aggregator::{aggregate, Distribution, EndpointStats};
pub use pipeline::{run_benchmark, Providers};
pub use runner::run;
