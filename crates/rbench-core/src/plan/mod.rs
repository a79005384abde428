pub mod model;
pub mod placeholders;
pub mod planner;

pub use model::{CompositeId, EndpointDetail, HttpMethod, RequestBody, RequestDetail, WorkUnit};
pub use planner::plan;
