pub mod logging;
pub mod metrics;

pub use logging::init_tracing;
pub use metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION, gather_metrics};
