mod media_engine;
mod metrics_reporter;

pub use media_engine::{MediaEngine, RunOutcome};
pub use metrics_reporter::MetricsReporter;
