use crate::domain::entities::LinkOutcome;
use crate::domain::value_objects::PipelineState;

/// Port for metrics reporting
pub trait MetricsReporter: Send + Sync {
    fn report_state_change(&self, state: &PipelineState);
    fn report_link_outcome(&self, outcome: &LinkOutcome);
    fn report_uptime(&self, uptime_secs: f64);
}
