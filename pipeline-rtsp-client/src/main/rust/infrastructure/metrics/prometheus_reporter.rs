use lazy_static::lazy_static;
use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};

use crate::domain::entities::LinkOutcome;
use crate::domain::ports::MetricsReporter;
use crate::domain::value_objects::PipelineState;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Pipeline state (0=Null, 1=Ready, 2=Paused, 3=Playing)
    pub static ref PIPELINE_STATE: Gauge = Gauge::new(
        "rtsp_client_pipeline_state",
        "Current pipeline state"
    ).expect("metric can be created");

    pub static ref DEFERRED_LINKS: IntCounter = IntCounter::new(
        "rtsp_client_deferred_links_total",
        "Deferred edges linked after output discovery"
    ).expect("metric can be created");

    pub static ref DEFERRED_LINK_FAILURES: IntCounter = IntCounter::new(
        "rtsp_client_deferred_link_failures_total",
        "Deferred link attempts refused by the engine"
    ).expect("metric can be created");

    // Outputs of the wrong media type, or offered to an already linked edge
    pub static ref NEGOTIATION_IGNORED: IntCounter = IntCounter::new(
        "rtsp_client_negotiation_ignored_total",
        "Discovered outputs that were not linked"
    ).expect("metric can be created");

    pub static ref UPTIME_SECONDS: Gauge = Gauge::new(
        "rtsp_client_uptime_seconds",
        "Time the pipeline spent playing"
    ).expect("metric can be created");
}

pub struct PrometheusReporter;

impl PrometheusReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn init_metrics() -> Result<(), prometheus::Error> {
        REGISTRY.register(Box::new(PIPELINE_STATE.clone()))?;
        REGISTRY.register(Box::new(DEFERRED_LINKS.clone()))?;
        REGISTRY.register(Box::new(DEFERRED_LINK_FAILURES.clone()))?;
        REGISTRY.register(Box::new(NEGOTIATION_IGNORED.clone()))?;
        REGISTRY.register(Box::new(UPTIME_SECONDS.clone()))?;
        Ok(())
    }

    pub fn gather_metrics() -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = REGISTRY.gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return b"# Error encoding metrics\n".to_vec();
        }
        buffer
    }
}

impl Default for PrometheusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsReporter for PrometheusReporter {
    fn report_state_change(&self, state: &PipelineState) {
        PIPELINE_STATE.set(state.as_metric());
    }

    fn report_link_outcome(&self, outcome: &LinkOutcome) {
        match outcome {
            LinkOutcome::Linked => DEFERRED_LINKS.inc(),
            LinkOutcome::Failed => DEFERRED_LINK_FAILURES.inc(),
            LinkOutcome::AlreadyLinked | LinkOutcome::Ignored => NEGOTIATION_IGNORED.inc(),
            LinkOutcome::Released => {}
        }
    }

    fn report_uptime(&self, uptime_secs: f64) {
        UPTIME_SECONDS.set(uptime_secs);
    }
}
