pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::StreamPipeline;
pub use config::{Config, PlatformArg};
pub use domain::entities::{
    negotiate, DeferredLink, Edge, EdgeKind, EdgeState, EdgeSummary, LinkOutcome, Negotiation,
    NodeGraph, PipelineLifecycle, ShutdownGuard, StateTransition, TopologySummary,
};
pub use domain::errors::{DomainError, Result};
pub use domain::ports::{MediaEngine, MetricsReporter, RunOutcome};
pub use domain::services::TopologyBuilder;
pub use domain::value_objects::{
    MediaType, NodeProperty, NodeRole, NodeSpec, OutputDescription, PipelineConfig,
    PipelineState, PlatformClass, VideoCodec,
};
pub use infrastructure::gstreamer::{GStreamerEngine, PipelineBuilder};
pub use infrastructure::metrics::{serve_metrics, PrometheusReporter};
