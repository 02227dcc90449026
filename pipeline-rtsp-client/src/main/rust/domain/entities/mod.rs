mod deferred_link;
mod node_graph;
mod pipeline_lifecycle;
mod shutdown_guard;

pub use deferred_link::{negotiate, DeferredLink, LinkOutcome, Negotiation};
pub use node_graph::{Edge, EdgeKind, EdgeState, EdgeSummary, NodeGraph, TopologySummary};
pub use pipeline_lifecycle::{PipelineLifecycle, StateTransition};
pub use shutdown_guard::ShutdownGuard;
