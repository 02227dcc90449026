use std::fmt;
use std::sync::{Arc, Mutex};

use super::node_graph::{lock_state, Edge, EdgeKind, EdgeState};
use crate::domain::ports::MetricsReporter;
use crate::domain::value_objects::{MediaType, OutputDescription};

/// What the linking policy wants to do with a newly discovered output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiation {
    /// Teardown has begun, leave the endpoint alone
    Abort,
    /// The downstream endpoint already has a peer
    AlreadyLinked,
    /// The output carries a media type this edge does not accept
    Ignore,
    Attempt,
}

/// Pure decision step of the dynamic linking policy
pub fn negotiate(state: EdgeState, expects: MediaType, output: &OutputDescription) -> Negotiation {
    match state {
        EdgeState::Released => Negotiation::Abort,
        EdgeState::Linked => Negotiation::AlreadyLinked,
        EdgeState::Unlinked if !expects.accepts(output) => Negotiation::Ignore,
        EdgeState::Unlinked => Negotiation::Attempt,
    }
}

/// Result of handling one discovery event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Released,
    AlreadyLinked,
    Ignored,
    Linked,
    Failed,
}

/// Handler bound to one deferred edge, invoked from engine threads whenever
/// the upstream node announces a new output.
///
/// The edge state lock is held for the whole decision and link attempt, so a
/// concurrent teardown either waits for the attempt to finish or wins the lock
/// first and turns the handler into a no-op.
#[derive(Clone)]
pub struct DeferredLink {
    label: String,
    expects: MediaType,
    state: Arc<Mutex<EdgeState>>,
    metrics: Arc<dyn MetricsReporter>,
}

impl DeferredLink {
    /// Bind a handler to `edge`; returns `None` for static edges
    pub fn for_edge(edge: &Edge, metrics: Arc<dyn MetricsReporter>) -> Option<Self> {
        match edge.kind() {
            EdgeKind::Deferred { expects } => Some(Self {
                label: edge.label().to_string(),
                expects,
                state: edge.shared_state(),
                metrics,
            }),
            EdgeKind::Static => None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn expects(&self) -> MediaType {
        self.expects
    }

    pub fn state(&self) -> EdgeState {
        *lock_state(&self.state)
    }

    /// Run the linking policy for `output`. `try_link` performs the actual
    /// engine link and is only called when the policy decides to attempt it.
    pub fn on_output_discovered<F>(&self, output: &OutputDescription, try_link: F) -> LinkOutcome
    where
        F: FnOnce() -> bool,
    {
        let mut state = lock_state(&self.state);

        let outcome = match negotiate(*state, self.expects, output) {
            Negotiation::Abort => {
                tracing::debug!("{}: output '{}' arrived after release, ignoring", self.label, output.port);
                LinkOutcome::Released
            }
            Negotiation::AlreadyLinked => {
                tracing::info!("{}: already linked, ignoring output '{}'", self.label, output.port);
                LinkOutcome::AlreadyLinked
            }
            Negotiation::Ignore => {
                tracing::info!(
                    "{}: output '{}' has type '{}' which is not {}, ignoring",
                    self.label,
                    output.port,
                    output.media_type,
                    self.expects
                );
                LinkOutcome::Ignored
            }
            Negotiation::Attempt => {
                if try_link() {
                    *state = EdgeState::Linked;
                    tracing::info!("{}: link succeeded (type '{}')", self.label, output.media_type);
                    LinkOutcome::Linked
                } else {
                    tracing::warn!(
                        "{}: type is '{}' but link failed, downstream will receive no data",
                        self.label,
                        output.media_type
                    );
                    LinkOutcome::Failed
                }
            }
        };
        drop(state);

        self.metrics.report_link_outcome(&outcome);
        outcome
    }

    /// Upstream dropped an output. The edge goes back to `Unlinked` when the
    /// downstream endpoint lost its peer, so a later discovery can relink it.
    pub fn on_output_removed(&self, downstream_still_linked: bool) {
        let mut state = lock_state(&self.state);
        if *state == EdgeState::Linked && !downstream_still_linked {
            tracing::info!("{}: upstream output removed, edge unlinked", self.label);
            *state = EdgeState::Unlinked;
        }
    }

    /// Mark the edge released; called when the downstream endpoint is gone
    pub fn release(&self) {
        *lock_state(&self.state) = EdgeState::Released;
    }
}

impl fmt::Debug for DeferredLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredLink")
            .field("label", &self.label)
            .field("expects", &self.expects)
            .field("state", &self.state())
            .finish()
    }
}
