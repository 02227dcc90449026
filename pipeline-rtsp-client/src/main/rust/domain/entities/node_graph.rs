use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::value_objects::{MediaType, NodeRole, NodeSpec};

/// Link state of a single edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeState {
    Unlinked,
    Linked,
    /// Teardown has begun; the downstream endpoint must not be touched again
    Released,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum EdgeKind {
    /// Both endpoints are known when the graph is built
    Static,
    /// Linked once the upstream node exposes an output of the expected type
    Deferred { expects: MediaType },
}

pub(crate) fn lock_state(state: &Mutex<EdgeState>) -> MutexGuard<'_, EdgeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Directed connection between two consecutive nodes of a [`NodeGraph`]
#[derive(Debug)]
pub struct Edge {
    upstream: usize,
    downstream: usize,
    kind: EdgeKind,
    label: String,
    state: Arc<Mutex<EdgeState>>,
}

impl Edge {
    fn new(upstream: &NodeSpec, downstream: &NodeSpec, index: usize, kind: EdgeKind) -> Self {
        Self {
            upstream: index,
            downstream: index + 1,
            kind,
            label: format!("{} -> {}", upstream.name(), downstream.name()),
            state: Arc::new(Mutex::new(EdgeState::Unlinked)),
        }
    }

    pub fn upstream(&self) -> usize {
        self.upstream
    }

    pub fn downstream(&self) -> usize {
        self.downstream
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self.kind, EdgeKind::Deferred { .. })
    }

    pub fn state(&self) -> EdgeState {
        *lock_state(&self.state)
    }

    pub fn is_linked(&self) -> bool {
        self.state() == EdgeState::Linked
    }

    pub(crate) fn mark_linked(&self) {
        let mut state = lock_state(&self.state);
        if *state == EdgeState::Unlinked {
            *state = EdgeState::Linked;
        }
    }

    pub(crate) fn release(&self) {
        *lock_state(&self.state) = EdgeState::Released;
    }

    pub(crate) fn shared_state(&self) -> Arc<Mutex<EdgeState>> {
        Arc::clone(&self.state)
    }
}

/// Serializable snapshot of a graph, used for diagnostics
#[derive(Debug, Clone, serde::Serialize)]
pub struct TopologySummary {
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSummary>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct EdgeSummary {
    pub label: String,
    pub kind: EdgeKind,
    pub state: EdgeState,
}

/// Ordered chain of processing nodes: every node but the first has exactly
/// one upstream edge and every node but the last has exactly one downstream edge
#[derive(Debug)]
pub struct NodeGraph {
    nodes: Vec<NodeSpec>,
    edges: Vec<Edge>,
}

impl NodeGraph {
    /// Chain `nodes` in order. `deferred` lists the upstream index of every edge
    /// that must wait for the upstream node to announce its output type.
    pub fn chain(nodes: Vec<NodeSpec>, deferred: &[(usize, MediaType)]) -> Self {
        let edges = nodes
            .windows(2)
            .enumerate()
            .map(|(index, pair)| {
                let kind = deferred
                    .iter()
                    .find(|(upstream, _)| *upstream == index)
                    .map(|(_, expects)| EdgeKind::Deferred { expects: *expects })
                    .unwrap_or(EdgeKind::Static);
                Edge::new(&pair[0], &pair[1], index, kind)
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roles(&self) -> Vec<NodeRole> {
        self.nodes.iter().map(NodeSpec::role).collect()
    }

    pub fn kinds(&self) -> Vec<&str> {
        self.nodes.iter().map(NodeSpec::kind).collect()
    }

    pub fn node(&self, role: NodeRole) -> Option<&NodeSpec> {
        self.nodes.iter().find(|n| n.role() == role)
    }

    pub fn static_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| !e.is_deferred())
    }

    pub fn deferred_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.is_deferred())
    }

    pub fn is_fully_linked(&self) -> bool {
        self.edges.iter().all(Edge::is_linked)
    }

    /// Flag every edge as released so late negotiation callbacks back off
    pub fn release_all(&self) {
        for edge in &self.edges {
            edge.release();
        }
    }

    pub fn summary(&self) -> TopologySummary {
        TopologySummary {
            nodes: self.nodes.clone(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeSummary {
                    label: e.label.clone(),
                    kind: e.kind,
                    state: e.state(),
                })
                .collect(),
        }
    }
}
