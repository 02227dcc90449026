use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::domain::entities::DeferredLink;
use crate::domain::errors::Result;
use crate::domain::value_objects::{NodeSpec, PipelineState};

/// How a run loop ended without an engine error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    EndOfStream,
    /// The running flag was cleared from outside
    Stopped,
}

/// Port for the media-pipeline engine that owns the actual processing nodes
pub trait MediaEngine: Send {
    /// Engine-side handle to an instantiated node
    type Element: Clone + Send + 'static;

    /// Instantiate the node described by `spec`, apply its properties and add
    /// it to the pipeline. `None` when the factory cannot produce it.
    fn create_element(&mut self, spec: &NodeSpec) -> Option<Self::Element>;

    /// Link two nodes whose formats are fixed at build time
    fn link(&mut self, upstream: &Self::Element, downstream: &Self::Element) -> bool;

    /// Arrange for `link` to be consulted every time `upstream` exposes or
    /// removes an output that could feed `downstream`
    fn link_deferred(
        &mut self,
        upstream: &Self::Element,
        downstream: &Self::Element,
        link: DeferredLink,
    ) -> Result<()>;

    fn set_state(&mut self, state: PipelineState) -> Result<()>;

    /// Block on the engine's event loop until end of stream, a fatal engine
    /// error, or `running` being cleared
    fn run(&mut self, running: Arc<AtomicBool>) -> Result<RunOutcome>;

    /// Drop every node and engine resource acquired so far
    fn release(&mut self);
}
