use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::domain::entities::{
    DeferredLink, NodeGraph, PipelineLifecycle, ShutdownGuard, StateTransition,
};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{MediaEngine, MetricsReporter, RunOutcome};
use crate::domain::services::TopologyBuilder;
use crate::domain::value_objects::{PipelineConfig, PipelineState};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Application service owning one client pipeline from build to teardown.
///
/// Lifecycle: [`build`](Self::build) → [`start`](Self::start) →
/// [`run`](Self::run) → [`shutdown`](Self::shutdown). Shutdown runs at most
/// once, and always runs on drop.
pub struct StreamPipeline<E: MediaEngine> {
    config: PipelineConfig,
    graph: NodeGraph,
    engine: Mutex<E>,
    lifecycle: Mutex<PipelineLifecycle>,
    teardown: ShutdownGuard,
    running: Arc<AtomicBool>,
    metrics: Arc<dyn MetricsReporter>,
}

impl<E: MediaEngine> StreamPipeline<E> {
    /// Plan the topology for `config` and instantiate it on `engine`.
    ///
    /// Any failure releases every node created so far before returning.
    pub fn build(
        config: PipelineConfig,
        mut engine: E,
        metrics: Arc<dyn MetricsReporter>,
    ) -> Result<Self> {
        let graph = TopologyBuilder::plan(&config)?;
        tracing::info!(
            platform = %config.platform(),
            nodes = graph.len(),
            deferred_edges = graph.deferred_edges().count(),
            "Building pipeline"
        );

        if let Err(e) = Self::instantiate(&graph, &mut engine, &metrics) {
            tracing::error!("Pipeline build failed: {}", e);
            graph.release_all();
            engine.release();
            return Err(e);
        }

        Ok(Self {
            config,
            graph,
            engine: Mutex::new(engine),
            lifecycle: Mutex::new(PipelineLifecycle::new()),
            teardown: ShutdownGuard::new(),
            running: Arc::new(AtomicBool::new(true)),
            metrics,
        })
    }

    fn instantiate(
        graph: &NodeGraph,
        engine: &mut E,
        metrics: &Arc<dyn MetricsReporter>,
    ) -> Result<()> {
        let mut elements = Vec::with_capacity(graph.len());
        for spec in graph.nodes() {
            tracing::debug!("Creating element {} ({})", spec.name(), spec.kind());
            let element = engine
                .create_element(spec)
                .ok_or_else(|| DomainError::NodeCreation {
                    role: spec.role(),
                    kind: spec.kind().to_string(),
                })?;
            elements.push(element);
        }

        for edge in graph.static_edges() {
            if !engine.link(&elements[edge.upstream()], &elements[edge.downstream()]) {
                return Err(DomainError::Link {
                    edge: edge.label().to_string(),
                });
            }
            edge.mark_linked();
            tracing::debug!("Linked {}", edge.label());
        }

        for edge in graph.deferred_edges() {
            if let Some(link) = DeferredLink::for_edge(edge, Arc::clone(metrics)) {
                tracing::debug!("Deferring {} until {} is offered", edge.label(), link.expects());
                engine.link_deferred(&elements[edge.upstream()], &elements[edge.downstream()], link)?;
            }
        }

        Ok(())
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    /// True once [`request_stop`](Self::request_stop) or a shutdown cleared the running flag
    pub fn stop_requested(&self) -> bool {
        !self.running.load(Ordering::SeqCst)
    }

    pub fn current_state(&self) -> PipelineState {
        *lock(&self.lifecycle).current_state()
    }

    pub fn uptime(&self) -> Option<Duration> {
        lock(&self.lifecycle).uptime()
    }

    pub fn history(&self) -> Vec<StateTransition> {
        lock(&self.lifecycle).history().to_vec()
    }

    pub fn is_released(&self) -> bool {
        self.teardown.is_triggered()
    }

    /// Walk the engine through `Ready`, `Paused` and `Playing`.
    ///
    /// A refused transition tears the pipeline down and is returned as-is.
    pub fn start(&self) -> Result<()> {
        if self.is_released() {
            return Err(DomainError::PipelineReleased);
        }

        for target in PipelineState::STARTUP_SEQUENCE {
            if self.is_released() {
                return Err(DomainError::PipelineReleased);
            }
            let result = lock(&self.engine).set_state(target);
            if let Err(e) = result {
                tracing::error!("Unable to set the pipeline to the {} state: {}", target, e);
                self.shutdown();
                return Err(e);
            }
            self.record_state(target, None);
        }

        tracing::info!("Running RTSP stream: {}", self.config.source_address());
        Ok(())
    }

    /// Block until end of stream, an engine error, or [`request_stop`](Self::request_stop)
    pub fn run(&self) -> Result<RunOutcome> {
        if self.is_released() {
            return Err(DomainError::PipelineReleased);
        }
        if !self.current_state().is_playing() {
            return Err(DomainError::StateTransition {
                target: PipelineState::Playing,
                reason: "pipeline was not started".to_string(),
            });
        }

        let outcome = lock(&self.engine).run(self.running.clone());

        if let Some(uptime) = self.uptime() {
            self.metrics.report_uptime(uptime.as_secs_f64());
        }
        outcome
    }

    /// Start, run and shut down in one go.
    ///
    /// A stop request that lands while the pipeline is still starting releases
    /// it under `start`/`run`; that ends as [`RunOutcome::Stopped`], not an error.
    pub fn run_to_completion(&self) -> Result<RunOutcome> {
        let result = match self.start().and_then(|_| self.run()) {
            Err(DomainError::PipelineReleased) if self.stop_requested() => {
                tracing::info!("Pipeline released by a stop request before it was running");
                Ok(RunOutcome::Stopped)
            }
            other => other,
        };
        self.shutdown();
        result
    }

    /// Ask a blocked [`run`](Self::run) to return; safe from any thread
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Bring the engine back to `Null` and release everything it holds.
    ///
    /// Only the first call does any work; returns whether this call did.
    pub fn shutdown(&self) -> bool {
        self.teardown.run_once(|| {
            tracing::info!("Stopping pipeline");
            self.request_stop();
            self.graph.release_all();

            let mut engine = lock(&self.engine);
            if let Err(e) = engine.set_state(PipelineState::Null) {
                tracing::error!("Failed to stop pipeline cleanly, releasing anyway: {}", e);
            }
            engine.release();
            drop(engine);

            self.record_state(PipelineState::Null, Some("shutdown".to_string()));
        })
    }

    fn record_state(&self, state: PipelineState, reason: Option<String>) {
        lock(&self.lifecycle).record(state, reason);
        self.metrics.report_state_change(&state);
    }
}

impl<E: MediaEngine> Drop for StreamPipeline<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
