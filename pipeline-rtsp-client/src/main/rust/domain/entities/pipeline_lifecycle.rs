use std::time::Instant;

use crate::domain::value_objects::PipelineState;

/// State transition record
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: PipelineState,
    pub to: PipelineState,
    pub timestamp: Instant,
    pub reason: Option<String>,
}

/// Tracks the state the engine has confirmed for the pipeline
#[derive(Debug)]
pub struct PipelineLifecycle {
    current_state: PipelineState,
    state_history: Vec<StateTransition>,
    playing_since: Option<Instant>,
}

impl PipelineLifecycle {
    pub fn new() -> Self {
        Self {
            current_state: PipelineState::Null,
            state_history: Vec::new(),
            playing_since: None,
        }
    }

    pub fn current_state(&self) -> &PipelineState {
        &self.current_state
    }

    /// Time spent in `Playing`, `None` if the pipeline never got there
    pub fn uptime(&self) -> Option<std::time::Duration> {
        self.playing_since.map(|start| start.elapsed())
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.state_history
    }

    pub fn record(&mut self, new_state: PipelineState, reason: Option<String>) {
        let transition = StateTransition {
            from: self.current_state,
            to: new_state,
            timestamp: Instant::now(),
            reason,
        };

        self.state_history.push(transition);
        self.current_state = new_state;

        if new_state.is_playing() && self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
    }
}

impl Default for PipelineLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
