use std::sync::atomic::{AtomicBool, Ordering};

/// Lets exactly one caller run teardown, however many stop requests race
#[derive(Debug, Default)]
pub struct ShutdownGuard {
    triggered: AtomicBool,
}

impl ShutdownGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `teardown` if nobody has done so yet. Returns whether it ran.
    pub fn run_once<F: FnOnce()>(&self, teardown: F) -> bool {
        if self
            .triggered
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        teardown();
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }
}
