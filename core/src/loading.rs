//! Shared busy indicator toggled around every outbound call.
//!
//! The signal is reference-counted: each `start` hands back a
//! `LoadingGuard`, and the signal stays active until every outstanding guard
//! has been dropped. Overlapping requests therefore never clear each other's
//! indicator.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const DEFAULT_LOADING_MESSAGE: &str = "loading…";

#[derive(Debug, Default)]
struct LoadingState {
    depth: usize,
    message: Option<String>,
}

/// Point-in-time view of the signal for a UI to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingSnapshot {
    pub active: bool,
    pub message: Option<String>,
    pub depth: usize,
}

/// Cloning shares the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct LoadingSignal {
    inner: Arc<Mutex<LoadingState>>,
}

impl LoadingSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one request as in flight. The most recent message wins while
    /// several requests overlap.
    #[must_use = "the request is finished as soon as the guard is dropped"]
    pub fn start(&self, message: Option<&str>) -> LoadingGuard {
        let mut state = self.lock();
        state.depth += 1;
        state.message = Some(message.unwrap_or(DEFAULT_LOADING_MESSAGE).to_string());
        LoadingGuard {
            signal: self.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.lock().depth > 0
    }

    pub fn message(&self) -> Option<String> {
        self.lock().message.clone()
    }

    pub fn snapshot(&self) -> LoadingSnapshot {
        let state = self.lock();
        LoadingSnapshot {
            active: state.depth > 0,
            message: state.message.clone(),
            depth: state.depth,
        }
    }

    fn finish(&self) {
        let mut state = self.lock();
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            state.message = None;
        }
    }

    fn lock(&self) -> MutexGuard<'_, LoadingState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps its request counted as in flight until dropped.
#[derive(Debug)]
pub struct LoadingGuard {
    signal: LoadingSignal,
}

impl LoadingGuard {
    /// Finish the request now instead of at end of scope.
    pub fn finish(self) {}
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.signal.finish();
    }
}
