//! Scripted transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::http::{HttpRequest, HttpResponse, Transport, TransportError};
use crate::loading::{LoadingSignal, LoadingSnapshot};

/// Replays queued outcomes in order and records every request it sees,
/// along with the loading signal's state at dispatch time.
#[derive(Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    snapshots_at_dispatch: Mutex<Vec<LoadingSnapshot>>,
    watched: Mutex<Option<LoadingSignal>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: &str) -> Self {
        self.outcomes.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(self, err: TransportError) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn watch(&self, signal: &LoadingSignal) {
        *self.watched.lock().unwrap() = Some(signal.clone());
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn active_at_dispatch(&self) -> Vec<bool> {
        self.snapshots_at_dispatch().iter().map(|s| s.active).collect()
    }

    pub fn snapshots_at_dispatch(&self) -> Vec<LoadingSnapshot> {
        self.snapshots_at_dispatch.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(signal) = self.watched.lock().unwrap().as_ref() {
            self.snapshots_at_dispatch.lock().unwrap().push(signal.snapshot());
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::NoResponse("script exhausted".to_string())))
    }
}
