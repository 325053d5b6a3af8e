//! Scripted collaborators for testing sessions without a host
//!
//! Each double records how the session used it, so tests can check that a
//! denied permission never reached the position source, or that every fix
//! request was released.
//!
//! # Example
//!
//! ```rust,ignore
//! let source = Arc::new(ScriptedPositionSource::held());
//! let session = DistanceSession::new(
//!     SessionConfig::default(),
//!     Arc::new(ScriptedPermissionGate::granting()),
//!     source.clone(),
//!     Arc::new(RecordingPresenter::new()),
//! );
//!
//! let run = tokio::spawn(async move { session.run_once().await });
//! source.wait_for_request().await;
//! source.deliver(FixOutcome::Fix(GeoPoint::new(13.405, 52.52)?));
//! ```

use async_trait::async_trait;
use fixdist_core::GeoPoint;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

use crate::collaborator::{FixOutcome, PermissionGate, PositionSource, Presenter};
use crate::permission::{PermissionRequest, PermissionResponse};
use crate::state::SessionState;

#[derive(Debug, Clone)]
enum GateScript {
    Grant,
    Deny,
    Respond(PermissionResponse),
    Never,
}

/// Permission gate with a fixed answer
#[derive(Debug)]
pub struct ScriptedPermissionGate {
    preauthorized: bool,
    stalled: bool,
    script: GateScript,
    checks: AtomicUsize,
    requests: AtomicUsize,
}

impl ScriptedPermissionGate {
    fn with_script(script: GateScript) -> Self {
        Self {
            preauthorized: false,
            stalled: false,
            script,
            checks: AtomicUsize::new(0),
            requests: AtomicUsize::new(0),
        }
    }

    /// Grants every request
    pub fn granting() -> Self {
        Self::with_script(GateScript::Grant)
    }

    /// Denies every request
    pub fn denying() -> Self {
        Self::with_script(GateScript::Deny)
    }

    /// Reports the permission as already held; never asked
    pub fn preauthorized() -> Self {
        Self {
            preauthorized: true,
            ..Self::with_script(GateScript::Deny)
        }
    }

    /// Answers every request with `response`, whatever was asked
    pub fn responding(response: PermissionResponse) -> Self {
        Self::with_script(GateScript::Respond(response))
    }

    /// Never answers a request
    pub fn never() -> Self {
        Self::with_script(GateScript::Never)
    }

    /// Never finishes checking whether the permission is held
    pub fn stalled() -> Self {
        Self {
            stalled: true,
            ..Self::with_script(GateScript::Never)
        }
    }

    /// Number of `is_granted` checks made
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    /// Number of permission requests made
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionGate for ScriptedPermissionGate {
    async fn is_granted(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if self.stalled {
            std::future::pending::<()>().await;
        }
        self.preauthorized
    }

    async fn request(&self, request: &PermissionRequest) -> PermissionResponse {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            GateScript::Grant => request.grant(),
            GateScript::Deny => request.deny(),
            GateScript::Respond(response) => response.clone(),
            GateScript::Never => std::future::pending().await,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SourceScript {
    Immediate(FixOutcome),
    Held,
    Never,
}

/// Position source that answers immediately, on demand, or never
#[derive(Debug)]
pub struct ScriptedPositionSource {
    script: SourceScript,
    requests: AtomicUsize,
    released: Mutex<Vec<String>>,
    requested: Notify,
    delivery: Mutex<Option<FixOutcome>>,
    delivered: Notify,
}

impl ScriptedPositionSource {
    fn with_script(script: SourceScript) -> Self {
        Self {
            script,
            requests: AtomicUsize::new(0),
            released: Mutex::new(Vec::new()),
            requested: Notify::new(),
            delivery: Mutex::new(None),
            delivered: Notify::new(),
        }
    }

    /// Answers every request with `outcome`
    pub fn answering(outcome: FixOutcome) -> Self {
        Self::with_script(SourceScript::Immediate(outcome))
    }

    /// Answers every request with a fix at `point`
    pub fn delivering(point: GeoPoint) -> Self {
        Self::answering(FixOutcome::Fix(point))
    }

    /// Holds every request until [`deliver`](Self::deliver) is called
    pub fn held() -> Self {
        Self::with_script(SourceScript::Held)
    }

    /// Never answers
    pub fn never() -> Self {
        Self::with_script(SourceScript::Never)
    }

    /// Complete the held request, or the next one
    pub fn deliver(&self, outcome: FixOutcome) {
        *self.delivery.lock() = Some(outcome);
        self.delivered.notify_one();
    }

    /// Wait until a fix has been requested
    pub async fn wait_for_request(&self) {
        self.requested.notified().await;
    }

    /// Number of fix requests made
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of releases
    pub fn releases(&self) -> usize {
        self.released.lock().len()
    }

    /// Providers released, in order
    pub fn released_providers(&self) -> Vec<String> {
        self.released.lock().clone()
    }
}

#[async_trait]
impl PositionSource for ScriptedPositionSource {
    async fn request_single(&self, _provider: &str) -> FixOutcome {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.requested.notify_one();

        match self.script {
            SourceScript::Immediate(outcome) => outcome,
            SourceScript::Never => std::future::pending().await,
            SourceScript::Held => loop {
                if let Some(outcome) = self.delivery.lock().take() {
                    return outcome;
                }
                self.delivered.notified().await;
            },
        }
    }

    fn release(&self, provider: &str) {
        self.released.lock().push(provider.to_string());
    }

    fn name(&self) -> &str {
        "ScriptedPositionSource"
    }
}

/// One presenter call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shown {
    /// Dialog title
    pub title: String,
    /// Dialog message
    pub message: String,
    /// Error styling
    pub is_error: bool,
}

/// Presenter that records every call
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    shown: Mutex<Vec<Shown>>,
    states: Mutex<Vec<SessionState>>,
}

impl RecordingPresenter {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcomes shown so far
    pub fn shown(&self) -> Vec<Shown> {
        self.shown.lock().clone()
    }

    /// State changes observed so far
    pub fn states(&self) -> Vec<SessionState> {
        self.states.lock().clone()
    }
}

impl Presenter for RecordingPresenter {
    fn show(&self, title: &str, message: &str, is_error: bool) {
        self.shown.lock().push(Shown {
            title: title.to_string(),
            message: message.to_string(),
            is_error,
        });
    }

    fn state_changed(&self, state: &SessionState) {
        self.states.lock().push(*state);
    }
}
