//! DistanceSession - the one-shot permission, fix and distance flow
//!
//! A session runs at most one request at a time:
//!
//! ```text
//!  run_once
//!     │
//!     ▼
//!  Idle ─► AwaitingFix ─► PermissionGate ─denied──────────────► Failed
//!                              │
//!                           granted
//!                              ▼
//!                        PositionSource ─unavailable/timeout──► Failed
//!                              │
//!                             fix
//!                              ▼
//!                     vincenty::distance ─────────────────────► Completed
//! ```
//!
//! Every finished run makes exactly one presenter call, from a single exit
//! point. A second `run_once` while a run is waiting fails with
//! [`SessionError::AlreadyRunning`] and changes nothing. A
//! [`SessionHandle`] can cancel the waiting run from anywhere; the pending
//! fix request is dropped, so a fix arriving afterwards is never reported.
//!
//! # Example
//!
//! ```rust,ignore
//! let session = DistanceSession::new(config, gate, source, presenter);
//! let handle = session.handle();
//!
//! match session.gesture().await {
//!     Ok(report) => println!("{} km", report.displayed_km),
//!     Err(e) => println!("failed: {}", e),
//! }
//! ```

use fixdist_core::{vincenty, DistanceResult, GeoPoint};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::collaborator::{FixOutcome, PermissionGate, PositionSource, Presenter, ProviderEvent};
use crate::config::SessionConfig;
use crate::error::{FailureKind, Result, SessionError};
use crate::permission::{PermissionGrant, PermissionRequest};
use crate::state::{SessionCell, SessionState, Ticket};

/// Successful session outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceReport {
    /// Position delivered by the host
    pub fix: GeoPoint,
    /// Configured reference point
    pub reference: GeoPoint,
    /// Kernel output, unrounded
    pub distance: DistanceResult,
    /// Distance in whole kilometres, truncated
    pub displayed_km: u64,
}

impl DistanceReport {
    fn new(fix: GeoPoint, reference: GeoPoint) -> Self {
        let distance = vincenty::distance(&fix, &reference);
        Self {
            fix,
            reference,
            displayed_km: distance.whole_kilometres(),
            distance,
        }
    }

    /// Unrounded distance in metres
    pub fn metres(&self) -> f64 {
        self.distance.metres
    }
}

/// State shared between a session and its handles
struct Shared {
    cell: SessionCell,
    presenter: Arc<dyn Presenter>,
}

impl Shared {
    fn notify(&self, state: SessionState) {
        self.presenter.state_changed(&state);
    }
}

/// Cloneable handle for observing and cancelling a session
#[derive(Clone)]
pub struct SessionHandle {
    shared: Arc<Shared>,
}

impl SessionHandle {
    /// Current state
    pub fn state(&self) -> SessionState {
        self.shared.cell.state()
    }

    /// Cancel a waiting run
    ///
    /// Returns false if no run was waiting.
    pub fn cancel(&self) -> bool {
        if !self.shared.cell.cancel() {
            debug!("Cancel ignored in state {}", self.state());
            return false;
        }
        info!("Distance session cancelled");
        self.shared
            .notify(SessionState::Failed(FailureKind::Cancelled));
        true
    }
}

/// Releases the position source subscription when dropped
struct FixSubscription<'a> {
    source: &'a dyn PositionSource,
    provider: &'a str,
}

impl<'a> FixSubscription<'a> {
    fn acquire(source: &'a dyn PositionSource, provider: &'a str) -> Self {
        debug!("Subscribing to provider {} on {}", provider, source.name());
        Self { source, provider }
    }
}

impl Drop for FixSubscription<'_> {
    fn drop(&mut self) {
        debug!("Releasing provider {} on {}", self.provider, self.source.name());
        self.source.release(self.provider);
    }
}

/// One-shot distance session over host collaborators
pub struct DistanceSession {
    config: SessionConfig,
    gate: Arc<dyn PermissionGate>,
    source: Arc<dyn PositionSource>,
    shared: Arc<Shared>,
}

impl DistanceSession {
    /// Create a session in the Idle state
    pub fn new(
        config: SessionConfig,
        gate: Arc<dyn PermissionGate>,
        source: Arc<dyn PositionSource>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        info!("Distance session created, reference {}", config.reference);
        Self {
            config,
            gate,
            source,
            shared: Arc::new(Shared {
                cell: SessionCell::new(),
                presenter,
            }),
        }
    }

    /// Session configuration
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.shared.cell.state()
    }

    /// Handle for cancelling from another task
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            shared: self.shared.clone(),
        }
    }

    /// Run one permission, fix and distance cycle
    ///
    /// Fails immediately with [`SessionError::AlreadyRunning`] unless the
    /// session is Idle; that refusal is not presented.
    pub async fn run_once(&self) -> Result<DistanceReport> {
        let ticket = self.shared.cell.begin().map_err(refused)?;
        self.run(ticket).await
    }

    /// Reset a finished session and run again
    ///
    /// This is what a user tap does: a finished session never blocks a new
    /// one, while a waiting session still refuses. The reset and the start
    /// happen under one lock, so racing gestures see `AlreadyRunning`.
    pub async fn gesture(&self) -> Result<DistanceReport> {
        let (ticket, was_reset) = self.shared.cell.restart().map_err(refused)?;
        if was_reset {
            self.shared.notify(SessionState::Idle);
        }
        self.run(ticket).await
    }

    async fn run(&self, ticket: Ticket) -> Result<DistanceReport> {
        self.shared.notify(SessionState::AwaitingFix);

        let mut cancelled = ticket.cancelled;
        let outcome = self.acquire(&mut cancelled).await;
        let outcome = self.settle(ticket.generation, outcome);

        self.present(&outcome);
        outcome
    }

    /// Completed/Failed → Idle
    pub fn reset(&self) -> Result<()> {
        self.shared
            .cell
            .reset()
            .map_err(|from| SessionError::InvalidTransition {
                from,
                to: SessionState::Idle,
            })?;
        self.shared.notify(SessionState::Idle);
        Ok(())
    }

    /// Record a provider status notification from the host
    ///
    /// Status changes do not affect a running session.
    pub fn on_provider_event(&self, event: &ProviderEvent) {
        info!("Location {}", event);
    }

    async fn acquire(&self, cancelled: &mut oneshot::Receiver<()>) -> Result<DistanceReport> {
        self.check_permission(cancelled).await?;
        let fix = self.await_fix(cancelled).await?;
        info!("New fix: {}", fix);
        Ok(DistanceReport::new(fix, self.config.reference))
    }

    async fn check_permission(&self, cancelled: &mut oneshot::Receiver<()>) -> Result<()> {
        if until_cancelled(cancelled, self.gate.is_granted()).await? {
            debug!("Location permission already held");
            return Ok(());
        }

        let request = PermissionRequest::fine_location();
        let response = until_cancelled(cancelled, self.gate.request(&request)).await?;

        match response.verdict(&request)? {
            PermissionGrant::Granted => Ok(()),
            PermissionGrant::Denied => Err(SessionError::PermissionDenied),
        }
    }

    async fn await_fix(&self, cancelled: &mut oneshot::Receiver<()>) -> Result<GeoPoint> {
        let provider = self.config.provider.as_str();
        let _subscription = FixSubscription::acquire(self.source.as_ref(), provider);

        let request = self.source.request_single(provider);
        let bounded = async {
            match self.config.fix_timeout {
                Some(limit) => tokio::time::timeout(limit, request)
                    .await
                    .unwrap_or_else(|_| {
                        warn!("No fix from {} within {:?}", provider, limit);
                        FixOutcome::Timeout
                    }),
                None => request.await,
            }
        };

        match until_cancelled(cancelled, bounded).await? {
            FixOutcome::Fix(point) => Ok(point),
            FixOutcome::ProviderUnavailable => Err(SessionError::ProviderUnavailable {
                provider: provider.to_string(),
            }),
            FixOutcome::Timeout => Err(SessionError::Timeout),
            FixOutcome::Cancelled => Err(SessionError::Cancelled),
        }
    }

    /// Move to the terminal state matching `outcome`
    ///
    /// If the run was cancelled meanwhile, the outcome is dropped and the
    /// run reports [`SessionError::Cancelled`].
    fn settle(&self, generation: u64, outcome: Result<DistanceReport>) -> Result<DistanceReport> {
        let next = match &outcome {
            Ok(_) => SessionState::Completed,
            Err(e) => SessionState::Failed(
                e.failure_kind()
                    .unwrap_or(FailureKind::InternalInconsistency),
            ),
        };

        if self.shared.cell.settle(generation, next) {
            self.shared.notify(next);
            return outcome;
        }

        if let Ok(report) = &outcome {
            debug!("Dropping fix {} that arrived after cancellation", report.fix);
        }
        Err(SessionError::Cancelled)
    }

    fn present(&self, outcome: &Result<DistanceReport>) {
        let messages = &self.config.messages;
        match outcome {
            Ok(report) => {
                info!(
                    "Distance {:.1} m ({} km) via {}",
                    report.metres(),
                    report.displayed_km,
                    report.distance.method
                );
                self.shared.presenter.show(
                    &messages.result_title,
                    &messages.result(report.displayed_km),
                    false,
                );
            }
            Err(e) => {
                let kind = e
                    .failure_kind()
                    .unwrap_or(FailureKind::InternalInconsistency);
                info!("Distance session failed: {} ({})", e, e.error_code());
                self.shared
                    .presenter
                    .show(&messages.error_title, messages.failure(kind), true);
            }
        }
    }
}

fn refused(state: SessionState) -> SessionError {
    warn!("Distance request refused in state {}", state);
    SessionError::AlreadyRunning
}

/// Race `work` against the cancellation signal
async fn until_cancelled<T>(
    cancelled: &mut oneshot::Receiver<()>,
    work: impl Future<Output = T>,
) -> Result<T> {
    tokio::select! {
        value = work => Ok(value),
        _ = cancelled => Err(SessionError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingPresenter, ScriptedPermissionGate, ScriptedPositionSource};

    fn point(lon: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lon, lat).unwrap()
    }

    fn session_with(
        gate: ScriptedPermissionGate,
        source: Arc<ScriptedPositionSource>,
        presenter: Arc<RecordingPresenter>,
    ) -> DistanceSession {
        DistanceSession::new(SessionConfig::default(), Arc::new(gate), source, presenter)
    }

    #[tokio::test]
    async fn test_fix_at_reference() {
        let source = Arc::new(ScriptedPositionSource::delivering(point(8.4043, 49.0140)));
        let presenter = Arc::new(RecordingPresenter::new());
        let session = session_with(ScriptedPermissionGate::granting(), source.clone(), presenter.clone());

        let report = session.run_once().await.unwrap();
        assert_eq!(report.metres(), 0.0);
        assert_eq!(report.displayed_km, 0);
        assert_eq!(session.state(), SessionState::Completed);

        let shown = presenter.shown();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].title, "Result");
        assert_eq!(shown[0].message, "Distance to home: 0 km");
        assert!(!shown[0].is_error);
    }

    #[tokio::test]
    async fn test_terminal_state_absorbs_until_reset() {
        let source = Arc::new(ScriptedPositionSource::delivering(point(8.42, 49.014)));
        let presenter = Arc::new(RecordingPresenter::new());
        let session = session_with(ScriptedPermissionGate::granting(), source.clone(), presenter.clone());

        session.run_once().await.unwrap();
        assert!(matches!(session.run_once().await, Err(SessionError::AlreadyRunning)));
        assert_eq!(presenter.shown().len(), 1);

        session.reset().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.run_once().await.unwrap().displayed_km, 1);
    }

    #[tokio::test]
    async fn test_reset_from_idle_is_rejected() {
        let source = Arc::new(ScriptedPositionSource::delivering(point(0.0, 0.0)));
        let presenter = Arc::new(RecordingPresenter::new());
        let session = session_with(ScriptedPermissionGate::granting(), source, presenter);

        assert!(matches!(
            session.reset(),
            Err(SessionError::InvalidTransition {
                from: SessionState::Idle,
                to: SessionState::Idle
            })
        ));
    }

    #[tokio::test]
    async fn test_gesture_resets_finished_session() {
        let source = Arc::new(ScriptedPositionSource::delivering(point(13.405, 52.52)));
        let presenter = Arc::new(RecordingPresenter::new());
        let session = session_with(ScriptedPermissionGate::granting(), source.clone(), presenter.clone());

        assert_eq!(session.gesture().await.unwrap().displayed_km, 525);
        assert_eq!(session.gesture().await.unwrap().displayed_km, 525);
        assert_eq!(presenter.shown().len(), 2);
        assert_eq!(source.requests(), 2);
    }

    #[tokio::test]
    async fn test_state_changes_reach_presenter() {
        let source = Arc::new(ScriptedPositionSource::delivering(point(8.42, 49.014)));
        let presenter = Arc::new(RecordingPresenter::new());
        let session = session_with(ScriptedPermissionGate::granting(), source, presenter.clone());

        session.run_once().await.unwrap();
        session.reset().unwrap();

        assert_eq!(
            presenter.states(),
            vec![
                SessionState::AwaitingFix,
                SessionState::Completed,
                SessionState::Idle
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_when_idle_does_nothing() {
        let source = Arc::new(ScriptedPositionSource::delivering(point(0.0, 0.0)));
        let presenter = Arc::new(RecordingPresenter::new());
        let session = session_with(ScriptedPermissionGate::granting(), source, presenter.clone());

        assert!(!session.handle().cancel());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(presenter.states().is_empty());
    }
}
