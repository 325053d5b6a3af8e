//! Session state machine
//!
//! All transitions go through [`SessionCell`], which owns the state behind a
//! single lock and rejects anything the state machine does not allow:
//!
//! ```text
//! Idle ──begin──► AwaitingFix ──settle──► Completed
//!  ▲                   │                      │
//!  │                   └──settle/cancel──► Failed(kind)
//!  └──────────────reset───────────────────────┘
//! ```
//!
//! The lock is never held across an `.await`.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::FailureKind;

/// Lifecycle of a distance session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "failure", rename_all = "snake_case")]
pub enum SessionState {
    /// Ready for a gesture
    Idle,
    /// Waiting for permission and a position fix
    AwaitingFix,
    /// A distance was computed
    Completed,
    /// The session ended without a distance
    Failed(FailureKind),
}

impl SessionState {
    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: &SessionState) -> bool {
        matches!(
            (self, next),
            (SessionState::Idle, SessionState::AwaitingFix)
                | (SessionState::AwaitingFix, SessionState::Completed)
                | (SessionState::AwaitingFix, SessionState::Failed(_))
                | (SessionState::Completed, SessionState::Idle)
                | (SessionState::Failed(_), SessionState::Idle)
        )
    }

    /// Completed or Failed
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed(_))
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::AwaitingFix => write!(f, "awaiting fix"),
            SessionState::Completed => write!(f, "completed"),
            SessionState::Failed(kind) => write!(f, "failed ({})", kind),
        }
    }
}

struct Inner {
    state: SessionState,
    /// Bumped on every `begin`, so a stale run cannot settle a newer one
    generation: u64,
    /// Present exactly while AwaitingFix
    cancel_tx: Option<oneshot::Sender<()>>,
}

/// A started run: its generation and the signal that fires on cancellation
pub(crate) struct Ticket {
    pub generation: u64,
    pub cancelled: oneshot::Receiver<()>,
}

/// Owner of a session's state; the only place transitions happen
pub(crate) struct SessionCell {
    inner: Mutex<Inner>,
}

impl SessionCell {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                generation: 0,
                cancel_tx: None,
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Idle → AwaitingFix. Returns the current state on refusal.
    pub fn begin(&self) -> Result<Ticket, SessionState> {
        let mut inner = self.inner.lock();
        Self::start(&mut inner)
    }

    /// Completed/Failed → Idle → AwaitingFix, or Idle → AwaitingFix, in one step
    ///
    /// The flag tells whether a finished state was cleared. Returns the
    /// current state on refusal.
    pub fn restart(&self) -> Result<(Ticket, bool), SessionState> {
        let mut inner = self.inner.lock();
        let was_reset = inner.state.is_terminal();
        if was_reset {
            Self::apply(&mut inner, SessionState::Idle)?;
        }
        Ok((Self::start(&mut inner)?, was_reset))
    }

    /// AwaitingFix → Completed or Failed for the run holding `generation`
    ///
    /// Returns false if that run was already cancelled or superseded.
    pub fn settle(&self, generation: u64, next: SessionState) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation || !next.is_terminal() {
            return false;
        }
        if Self::apply(&mut inner, next).is_err() {
            return false;
        }
        inner.cancel_tx = None;
        true
    }

    /// AwaitingFix → Failed(Cancelled), waking the running session
    pub fn cancel(&self) -> bool {
        let mut inner = self.inner.lock();
        if Self::apply(&mut inner, SessionState::Failed(FailureKind::Cancelled)).is_err() {
            return false;
        }
        if let Some(tx) = inner.cancel_tx.take() {
            // The run may already be past its last await; nothing to wake then
            let _ = tx.send(());
        }
        true
    }

    /// Completed/Failed → Idle. Returns the current state on refusal.
    pub fn reset(&self) -> Result<(), SessionState> {
        let mut inner = self.inner.lock();
        Self::apply(&mut inner, SessionState::Idle)
    }

    fn start(inner: &mut Inner) -> Result<Ticket, SessionState> {
        Self::apply(inner, SessionState::AwaitingFix)?;

        let (tx, rx) = oneshot::channel();
        inner.generation += 1;
        inner.cancel_tx = Some(tx);
        Ok(Ticket {
            generation: inner.generation,
            cancelled: rx,
        })
    }

    fn apply(inner: &mut Inner, next: SessionState) -> Result<(), SessionState> {
        if !inner.state.can_transition_to(&next) {
            return Err(inner.state);
        }
        debug!("Session state {} -> {}", inner.state, next);
        inner.state = next;
        Ok(())
    }
}
