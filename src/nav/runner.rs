//! Serialized execution of effectful actions.
//!
//! One action may be in flight at a time. The navigator checks
//! [`ActionRunner::is_loading`] before launching anything new, so a slow
//! generation call simply blocks further actions instead of racing them.
//! There is no cancellation and no timeout; external calls are user-visible
//! waits.

use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, warn};

use crate::error::Result;
use crate::forest::NodeId;

use super::effects::{self, EffectContext, EffectOutcome};
use super::Action;

/// Session-wide action status. Exactly one instance per session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// An action is running.
    Loading,
    /// The last action failed; the message stays until the next action.
    Errored(String),
}

/// Runs actions one at a time and folds their outcomes into a status.
#[derive(Debug)]
pub struct ActionRunner {
    status: SessionStatus,
    pending: Option<JoinHandle<Result<EffectOutcome>>>,
    debug: bool,
}

impl ActionRunner {
    /// New idle runner. With `debug` set, failure messages include the full
    /// error chain instead of just the top-level message.
    pub fn new(debug: bool) -> Self {
        Self {
            status: SessionStatus::Idle,
            pending: None,
            debug,
        }
    }

    /// Current status.
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    /// Whether an action is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start an action on a background task.
    ///
    /// Callers must check [`is_loading`](Self::is_loading) first; a launch
    /// while one is pending is dropped.
    pub fn launch(&mut self, ctx: Arc<EffectContext>, current: NodeId, action: Action) {
        if self.pending.is_some() {
            warn!(?action, "action dropped, another is already in flight");
            return;
        }

        debug!(?action, "launching action");
        self.status = SessionStatus::Loading;
        self.pending = Some(tokio::spawn(async move {
            effects::perform(&ctx, &current, action).await
        }));
    }

    /// Surface a synchronous validation failure without running anything.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = SessionStatus::Errored(message.into());
    }

    /// Take the pending handle once its task has finished.
    ///
    /// Returns `None` while idle or still running. The caller awaits the
    /// returned handle (which resolves immediately) and passes the result to
    /// [`finish`](Self::finish).
    pub fn take_finished(&mut self) -> Option<JoinHandle<Result<EffectOutcome>>> {
        if self.pending.as_ref().is_some_and(JoinHandle::is_finished) {
            self.pending.take()
        } else {
            None
        }
    }

    /// Fold a completed action into the status.
    pub fn finish(
        &mut self,
        joined: std::result::Result<Result<EffectOutcome>, JoinError>,
    ) -> Option<EffectOutcome> {
        match joined {
            Ok(Ok(outcome)) => {
                self.status = SessionStatus::Idle;
                Some(outcome)
            }
            Ok(Err(err)) => {
                let message = if self.debug {
                    err.source_chain().unwrap_or_else(|| err.to_string())
                } else {
                    err.to_string()
                };
                debug!(%message, "action failed");
                self.status = SessionStatus::Errored(message);
                None
            }
            Err(join_err) => {
                self.status =
                    SessionStatus::Errored(format!("Internal error: action task failed: {join_err}"));
                None
            }
        }
    }
}
