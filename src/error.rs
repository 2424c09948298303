//! Error types used by the burstgate scheduler and actions.
//!
//! This module defines two main error enums:
//!
//! - [`SchedulerError`] — errors raised by the scheduling engine itself.
//! - [`ActionError`] — errors raised by individual action executions.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the scheduling engine.
///
/// These represent failures at the call boundary or in the engine
/// lifecycle, such as an invalid timeout or a shutdown that exceeded its
/// grace period. Action failures are *not* reported here — actions are
/// fire-and-forget and surface only as events.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// Timeout rejected at the call boundary (a zero window would make
    /// every gate a no-op). Never admitted into the state table.
    #[error("invalid timeout {timeout:?}: must be greater than zero")]
    InvalidTimeout {
        /// The rejected timeout value.
        timeout: Duration,
    },

    /// `start()` was called on a scheduler that is already running.
    #[error("scheduler already started")]
    AlreadyStarted,

    /// A trigger/cancel call was made before `start()` or after `shutdown()`.
    #[error("scheduler is not running")]
    NotRunning,

    /// Shutdown grace period was exceeded; some actions were still running.
    #[error("shutdown grace {grace:?} exceeded; busy keys: {busy:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Keys whose actions did not finish in time.
        busy: Vec<String>,
    },
}

impl SchedulerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use burstgate::SchedulerError;
    ///
    /// assert_eq!(SchedulerError::AlreadyStarted.as_label(), "scheduler_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SchedulerError::InvalidTimeout { .. } => "scheduler_invalid_timeout",
            SchedulerError::AlreadyStarted => "scheduler_already_started",
            SchedulerError::NotRunning => "scheduler_not_running",
            SchedulerError::GraceExceeded { .. } => "scheduler_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SchedulerError::InvalidTimeout { timeout } => {
                format!("invalid timeout: {timeout:?}")
            }
            SchedulerError::AlreadyStarted => "already started".to_string(),
            SchedulerError::NotRunning => "not running".to_string(),
            SchedulerError::GraceExceeded { grace, busy } => {
                format!("grace exceeded after {grace:?}; busy keys={busy:?}")
            }
        }
    }
}

/// # Errors produced by action execution.
///
/// The engine never propagates these to trigger callers; a failed action
/// is reported on the event bus and the worker table is cleaned up as if
/// the action had completed normally.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ActionError {
    /// Action execution failed with an application error.
    #[error("action failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// Action gave up because its context went away (engine shutdown).
    #[error("action canceled")]
    Canceled,
}

impl ActionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use burstgate::ActionError;
    ///
    /// let err = ActionError::Failed { error: "boom".into() };
    /// assert_eq!(err.as_label(), "action_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Failed { .. } => "action_failed",
            ActionError::Canceled => "action_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ActionError::Failed { error } => format!("error: {error}"),
            ActionError::Canceled => "canceled".to_string(),
        }
    }
}
