//! Error types used by the container runtime and pipeline stages.
//!
//! This module defines two main error enums:
//!
//! - [`ContainerError`]: errors raised by the container itself (submission after
//!   teardown, shutdown exceeding its grace period).
//! - [`StageError`]: errors raised by an individual pipeline stage.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::fmt::Display;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the container runtime.
///
/// These represent failures of the container as a whole, never of a single intent.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContainerError {
    /// The container was torn down; no new intents are accepted.
    #[error("container closed")]
    Closed,

    /// Teardown grace period was exceeded; some intents were still running and had to be aborted.
    #[error("teardown timeout {grace:?} exceeded; stuck: {stuck:?}; aborting")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the intents that did not stop in time.
        stuck: Vec<String>,
    },
}

impl ContainerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use statevisor::ContainerError;
    /// use std::time::Duration;
    ///
    /// let err = ContainerError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "container_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ContainerError::Closed => "container_closed",
            ContainerError::GraceExceeded { .. } => "container_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ContainerError::Closed => "container closed".to_string(),
            ContainerError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck intents={stuck:?}")
            }
        }
    }
}

/// # Errors produced by pipeline stages.
///
/// A stage error ends the owning intent only. It never touches the committed
/// state or the state/side-effect streams, and it is never retried.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageError {
    /// Stage returned an error.
    #[error("stage failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Stage panicked; the panic was caught at the stage boundary.
    #[error("stage panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text (when it was a string).
        info: String,
    },

    /// Stage observed cancellation of its intent.
    #[error("intent cancelled")]
    Canceled,
}

impl StageError {
    /// Shorthand for [`StageError::Fail`].
    ///
    /// # Example
    /// ```
    /// use statevisor::StageError;
    ///
    /// let err = StageError::fail("backend unavailable");
    /// assert_eq!(err.to_string(), "stage failed: backend unavailable");
    /// ```
    pub fn fail(error: impl Display) -> Self {
        StageError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            StageError::Fail { .. } => "stage_failed",
            StageError::Panicked { .. } => "stage_panicked",
            StageError::Canceled => "stage_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StageError::Fail { error } => format!("error: {error}"),
            StageError::Panicked { info } => format!("panic: {info}"),
            StageError::Canceled => "intent cancelled".to_string(),
        }
    }

    /// True for [`StageError::Canceled`]; cancellation is a normal terminal outcome.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, StageError::Canceled)
    }

    /// Builds a [`StageError::Panicked`] from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        StageError::Panicked {
            info: panic_info(payload.as_ref()),
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_info(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
