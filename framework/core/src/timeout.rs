use std::time::Duration;

/// Returned by [crate::prelude::poll_until] when the condition was not met before the timeout.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
#[display("Timed out after {timeout:?} waiting for {what} ({attempts} attempts)")]
pub struct PollTimeoutError {
    what: String,
    timeout: Duration,
    attempts: usize,
}

impl PollTimeoutError {
    pub fn new(what: impl Into<String>, timeout: Duration, attempts: usize) -> Self {
        Self {
            what: what.into(),
            timeout,
            attempts,
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }
}
