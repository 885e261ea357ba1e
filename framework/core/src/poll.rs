use std::time::{Duration, Instant};

use crate::overshoot::OvershootError;
use crate::timeout::PollTimeoutError;

/// How long to keep polling and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10 * 60),
            interval: Duration::from_secs(1),
        }
    }
}

/// What happened during a successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    /// Number of times the probe was called, including the successful call.
    pub attempts: usize,
    pub elapsed: Duration,
}

/// Call `probe` until it returns `Ok(true)` or the timeout expires.
///
/// Probe errors are treated as "condition not yet met" and retried, with the exception of
/// [OvershootError] which is returned straight away. The timeout is checked after every attempt,
/// and the wait before the next attempt is cut short so that it never sleeps past the deadline.
pub fn poll_until<F>(what: &str, options: PollOptions, mut probe: F) -> anyhow::Result<PollReport>
where
    F: FnMut() -> anyhow::Result<bool>,
{
    let started = Instant::now();
    let mut attempts = 0;

    loop {
        attempts += 1;

        match probe() {
            Ok(true) => {
                let elapsed = started.elapsed();
                log::debug!("Condition '{what}' met after {attempts} attempts in {elapsed:?}");
                return Ok(PollReport { attempts, elapsed });
            }
            Ok(false) => {
                log::debug!("Condition '{what}' not met yet (attempt {attempts})");
            }
            Err(e) if e.is::<OvershootError>() => {
                log::error!("Aborting wait for '{what}': {e}");
                return Err(e);
            }
            Err(e) => {
                log::warn!("Failed to check '{what}', will retry: {e:?}");
            }
        }

        let elapsed = started.elapsed();
        if elapsed >= options.timeout {
            return Err(PollTimeoutError::new(what, options.timeout, attempts).into());
        }

        std::thread::sleep(options.interval.min(options.timeout - elapsed));
    }
}
