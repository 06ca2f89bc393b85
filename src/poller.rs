//! Bounded status polling for a publish container.
//!
//! The poller queries immediately, then sleeps a fixed interval between
//! queries. With `max_attempts = N` it issues at most N queries and N-1
//! sleeps. There is no backoff and no cancellation short of killing the
//! process.

use std::time::Duration;

use crate::error::TimeoutError;
use crate::publisher::{ContainerId, PublishingService};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Blocking pause between status queries.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Pending,
    Finished,
    TimedOut,
}

/// Outcome of a successful wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub attempts: u32,
}

pub fn await_ready(
    publisher: &dyn PublishingService,
    sleeper: &dyn Sleeper,
    container_id: &ContainerId,
    policy: PollPolicy,
) -> Result<PollReport, TimeoutError> {
    let mut state = PollState::Pending;
    let mut attempts = 0;
    let mut last_status = None;

    while state == PollState::Pending {
        if attempts >= policy.max_attempts {
            state = PollState::TimedOut;
            continue;
        }
        if attempts > 0 {
            sleeper.sleep(policy.interval);
        }
        attempts += 1;

        match publisher.container_status(container_id) {
            Ok(status) => {
                tracing::info!(
                    container_id = %container_id,
                    attempt = attempts,
                    max_attempts = policy.max_attempts,
                    status = status.as_str(),
                    "container status"
                );
                if status.is_finished() {
                    state = PollState::Finished;
                }
                last_status = Some(status.into_string());
            }
            Err(err) => {
                tracing::warn!(
                    container_id = %container_id,
                    attempt = attempts,
                    error = %err,
                    "status query failed"
                );
            }
        }
    }

    match state {
        PollState::Finished => Ok(PollReport { attempts }),
        _ => Err(TimeoutError {
            container_id: container_id.clone(),
            attempts,
            last_status,
        }),
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
