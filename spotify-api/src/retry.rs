use std::thread;
use std::time::Duration;

use ow_integrations::Log;

use crate::ApiError;

/// Blocks the calling thread between attempts. Swapped out in tests so that
/// nothing actually waits.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// The real thing: `std::thread::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// What a single attempt decided.
#[derive(Debug)]
pub enum Attempt<T> {
    /// Finished, successfully or not; hand this back to the caller.
    Done(T),

    /// The remote side is busy; try again after the delay.
    Retry,
}

/// A bounded retry loop with a fixed delay between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,

    /// How long to sleep between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    /// Five attempts, five seconds apart.
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Runs `attempt` until it reports `Attempt::Done`, an error, or the attempt budget
    /// runs out, in which case this fails with `ApiError::Timeout`.
    ///
    /// `attempt` receives the zero-based attempt index.
    pub fn run<T, F>(&self, sleeper: &dyn Sleeper, mut attempt: F) -> Result<T, ApiError>
    where
        F: FnMut(u32) -> Result<Attempt<T>, ApiError>,
    {
        for index in 0..self.attempts {
            if index > 0 {
                sleeper.sleep(self.delay);
            }

            match attempt(index)? {
                Attempt::Done(value) => return Ok(value),

                Attempt::Retry => {
                    if index + 1 < self.attempts {
                        tracing::warn!(
                            target: Log::Spotify,
                            "Device temporarily unavailable. Trying again in {} seconds",
                            self.delay.as_secs()
                        );
                    }
                },
            }
        }

        Err(ApiError::Timeout)
    }
}
