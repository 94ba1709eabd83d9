//! # Backoff policy for worker restarts.
//!
//! [`BackoffPolicy`] controls how the delay between restarts grows after
//! repeated crashes. It is parameterized by:
//! - [`BackoffPolicy::first`] the delay before the first restart;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the cap, also used as the crash-loop cooldown.
//!
//! The sequence is stateful: the supervisor keeps the previous delay and asks
//! for the next one. Jitter is applied to the value that is slept, never to
//! the value that is fed back, so the sequence itself stays monotonic.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use botvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_secs(5),
//!     max: Duration::from_secs(120),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(None), Duration::from_secs(5));
//! assert_eq!(backoff.next(Some(Duration::from_secs(5))), Duration::from_secs(10));
//! assert_eq!(backoff.next(Some(Duration::from_secs(80))), Duration::from_secs(120));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Restart backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay before the first restart.
    pub first: Duration,
    /// Maximum delay between restarts; also the crash-loop cooldown.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied to the slept delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns the launcher defaults:
    /// - `first = 5s`;
    /// - `factor = 2.0` (doubling);
    /// - `max = 120s`;
    /// - no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(5),
            max: Duration::from_secs(120),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the next delay from the previous one.
    ///
    /// - `None` → `first` (clamped to `max`);
    /// - `Some(prev)` → `prev × factor`, clamped to `max`.
    ///
    /// Non-finite or negative products clamp to `max`. Jitter is **not**
    /// applied here; see [`BackoffPolicy::jittered`].
    pub fn next(&self, prev: Option<Duration>) -> Duration {
        let Some(prev) = prev else {
            return self.first.min(self.max);
        };

        let secs = prev.as_secs_f64() * self.factor;
        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }

    /// Applies the configured jitter to a delay that is about to be slept.
    pub fn jittered(&self, delay: Duration) -> Duration {
        self.jitter.apply(delay)
    }
}
