//! Delay policies between attempts.

use std::time::Duration;

/// Maps the number of the attempt that just failed to the delay before the
/// next one.
///
/// Attempts are 1-indexed: `delay_for_attempt(1)` is the wait between the
/// first and the second attempt.
///
/// The default is `Linear { step: 10s }`, i.e. `10 × attempt` seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryInterval {
    /// Retry without waiting.
    Immediate,

    /// `step * attempt`.
    Linear {
        /// Delay added per attempt
        step: Duration,
    },

    /// `initial * multiplier^(attempt-1)`, randomized by `jitter` and capped at `max`.
    Exponential {
        /// Delay after the first failed attempt
        initial: Duration,
        /// Upper bound on any single delay
        max: Duration,
        /// Growth factor per attempt
        multiplier: f64,
        /// Randomization factor in `[0.0, 1.0]`; 0.1 means ±10%
        jitter: f64,
    },
}

impl Default for RetryInterval {
    fn default() -> Self {
        Self::Linear {
            step: Duration::from_secs(10),
        }
    }
}

impl RetryInterval {
    /// Exponential interval with the usual network defaults
    /// (100ms initial, 60s cap, doubling, 10% jitter).
    pub fn exponential() -> Self {
        Self::Exponential {
            initial: Duration::from_millis(100),
            max: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }

    /// Delay to wait after `attempt` failed.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::Immediate => Duration::ZERO,
            Self::Linear { step } => step.saturating_mul(attempt),
            Self::Exponential {
                initial,
                max,
                multiplier,
                jitter,
            } => {
                let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
                let base = initial.as_secs_f64() * multiplier.powi(exponent);
                let jitter = jitter.clamp(0.0, 1.0);
                let jittered = if jitter > 0.0 {
                    base + base * jitter * (rand::random::<f64>() - 0.5) * 2.0
                } else {
                    base
                };
                let capped = jittered.min(max.as_secs_f64()).max(0.0);
                Duration::try_from_secs_f64(capped)
                    .map_or(*max, |delay| delay.min(*max))
            }
        }
    }
}
