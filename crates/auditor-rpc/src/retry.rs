//! Bounded fixed-delay retry policy for transport failures.

use backoff::backoff::Constant;
use std::time::Duration;

/// Explicit retry policy: a total attempt bound and a fixed inter-attempt
/// delay. Only transport failures are retried; a received response, however
/// malformed, is final.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
	/// Total attempts per call, including the first.
	pub max_attempts: u32,
	/// Delay between consecutive attempts.
	pub delay: Duration,
}

impl RetryPolicy {
	pub fn new(max_attempts: u32, delay: Duration) -> Self {
		Self {
			max_attempts: max_attempts.max(1),
			delay,
		}
	}

	pub(crate) fn backoff(&self) -> Constant {
		Constant::new(self.delay)
	}
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			delay: Duration::from_secs(2),
		}
	}
}
