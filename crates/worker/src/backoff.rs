use std::time::Duration;

/// Exponential retry policy for loops that must never give up.
///
/// Delays start at `initial`, grow by `factor` per consecutive failure and
/// saturate at `max`. There is no attempt limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
	pub initial: Duration,
	pub max: Duration,
	pub factor: f64,
}

impl Default for BackoffPolicy {
	fn default() -> Self {
		Self {
			initial: Duration::from_millis(500),
			max: Duration::from_secs(30),
			factor: 2.0,
		}
	}
}

impl BackoffPolicy {
	pub fn new(initial: Duration, max: Duration) -> Self {
		Self {
			initial,
			max: max.max(initial),
			..Self::default()
		}
	}

	/// Returns a fresh retry state for this policy.
	pub fn start(&self) -> Backoff {
		Backoff { policy: *self, attempt: 0 }
	}

	fn delay_for(&self, attempt: u32) -> Duration {
		let factor = if self.factor.is_finite() && self.factor >= 1.0 { self.factor } else { 1.0 };
		let scaled = self.initial.as_secs_f64() * factor.powi(attempt.min(64) as i32);
		if !scaled.is_finite() || scaled >= self.max.as_secs_f64() {
			return self.max;
		}
		Duration::from_secs_f64(scaled)
	}
}

/// Retry state tracking consecutive failures.
#[derive(Debug, Clone)]
pub struct Backoff {
	policy: BackoffPolicy,
	attempt: u32,
}

impl Backoff {
	/// Records one failure and returns the delay to wait before retrying.
	pub fn next_delay(&mut self) -> Duration {
		let delay = self.policy.delay_for(self.attempt);
		self.attempt = self.attempt.saturating_add(1);
		delay
	}

	/// Consecutive failures since the last reset.
	pub fn attempt(&self) -> u32 {
		self.attempt
	}

	/// Clears the failure streak after a successful attempt.
	pub fn reset(&mut self) {
		self.attempt = 0;
	}
}
