use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Monotonic generation clock shared by clones.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	next: Arc<AtomicU64>,
}

impl GenerationClock {
	/// Creates a new generation clock starting at generation 1.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the next generation ID.
	pub fn next(&self) -> u64 {
		self.next.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
	}

	/// Returns the most recently issued generation, or 0 if none was issued.
	pub fn current(&self) -> u64 {
		self.next.load(Ordering::Acquire)
	}
}

/// Sleeps for `delay` unless `cancel` fires first.
///
/// Returns `false` when cancelled, so callers can `break` out of their loop.
pub async fn sleep_unless_cancelled(cancel: &CancellationToken, delay: Duration) -> bool {
	if delay.is_zero() {
		return !cancel.is_cancelled();
	}
	tokio::select! {
		_ = cancel.cancelled() => false,
		_ = tokio::time::sleep(delay) => true,
	}
}
