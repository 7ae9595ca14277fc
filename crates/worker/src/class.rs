/// Execution classes used for task scheduling and observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Long-lived consumption of a change-notification stream.
	Watch,
	/// Timer-driven work that runs regardless of notification activity.
	Periodic,
}

impl TaskClass {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Watch => "watch",
			Self::Periodic => "periodic",
		}
	}
}
