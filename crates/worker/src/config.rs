use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Lifecycle callback invoked by the scheduler.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Scheduler configuration.
///
/// Every option is optional: the batch size defaults to
/// [`Self::DEFAULT_MAX_DEQUEUE_SIZE`] and both callbacks default to no-ops.
#[derive(Clone)]
pub struct SchedulerConfig {
	pub(crate) max_dequeue_size: NonZeroUsize,
	pub(crate) on_tick: Callback,
	pub(crate) on_done: Callback,
}

impl SchedulerConfig {
	pub const DEFAULT_MAX_DEQUEUE_SIZE: usize = 10;

	/// Creates a configuration with default options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the maximum number of tasks executed per slice.
	#[must_use]
	pub fn max_dequeue_size(mut self, size: NonZeroUsize) -> Self {
		self.max_dequeue_size = size;
		self
	}

	/// Sets the callback fired once at the start of every slice.
	#[must_use]
	pub fn on_tick(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
		self.on_tick = Arc::new(callback);
		self
	}

	/// Sets the callback fired once when a slice leaves the queue empty.
	#[must_use]
	pub fn on_done(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
		self.on_done = Arc::new(callback);
		self
	}

	/// Returns the configured slice cap.
	pub fn batch_size(&self) -> usize {
		self.max_dequeue_size.get()
	}
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self {
			max_dequeue_size: NonZeroUsize::new(Self::DEFAULT_MAX_DEQUEUE_SIZE).unwrap_or(NonZeroUsize::MIN),
			on_tick: Arc::new(|| {}),
			on_done: Arc::new(|| {}),
		}
	}
}

impl fmt::Debug for SchedulerConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SchedulerConfig").field("max_dequeue_size", &self.max_dequeue_size).finish_non_exhaustive()
	}
}
