use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::scheduler::BatchScheduler;

type TaskFn = Box<dyn FnOnce(&mut TaskContext<'_>) -> Result<(), TaskError> + Send + 'static>;

/// One opaque unit of work.
///
/// A task runs at most once; the scheduler consumes it when it is dequeued.
pub struct Task {
	run: TaskFn,
}

impl Task {
	pub fn new<F>(run: F) -> Self
	where
		F: FnOnce(&mut TaskContext<'_>) -> Result<(), TaskError> + Send + 'static,
	{
		Self { run: Box::new(run) }
	}

	pub(crate) fn run(self, ctx: &mut TaskContext<'_>) -> Result<(), TaskError> {
		(self.run)(ctx)
	}
}

impl fmt::Debug for Task {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Task")
	}
}

/// Handle passed to a running task.
pub struct TaskContext<'a> {
	scheduler: &'a BatchScheduler,
	slice: u64,
	enqueued: usize,
}

impl<'a> TaskContext<'a> {
	pub(crate) fn new(scheduler: &'a BatchScheduler, slice: u64) -> Self {
		Self { scheduler, slice, enqueued: 0 }
	}

	/// Appends a task to the back of the scheduler's queue.
	///
	/// The new task may run later in the current slice if the slice cap is not
	/// yet exhausted, otherwise in a later slice.
	pub fn enqueue<F>(&mut self, run: F)
	where
		F: FnOnce(&mut TaskContext<'_>) -> Result<(), TaskError> + Send + 'static,
	{
		self.enqueue_task(Task::new(run));
	}

	pub fn enqueue_task(&mut self, task: Task) {
		self.enqueued += 1;
		self.scheduler.enqueue_task(task);
	}

	/// One-based index of the slice this task runs in.
	pub fn slice(&self) -> u64 {
		self.slice
	}

	/// Tasks enqueued through this context so far.
	pub fn enqueued(&self) -> usize {
		self.enqueued
	}

	pub fn scheduler(&self) -> &BatchScheduler {
		self.scheduler
	}
}

/// Failure raised by a task.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TaskError {
	message: String,
	#[source]
	source: Option<Box<dyn StdError + Send + Sync + 'static>>,
	panicked: bool,
}

impl TaskError {
	/// Task failure carrying only a message.
	pub fn msg(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
			source: None,
			panicked: false,
		}
	}

	/// Task failure wrapping a typed error.
	pub fn new<E>(error: E) -> Self
	where
		E: StdError + Send + Sync + 'static,
	{
		Self {
			message: error.to_string(),
			source: Some(Box::new(error)),
			panicked: false,
		}
	}

	pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
		let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
			(*s).to_string()
		} else if let Some(s) = payload.downcast_ref::<String>() {
			s.clone()
		} else {
			"task panicked".to_string()
		};
		Self {
			message,
			source: None,
			panicked: true,
		}
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	/// Returns true when the task panicked instead of returning an error.
	pub fn is_panic(&self) -> bool {
		self.panicked
	}

	/// Returns the wrapped error when it has type `E`.
	pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
		self.source.as_deref().and_then(|err| err.downcast_ref::<E>())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Error, PartialEq)]
	#[error("limit hit")]
	struct LimitHit;

	#[test]
	fn typed_errors_can_be_recovered() {
		let err = TaskError::new(LimitHit);
		assert_eq!(err.message(), "limit hit");
		assert_eq!(err.downcast_ref::<LimitHit>(), Some(&LimitHit));
		assert!(StdError::source(&err).is_some());
	}

	#[test]
	fn panic_payloads_become_messages() {
		let err = TaskError::from_panic(Box::new("boom-str"));
		assert!(err.is_panic());
		assert_eq!(err.message(), "boom-str");

		let err = TaskError::from_panic(Box::new(String::from("boom-string")));
		assert_eq!(err.message(), "boom-string");

		let err = TaskError::from_panic(Box::new(7u8));
		assert_eq!(err.message(), "task panicked");
	}
}
