use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use crate::config::{Callback, SchedulerConfig};
use crate::report::DrainReport;
use crate::task::{Task, TaskContext, TaskError};

/// Observable scheduler lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
	/// No slice is running. Tasks may be queued.
	Idle,
	/// A slice is executing.
	Draining,
	/// The last slice left the queue empty and `on_done` fired.
	Done,
	/// A task failed; no further slices run until [`BatchScheduler::recover`].
	Failed,
}

/// Result of one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
	/// Tasks remain; yield to the host and flush again.
	Pending,
	/// The queue drained and `on_done` fired.
	Done,
}

/// Scheduler failure.
#[derive(Debug, Error)]
pub enum SchedulerError {
	/// A task failed and aborted its slice.
	#[error("task failed in slice {slice} ({dropped} dequeued task(s) dropped): {source}")]
	TaskFailed {
		slice: u64,
		dropped: usize,
		#[source]
		source: TaskError,
	},
	/// `on_tick` or `on_done` panicked. No task of the slice ran after it.
	#[error("{callback} callback panicked in slice {slice}: {source}")]
	CallbackPanicked {
		slice: u64,
		callback: &'static str,
		#[source]
		source: TaskError,
	},
	/// An earlier failure left the scheduler in the failed state.
	#[error("scheduler is aborted; call recover() before flushing again")]
	Aborted,
	/// `flush` was called from inside a running slice.
	#[error("flush called while a slice is draining")]
	Reentrant,
}

struct QueueState {
	queue: VecDeque<Task>,
	state: SchedulerState,
	slices: u64,
	executed: u64,
}

struct Inner {
	config: Mutex<SchedulerConfig>,
	queue: Mutex<QueueState>,
}

/// Cooperative scheduler that drains its queue in bounded slices.
///
/// Each [`flush`](Self::flush) executes at most `max_dequeue_size` tasks in
/// FIFO order and then returns, so the host regains control between slices.
/// [`run`](Self::run) drives flushes to completion, yielding to the async
/// runtime between slices.
///
/// The handle is cheap to clone; clones share one queue. The queue must not
/// be shared across independent traversal runs.
#[derive(Clone)]
pub struct BatchScheduler {
	inner: Arc<Inner>,
}

impl Default for BatchScheduler {
	fn default() -> Self {
		Self::new(SchedulerConfig::default())
	}
}

impl std::fmt::Debug for BatchScheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let queue = self.inner.queue.lock();
		f.debug_struct("BatchScheduler")
			.field("state", &queue.state)
			.field("pending", &queue.queue.len())
			.field("slices", &queue.slices)
			.field("executed", &queue.executed)
			.finish()
	}
}

impl BatchScheduler {
	/// Creates an idle scheduler with an empty queue.
	pub fn new(config: SchedulerConfig) -> Self {
		Self {
			inner: Arc::new(Inner {
				config: Mutex::new(config),
				queue: Mutex::new(QueueState {
					queue: VecDeque::new(),
					state: SchedulerState::Idle,
					slices: 0,
					executed: 0,
				}),
			}),
		}
	}

	/// Replaces the configuration. Takes effect on the next slice.
	pub fn configure(&self, config: SchedulerConfig) {
		*self.inner.config.lock() = config;
	}

	/// Appends a task to the back of the queue.
	pub fn enqueue<F>(&self, run: F)
	where
		F: FnOnce(&mut TaskContext<'_>) -> Result<(), TaskError> + Send + 'static,
	{
		self.enqueue_task(Task::new(run));
	}

	pub fn enqueue_task(&self, task: Task) {
		let mut queue = self.inner.queue.lock();
		queue.queue.push_back(task);
		if queue.state == SchedulerState::Done {
			queue.state = SchedulerState::Idle;
		}
	}

	/// Appends tasks in iteration order.
	pub fn enqueue_all(&self, tasks: impl IntoIterator<Item = Task>) {
		let mut queue = self.inner.queue.lock();
		queue.queue.extend(tasks);
		if queue.state == SchedulerState::Done && !queue.queue.is_empty() {
			queue.state = SchedulerState::Idle;
		}
	}

	/// Runs one slice.
	///
	/// Fires `on_tick`, executes up to `max_dequeue_size` tasks, then either
	/// reports [`FlushOutcome::Pending`] or fires `on_done` and reports
	/// [`FlushOutcome::Done`].
	///
	/// A failing task aborts the slice: the error is returned, tasks dequeued
	/// for the slice but not yet executed are dropped, `on_done` does not fire,
	/// and the scheduler enters [`SchedulerState::Failed`]. A panicking
	/// callback also enters the failed state; the queue is left untouched.
	pub fn flush(&self) -> Result<FlushOutcome, SchedulerError> {
		let config = self.inner.config.lock().clone();
		let slice = {
			let mut queue = self.inner.queue.lock();
			match queue.state {
				SchedulerState::Failed => return Err(SchedulerError::Aborted),
				SchedulerState::Draining => return Err(SchedulerError::Reentrant),
				SchedulerState::Idle | SchedulerState::Done => {}
			}
			queue.state = SchedulerState::Draining;
			queue.slices += 1;
			queue.slices
		};

		self.fire(&config.on_tick, "on_tick", slice)?;

		let cap = config.max_dequeue_size.get();
		let mut batch = self.dequeue(cap);
		let mut executed = 0usize;
		while let Some(task) = batch.pop_front() {
			let mut ctx = TaskContext::new(self, slice);
			let result = catch_unwind(AssertUnwindSafe(|| task.run(&mut ctx))).unwrap_or_else(|payload| Err(TaskError::from_panic(payload)));
			if let Err(source) = result {
				let dropped = batch.len();
				{
					let mut queue = self.inner.queue.lock();
					queue.state = SchedulerState::Failed;
					queue.executed += executed as u64;
				}
				tracing::warn!(slice, executed, dropped, error = %source, "worker.flush.aborted");
				return Err(SchedulerError::TaskFailed { slice, dropped, source });
			}
			executed += 1;
			if batch.is_empty() && executed < cap {
				batch = self.dequeue(cap - executed);
			}
		}

		let pending = {
			let mut queue = self.inner.queue.lock();
			queue.executed += executed as u64;
			queue.state = if queue.queue.is_empty() { SchedulerState::Done } else { SchedulerState::Idle };
			queue.queue.len()
		};
		tracing::trace!(slice, executed, pending, "worker.flush");

		if pending == 0 {
			self.fire(&config.on_done, "on_done", slice)?;
			Ok(FlushOutcome::Done)
		} else {
			Ok(FlushOutcome::Pending)
		}
	}

	/// Flushes until the queue drains, yielding to the runtime between slices.
	pub async fn run(&self) -> Result<DrainReport, SchedulerError> {
		let executed_before = self.executed();
		let mut report = DrainReport::default();
		loop {
			report.slices += 1;
			let outcome = self.flush();
			report.executed = self.executed() - executed_before;
			match outcome? {
				FlushOutcome::Done => break,
				FlushOutcome::Pending => tokio::task::yield_now().await,
			}
		}
		tracing::debug!(slices = report.slices, executed = report.executed, "worker.run.done");
		Ok(report)
	}

	/// Leaves the failed state, keeping whatever is still queued.
	///
	/// Returns false when the scheduler was not failed.
	pub fn recover(&self) -> bool {
		let mut queue = self.inner.queue.lock();
		if queue.state != SchedulerState::Failed {
			return false;
		}
		queue.state = SchedulerState::Idle;
		tracing::debug!(pending = queue.queue.len(), "worker.recover");
		true
	}

	pub fn state(&self) -> SchedulerState {
		self.inner.queue.lock().state
	}

	/// Number of queued tasks.
	pub fn pending(&self) -> usize {
		self.inner.queue.lock().queue.len()
	}

	/// Total tasks executed successfully across all slices.
	pub fn executed(&self) -> u64 {
		self.inner.queue.lock().executed
	}

	/// Total slices started.
	pub fn slices(&self) -> u64 {
		self.inner.queue.lock().slices
	}

	fn fire(&self, callback: &Callback, name: &'static str, slice: u64) -> Result<(), SchedulerError> {
		catch_unwind(AssertUnwindSafe(|| callback())).map_err(|payload| {
			self.inner.queue.lock().state = SchedulerState::Failed;
			let source = TaskError::from_panic(payload);
			tracing::warn!(slice, callback = name, error = %source, "worker.callback.panicked");
			SchedulerError::CallbackPanicked {
				slice,
				callback: name,
				source,
			}
		})
	}

	fn dequeue(&self, max: usize) -> VecDeque<Task> {
		let mut queue = self.inner.queue.lock();
		let take = queue.queue.len().min(max);
		queue.queue.drain(..take).collect()
	}
}
