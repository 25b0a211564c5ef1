//! Bounded-batch cooperative task scheduling.
//!
//! A [`BatchScheduler`] owns a FIFO queue of small tasks and drains it in
//! slices of at most `max_dequeue_size` tasks, handing control back to the
//! host between slices. Tasks may enqueue further tasks while they run; those
//! join the back of the same queue.

mod config;
mod report;
mod scheduler;
mod task;

pub use config::{Callback, SchedulerConfig};
pub use report::DrainReport;
pub use scheduler::{BatchScheduler, FlushOutcome, SchedulerError, SchedulerState};
pub use task::{Task, TaskContext, TaskError};
