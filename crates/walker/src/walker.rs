use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use shapeshot_host::{HostObject, HostValue};
use shapeshot_identity::{IdentityRegistry, IdentityStrategy, NameSanitizer, ObjectId};
use shapeshot_worker::{BatchScheduler, DrainReport, FlushOutcome, SchedulerConfig, SchedulerError, SchedulerState, Task, TaskError};
use thiserror::Error;

use crate::settings::{IdentityMode, WalkerSettings};
use crate::snapshot::{NodeRecord, Slot, Snapshot, encode_primitive};

/// Walk failure.
#[derive(Debug, Error)]
pub enum WalkError {
	/// The walk discovered more distinct objects than allowed.
	#[error("node limit of {limit} reached")]
	NodeLimit { limit: usize },
	/// `visit` was never called.
	#[error("walk has not been started")]
	NotStarted,
	/// `visit` was already called on this walker.
	#[error("walk already started")]
	AlreadyStarted,
	/// The snapshot was requested before the walk finished.
	#[error("walk is incomplete ({pending} task(s) pending)")]
	Incomplete { pending: usize },
	/// A task failure aborted the walk.
	#[error("walk aborted by a failed task")]
	Aborted,
	#[error(transparent)]
	Scheduler(SchedulerError),
}

impl From<SchedulerError> for WalkError {
	fn from(err: SchedulerError) -> Self {
		if let SchedulerError::TaskFailed { source, .. } = &err
			&& let Some(WalkError::NodeLimit { limit }) = source.downcast_ref::<WalkError>()
		{
			return WalkError::NodeLimit { limit: *limit };
		}
		WalkError::Scheduler(err)
	}
}

/// Registry used by a walker: an owned instance or the process-wide one.
#[derive(Debug, Clone)]
pub enum RegistryHandle {
	Owned(Arc<IdentityRegistry>),
	Global,
}

impl Deref for RegistryHandle {
	type Target = IdentityRegistry;

	fn deref(&self) -> &IdentityRegistry {
		match self {
			Self::Owned(registry) => registry,
			Self::Global => IdentityRegistry::global(),
		}
	}
}

/// Walker configuration.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
	scheduler: SchedulerConfig,
	max_depth: usize,
	max_nodes: usize,
	registry: RegistryHandle,
}

impl Default for WalkerConfig {
	fn default() -> Self {
		Self::from_settings(&WalkerSettings::default())
	}
}

impl WalkerConfig {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds a configuration from validated settings.
	pub fn from_settings(settings: &WalkerSettings) -> Self {
		let registry = match settings.identity {
			IdentityMode::SideTable => RegistryHandle::Owned(Arc::new(IdentityRegistry::new())),
			IdentityMode::Stamp => RegistryHandle::Owned(Arc::new(IdentityRegistry::with_strategy(
				IdentityStrategy::Stamp {
					field: settings.id_field.clone(),
				},
				NameSanitizer::standard(),
			))),
			IdentityMode::Global => RegistryHandle::Global,
		};
		let batch = NonZeroUsize::new(settings.max_dequeue_size).unwrap_or(NonZeroUsize::MIN);
		Self {
			scheduler: SchedulerConfig::new().max_dequeue_size(batch),
			max_depth: settings.max_depth,
			max_nodes: settings.max_nodes.max(1),
			registry,
		}
	}

	/// Maximum number of objects visited per slice.
	#[must_use]
	pub fn max_dequeue_size(mut self, size: NonZeroUsize) -> Self {
		self.scheduler = self.scheduler.max_dequeue_size(size);
		self
	}

	#[must_use]
	pub fn on_tick(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
		self.scheduler = self.scheduler.on_tick(callback);
		self
	}

	#[must_use]
	pub fn on_done(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
		self.scheduler = self.scheduler.on_done(callback);
		self
	}

	/// Objects deeper than `depth` are recorded but not descended.
	#[must_use]
	pub fn max_depth(mut self, depth: usize) -> Self {
		self.max_depth = depth;
		self
	}

	/// Distinct objects a walk may record before it aborts.
	#[must_use]
	pub fn max_nodes(mut self, nodes: usize) -> Self {
		self.max_nodes = nodes.max(1);
		self
	}

	/// Uses a caller-owned registry, e.g. to share ids across walks.
	#[must_use]
	pub fn registry(mut self, registry: Arc<IdentityRegistry>) -> Self {
		self.registry = RegistryHandle::Owned(registry);
		self
	}

	/// Uses the process-wide registry.
	#[must_use]
	pub fn global_registry(mut self) -> Self {
		self.registry = RegistryHandle::Global;
		self
	}
}

/// Walk progress counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
	/// Distinct objects recorded so far.
	pub nodes: usize,
	/// Visit tasks still queued.
	pub pending: usize,
	/// Slices started.
	pub slices: u64,
}

#[derive(Default)]
struct WalkState {
	key: Option<String>,
	root: Option<Slot>,
	scheduled: bool,
	nodes: FxHashMap<ObjectId, NodeRecord>,
}

struct Shared {
	registry: RegistryHandle,
	max_depth: usize,
	max_nodes: usize,
	state: Mutex<WalkState>,
}

impl Shared {
	/// Records `object` on first sighting and returns the visit task for it.
	///
	/// Objects already recorded by this walk become back-references.
	fn discover(self: &Arc<Self>, object: HostObject, depth: usize) -> Result<(Slot, Option<Task>), WalkError> {
		let id = self.registry.id_of(&object);
		let mut state = self.state.lock();
		if state.nodes.contains_key(&id) {
			tracing::trace!(%id, "walker.back_ref");
			return Ok((Slot::BackRef(id), None));
		}
		if state.nodes.len() >= self.max_nodes {
			return Err(WalkError::NodeLimit { limit: self.max_nodes });
		}

		let truncated = depth > self.max_depth;
		state.nodes.insert(id, NodeRecord::new(id, &object, depth, truncated));
		drop(state);

		let task = (!truncated).then(|| self.visit_task(object, id, depth));
		Ok((Slot::Node(id), task))
	}

	fn visit_task(self: &Arc<Self>, object: HostObject, id: ObjectId, depth: usize) -> Task {
		let shared = Arc::clone(self);
		Task::new(move |ctx| {
			let sanitizer = shared.registry.sanitizer();
			let entries = object.own_enumerable();
			let mut members = Vec::with_capacity(entries.len());
			for (key, value) in entries {
				let key = sanitizer.rewrite(&key).into_owned();
				let slot = match value {
					HostValue::Object(child) => {
						let (slot, task) = shared.discover(child, depth + 1).map_err(TaskError::new)?;
						if let Some(task) = task {
							ctx.enqueue_task(task);
						}
						slot
					}
					other => Slot::Value(encode_primitive(&other).unwrap_or_default()),
				};
				members.push((key, slot));
			}

			tracing::trace!(%id, depth, members = members.len(), "walker.visit");
			if let Some(node) = shared.state.lock().nodes.get_mut(&id) {
				node.members = members;
			}
			Ok(())
		})
	}
}

/// Incremental object-graph walker.
///
/// Every visited object costs one scheduler task, so a walk over an
/// arbitrarily large graph never runs more than `max_dequeue_size` visits
/// between yields.
pub struct GraphWalker {
	scheduler: BatchScheduler,
	shared: Arc<Shared>,
}

impl GraphWalker {
	pub fn new(config: WalkerConfig) -> Self {
		Self {
			scheduler: BatchScheduler::new(config.scheduler),
			shared: Arc::new(Shared {
				registry: config.registry,
				max_depth: config.max_depth,
				max_nodes: config.max_nodes,
				state: Mutex::new(WalkState::default()),
			}),
		}
	}

	/// Starts a walk at `root`, recorded under `key`.
	pub fn visit(&self, root: &HostValue, key: &str) -> Result<(), WalkError> {
		{
			let state = self.shared.state.lock();
			if state.root.is_some() {
				return Err(WalkError::AlreadyStarted);
			}
		}

		let (slot, task) = match root {
			HostValue::Object(object) => self.shared.discover(object.clone(), 0)?,
			other => (Slot::Value(encode_primitive(other).unwrap_or_default()), None),
		};
		{
			let mut state = self.shared.state.lock();
			state.key = Some(self.shared.registry.sanitizer().rewrite(key).into_owned());
			state.root = Some(slot);
			state.scheduled = task.is_some();
		}
		if let Some(task) = task {
			self.scheduler.enqueue_task(task);
		}
		tracing::debug!(key, "walker.visit.start");
		Ok(())
	}

	/// Runs one slice of the walk.
	pub fn flush(&self) -> Result<FlushOutcome, WalkError> {
		self.scheduler.flush().map_err(WalkError::from)
	}

	/// Drives the walk to completion, yielding between slices.
	pub async fn run(&self) -> Result<DrainReport, WalkError> {
		let report = self.scheduler.run().await?;
		tracing::debug!(nodes = self.progress().nodes, slices = report.slices, "walker.done");
		Ok(report)
	}

	pub fn progress(&self) -> Progress {
		Progress {
			nodes: self.shared.state.lock().nodes.len(),
			pending: self.scheduler.pending(),
			slices: self.scheduler.slices(),
		}
	}

	pub fn state(&self) -> SchedulerState {
		self.scheduler.state()
	}

	/// Registry the walk resolves ids through.
	pub fn registry(&self) -> &IdentityRegistry {
		&self.shared.registry
	}

	/// Returns the completed snapshot.
	pub fn snapshot(&self) -> Result<Snapshot, WalkError> {
		let scheduler_state = self.scheduler.state();
		let pending = self.scheduler.pending();

		let state = self.shared.state.lock();
		let (Some(key), Some(root)) = (state.key.clone(), state.root.clone()) else {
			return Err(WalkError::NotStarted);
		};
		// A primitive root schedules no work and is complete at once.
		if state.scheduled {
			match scheduler_state {
				SchedulerState::Done => {}
				SchedulerState::Failed => return Err(WalkError::Aborted),
				SchedulerState::Idle | SchedulerState::Draining => return Err(WalkError::Incomplete { pending }),
			}
		}

		let nodes: BTreeMap<_, _> = state.nodes.iter().map(|(id, node)| (*id, node.clone())).collect();
		Ok(Snapshot { key, root, nodes })
	}

	/// Returns the completed snapshot rendered as JSON.
	pub fn to_json(&self) -> Result<serde_json::Value, WalkError> {
		Ok(self.snapshot()?.to_json())
	}
}
