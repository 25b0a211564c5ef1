use std::sync::OnceLock;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use shapeshot_host::{HostObject, HostValue, Property};

use crate::id::ObjectId;
use crate::sanitizer::NameSanitizer;

/// Default bookkeeping field used by [`IdentityStrategy::Stamp`].
pub const DEFAULT_ID_FIELD: &str = "__shapeshot_id__";

/// How a registry remembers which id belongs to which object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdentityStrategy {
	/// Reference-keyed side table. Never touches the observed objects.
	#[default]
	SideTable,
	/// Stamp a hidden, non-enumerable id field onto each object.
	///
	/// The field name is passed through the registry's [`NameSanitizer`].
	/// Objects that refuse hidden metadata, or that already own a member by
	/// that name, are tracked in an ordered side list instead. A stamp is only
	/// read back from objects this registry stamped itself, so stamps written
	/// by another registry or forged by the object are never trusted.
	Stamp { field: String },
}

/// Outcome of resolving one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
	pub id: ObjectId,
	/// True when the id was minted by this call.
	pub fresh: bool,
}

struct Entry {
	// Held so the address key cannot be reused by another allocation.
	_object: HostObject,
	id: ObjectId,
}

struct RegistryState {
	next: u64,
	table: FxHashMap<usize, Entry>,
	// Objects this registry stamped, keyed by address. The handle pins the
	// address for the registry's lifetime.
	stamped: FxHashMap<usize, HostObject>,
	detached: Vec<(HostObject, ObjectId)>,
}

impl RegistryState {
	fn mint(&mut self) -> ObjectId {
		let id = ObjectId::minted(self.next);
		self.next += 1;
		id
	}

	fn find_detached(&self, object: &HostObject) -> Option<ObjectId> {
		self.detached.iter().find(|(seen, _)| HostObject::ptr_eq(seen, object)).map(|(_, id)| *id)
	}
}

/// Assigns stable, never-reused ids to host objects.
///
/// Ids start at [`ObjectId::RESERVED_FLOOR`] and increase by one per distinct
/// object. Entries are never removed; the registry keeps every observed object
/// alive for its own lifetime.
pub struct IdentityRegistry {
	strategy: IdentityStrategy,
	sanitizer: NameSanitizer,
	state: Mutex<RegistryState>,
}

impl Default for IdentityRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for IdentityRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.state.lock();
		f.debug_struct("IdentityRegistry")
			.field("strategy", &self.strategy)
			.field("next", &state.next)
			.field("tracked", &state.table.len())
			.field("stamped", &state.stamped.len())
			.field("detached", &state.detached.len())
			.finish()
	}
}

impl IdentityRegistry {
	/// Creates an isolated side-table registry.
	pub fn new() -> Self {
		Self::with_strategy(IdentityStrategy::SideTable, NameSanitizer::standard())
	}

	/// Creates an isolated registry with an explicit strategy and sanitizer.
	pub fn with_strategy(strategy: IdentityStrategy, sanitizer: NameSanitizer) -> Self {
		Self {
			strategy,
			sanitizer,
			state: Mutex::new(RegistryState {
				next: ObjectId::RESERVED_FLOOR,
				table: FxHashMap::default(),
				stamped: FxHashMap::default(),
				detached: Vec::new(),
			}),
		}
	}

	/// Process-wide registry shared by every caller that does not bring its own.
	pub fn global() -> &'static IdentityRegistry {
		static GLOBAL: OnceLock<IdentityRegistry> = OnceLock::new();
		GLOBAL.get_or_init(IdentityRegistry::new)
	}

	pub fn strategy(&self) -> &IdentityStrategy {
		&self.strategy
	}

	pub fn sanitizer(&self) -> &NameSanitizer {
		&self.sanitizer
	}

	/// Returns the id of `object`, minting one on first sight.
	pub fn id_of(&self, object: &HostObject) -> ObjectId {
		self.resolve(object).id
	}

	/// Returns the id of `object` and whether it was minted by this call.
	pub fn resolve(&self, object: &HostObject) -> Resolved {
		let mut state = self.state.lock();
		if let Some(id) = self.lookup(&state, object) {
			return Resolved { id, fresh: false };
		}

		let id = state.mint();
		match &self.strategy {
			IdentityStrategy::SideTable => {
				state.table.insert(object.addr(), Entry { _object: object.clone(), id });
			}
			IdentityStrategy::Stamp { field } => {
				let field = self.sanitizer.rewrite(field);
				match object.define_hidden(&field, HostValue::Number(id.get() as f64)) {
					Ok(()) => {
						state.stamped.insert(object.addr(), object.clone());
					}
					Err(error) => {
						tracing::debug!(%id, %error, "identity.detached");
						state.detached.push((object.clone(), id));
					}
				}
			}
		}
		tracing::trace!(%id, class = object.class().as_str(), "identity.mint");
		Resolved { id, fresh: true }
	}

	/// Returns the id of `object` if one was already issued.
	pub fn known(&self, object: &HostObject) -> Option<ObjectId> {
		let state = self.state.lock();
		self.lookup(&state, object)
	}

	/// Number of ids issued so far.
	pub fn len(&self) -> usize {
		(self.state.lock().next - ObjectId::RESERVED_FLOOR) as usize
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// The id the next distinct object will receive.
	pub fn next_id(&self) -> ObjectId {
		ObjectId::minted(self.state.lock().next)
	}

	fn lookup(&self, state: &RegistryState, object: &HostObject) -> Option<ObjectId> {
		match &self.strategy {
			IdentityStrategy::SideTable => state.table.get(&object.addr()).map(|entry| entry.id),
			IdentityStrategy::Stamp { field } => {
				if state.stamped.contains_key(&object.addr())
					&& let Some(id) = read_stamp(object.get_own(&self.sanitizer.rewrite(field)), state.next)
				{
					return Some(id);
				}
				state.find_detached(object)
			}
		}
	}
}

/// Accepts only hidden numeric members in the issued range. Anything else
/// under the field name has been overwritten since it was stamped.
fn read_stamp(slot: Option<Property>, next: u64) -> Option<ObjectId> {
	let prop = slot?;
	if prop.enumerable {
		return None;
	}
	let raw = prop.value.as_number()?;
	if raw.fract() != 0.0 || raw < ObjectId::RESERVED_FLOOR as f64 || raw >= next as f64 {
		return None;
	}
	Some(ObjectId::minted(raw as u64))
}

#[cfg(test)]
mod tests;
