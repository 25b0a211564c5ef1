use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use thiserror::Error;

use crate::value::HostValue;

/// Upper bound on prototype hops during inherited lookups.
const MAX_PROTOTYPE_DEPTH: usize = 256;

/// Errors raised by the host object model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
	/// The object refuses hidden (non-enumerable) metadata.
	#[error("{class} objects reject hidden property '{name}'")]
	MetadataRejected { class: &'static str, name: String },
	/// A hidden definition would overwrite an existing own member.
	#[error("own property '{0}' already exists")]
	NameInUse(String),
	/// Setting the prototype would make the chain circular.
	#[error("prototype assignment would create a cycle")]
	PrototypeCycle,
}

/// Built-in kind of a host object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectClass {
	Plain,
	Array,
	Function { name: String },
	/// Key/value storage area. Coerces stored values to strings and rejects
	/// hidden metadata.
	Storage,
}

impl ObjectClass {
	/// Snapshot tag for this class.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Plain => "object",
			Self::Array => "array",
			Self::Function { .. } => "function",
			Self::Storage => "storage",
		}
	}

	pub(crate) fn type_name(&self) -> &'static str {
		match self {
			Self::Function { .. } => "function",
			_ => "object",
		}
	}

	pub(crate) fn tag(&self) -> &'static str {
		match self {
			Self::Plain => "Object",
			Self::Array => "Array",
			Self::Function { .. } => "Function",
			Self::Storage => "Storage",
		}
	}
}

/// One own property slot.
#[derive(Debug, Clone)]
pub struct Property {
	pub value: HostValue,
	pub enumerable: bool,
}

struct ObjectInner {
	class: ObjectClass,
	prototype: RwLock<Option<HostObject>>,
	properties: RwLock<IndexMap<String, Property>>,
}

/// Shared handle to a host object.
///
/// Cloning the handle never clones the object; equality is by reference via
/// [`HostObject::ptr_eq`].
#[derive(Clone)]
pub struct HostObject {
	inner: Arc<ObjectInner>,
}

impl HostObject {
	/// Creates an object with no prototype.
	pub fn new(class: ObjectClass) -> Self {
		Self::with_prototype(class, None)
	}

	/// Creates an object inheriting from `prototype`.
	pub fn with_prototype(class: ObjectClass, prototype: Option<HostObject>) -> Self {
		Self {
			inner: Arc::new(ObjectInner {
				class,
				prototype: RwLock::new(prototype),
				properties: RwLock::new(IndexMap::new()),
			}),
		}
	}

	/// Creates an array whose elements are stored under index keys.
	pub fn array(prototype: Option<HostObject>, items: impl IntoIterator<Item = HostValue>) -> Self {
		let array = Self::with_prototype(ObjectClass::Array, prototype);
		let mut len = 0usize;
		for (idx, item) in items.into_iter().enumerate() {
			array.set(idx.to_string(), item);
			len = idx + 1;
		}
		let _ = array.define_hidden("length", HostValue::Number(len as f64));
		array
	}

	pub fn class(&self) -> &ObjectClass {
		&self.inner.class
	}

	/// Returns true when both handles point at the same object.
	pub fn ptr_eq(a: &HostObject, b: &HostObject) -> bool {
		Arc::ptr_eq(&a.inner, &b.inner)
	}

	/// Stable address of the object, valid while any handle is alive.
	pub fn addr(&self) -> usize {
		Arc::as_ptr(&self.inner) as usize
	}

	pub fn prototype(&self) -> Option<HostObject> {
		self.inner.prototype.read().clone()
	}

	/// Replaces the prototype, refusing circular chains.
	pub fn set_prototype(&self, prototype: Option<HostObject>) -> Result<(), HostError> {
		let mut cursor = prototype.clone();
		while let Some(proto) = cursor {
			if HostObject::ptr_eq(&proto, self) {
				return Err(HostError::PrototypeCycle);
			}
			cursor = proto.prototype();
		}
		*self.inner.prototype.write() = prototype;
		Ok(())
	}

	/// Assigns an own property.
	///
	/// New keys are enumerable and appended; existing keys keep their position
	/// and enumerability. Storage objects persist the string form of the value.
	pub fn set(&self, name: impl Into<String>, value: impl Into<HostValue>) {
		let name = name.into();
		let mut value = value.into();
		if self.inner.class == ObjectClass::Storage {
			value = HostValue::String(value.to_display_string());
		}
		let mut props = self.inner.properties.write();
		if let Some(existing) = props.get_mut(&name) {
			existing.value = value;
		} else {
			props.insert(name, Property { value, enumerable: true });
		}
	}

	/// Defines a non-enumerable own property.
	pub fn define_hidden(&self, name: &str, value: HostValue) -> Result<(), HostError> {
		if self.inner.class == ObjectClass::Storage {
			return Err(HostError::MetadataRejected {
				class: self.inner.class.as_str(),
				name: name.to_string(),
			});
		}
		let mut props = self.inner.properties.write();
		if props.contains_key(name) {
			return Err(HostError::NameInUse(name.to_string()));
		}
		props.insert(name.to_string(), Property { value, enumerable: false });
		Ok(())
	}

	/// Reads an own property without consulting the prototype chain.
	pub fn get_own(&self, name: &str) -> Option<Property> {
		self.inner.properties.read().get(name).cloned()
	}

	pub fn has_own(&self, name: &str) -> bool {
		self.inner.properties.read().contains_key(name)
	}

	/// Reads a property the way ordinary member access does: own first, then
	/// along the prototype chain.
	pub fn get(&self, name: &str) -> Option<HostValue> {
		if let Some(prop) = self.get_own(name) {
			return Some(prop.value);
		}
		let mut cursor = self.prototype();
		let mut hops = 0;
		while let Some(proto) = cursor {
			if let Some(prop) = proto.get_own(name) {
				return Some(prop.value);
			}
			hops += 1;
			if hops >= MAX_PROTOTYPE_DEPTH {
				return None;
			}
			cursor = proto.prototype();
		}
		None
	}

	/// Own enumerable properties in insertion order.
	pub fn own_enumerable(&self) -> Vec<(String, HostValue)> {
		self.inner
			.properties
			.read()
			.iter()
			.filter(|(_, prop)| prop.enumerable)
			.map(|(name, prop)| (name.clone(), prop.value.clone()))
			.collect()
	}

	/// Every own key, enumerable or not, in insertion order.
	pub fn own_keys(&self) -> Vec<String> {
		self.inner.properties.read().keys().cloned().collect()
	}

	/// Number of own properties, including hidden ones.
	pub fn len(&self) -> usize {
		self.inner.properties.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl fmt::Debug for HostObject {
	// Objects may be cyclic; never descend into property values here.
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HostObject")
			.field("class", self.class())
			.field("addr", &format_args!("{:#x}", self.addr()))
			.field("own_keys", &self.len())
			.finish()
	}
}
