use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use shapeshot_host::{HostObject, HostValue, ObjectClass};
use shapeshot_identity::ObjectId;

/// What a member (or the root) of the snapshot points at.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
	/// Encoded primitive.
	Value(Value),
	/// First sighting of an object; rendered inline.
	Node(ObjectId),
	/// Object already recorded elsewhere in the walk.
	BackRef(ObjectId),
}

/// One recorded object.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
	pub id: ObjectId,
	pub kind: &'static str,
	/// Function name, for function objects.
	pub name: Option<String>,
	pub depth: usize,
	/// Set when the object lies beyond the depth limit and was not descended.
	pub truncated: bool,
	/// Own enumerable members in enumeration order, keys already sanitized.
	pub members: Vec<(String, Slot)>,
}

impl NodeRecord {
	pub(crate) fn new(id: ObjectId, object: &HostObject, depth: usize, truncated: bool) -> Self {
		let name = match object.class() {
			ObjectClass::Function { name } => Some(name.clone()),
			_ => None,
		};
		Self {
			id,
			kind: object.class().as_str(),
			name,
			depth,
			truncated,
			members: Vec::new(),
		}
	}
}

/// Completed walk result.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
	pub key: String,
	pub root: Slot,
	pub nodes: BTreeMap<ObjectId, NodeRecord>,
}

impl Snapshot {
	pub fn node(&self, id: ObjectId) -> Option<&NodeRecord> {
		self.nodes.get(&id)
	}

	/// Number of distinct objects recorded.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Renders the snapshot as nested JSON.
	///
	/// Each object is rendered inline at its first sighting; every later
	/// sighting becomes a `{"$ref": id}` back-reference.
	pub fn to_json(&self) -> Value {
		json!({
			"key": self.key,
			"root": self.render_slot(&self.root),
		})
	}

	fn render_slot(&self, slot: &Slot) -> Value {
		match slot {
			Slot::Value(value) => value.clone(),
			Slot::BackRef(id) => back_ref(*id),
			Slot::Node(id) => match self.nodes.get(id) {
				Some(node) => self.render_node(node),
				None => back_ref(*id),
			},
		}
	}

	fn render_node(&self, node: &NodeRecord) -> Value {
		let mut out = Map::new();
		out.insert("$id".to_string(), json!(node.id));
		out.insert("type".to_string(), json!(node.kind));
		if let Some(name) = &node.name {
			out.insert("name".to_string(), json!(name));
		}
		if node.truncated {
			out.insert("truncated".to_string(), Value::Bool(true));
		} else {
			let members = node.members.iter().map(|(key, slot)| (key.clone(), self.render_slot(slot))).collect();
			out.insert("members".to_string(), Value::Object(members));
		}
		Value::Object(out)
	}
}

fn back_ref(id: ObjectId) -> Value {
	json!({ "$ref": id })
}

/// Encodes a non-object value. Returns `None` for objects.
pub fn encode_primitive(value: &HostValue) -> Option<Value> {
	let encoded = match value {
		HostValue::Undefined => json!({ "type": "undefined" }),
		HostValue::Null => Value::Null,
		HostValue::Bool(b) => Value::Bool(*b),
		HostValue::Number(n) => encode_number(*n),
		HostValue::String(s) => Value::String(s.clone()),
		HostValue::Symbol(description) => json!({ "type": "symbol", "description": description }),
		HostValue::Object(_) => return None,
	};
	Some(encoded)
}

fn encode_number(n: f64) -> Value {
	if n.is_finite() && n.fract() == 0.0 && n.abs() <= 9_007_199_254_740_991.0 {
		return json!(n as i64);
	}
	match serde_json::Number::from_f64(n) {
		Some(num) => Value::Number(num),
		None => json!({ "type": "number", "value": HostValue::Number(n).to_display_string() }),
	}
}
