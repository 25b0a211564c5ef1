use crate::object::HostObject;

/// A value stored in a host property slot.
#[derive(Debug, Clone)]
pub enum HostValue {
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(String),
	/// Symbol with its optional description.
	Symbol(Option<String>),
	/// Any object, including functions, arrays, and storage objects.
	Object(HostObject),
}

impl HostValue {
	/// Returns the object handle when this value is an object.
	pub fn as_object(&self) -> Option<&HostObject> {
		match self {
			Self::Object(obj) => Some(obj),
			_ => None,
		}
	}

	/// Returns the numeric payload when this value is a number.
	pub fn as_number(&self) -> Option<f64> {
		match self {
			Self::Number(n) => Some(*n),
			_ => None,
		}
	}

	/// Host-level type tag, as reported by a `typeof`-style query.
	pub fn type_name(&self) -> &'static str {
		match self {
			Self::Undefined => "undefined",
			Self::Null => "object",
			Self::Bool(_) => "boolean",
			Self::Number(_) => "number",
			Self::String(_) => "string",
			Self::Symbol(_) => "symbol",
			Self::Object(obj) => obj.class().type_name(),
		}
	}

	/// Coerces the value to the string a storage object would persist.
	pub fn to_display_string(&self) -> String {
		match self {
			Self::Undefined => "undefined".to_string(),
			Self::Null => "null".to_string(),
			Self::Bool(b) => b.to_string(),
			Self::Number(n) => format_number(*n),
			Self::String(s) => s.clone(),
			Self::Symbol(desc) => format!("Symbol({})", desc.as_deref().unwrap_or_default()),
			Self::Object(obj) => format!("[object {}]", obj.class().tag()),
		}
	}
}

fn format_number(n: f64) -> String {
	if n.is_nan() {
		"NaN".to_string()
	} else if n.is_infinite() {
		if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
	} else if n.fract() == 0.0 && n.abs() < 1e21 {
		format!("{}", n as i64)
	} else {
		n.to_string()
	}
}

impl From<bool> for HostValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<f64> for HostValue {
	fn from(value: f64) -> Self {
		Self::Number(value)
	}
}

impl From<i32> for HostValue {
	fn from(value: i32) -> Self {
		Self::Number(f64::from(value))
	}
}

impl From<&str> for HostValue {
	fn from(value: &str) -> Self {
		Self::String(value.to_string())
	}
}

impl From<String> for HostValue {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}

impl From<HostObject> for HostValue {
	fn from(value: HostObject) -> Self {
		Self::Object(value)
	}
}

impl From<&HostObject> for HostValue {
	fn from(value: &HostObject) -> Self {
		Self::Object(value.clone())
	}
}
