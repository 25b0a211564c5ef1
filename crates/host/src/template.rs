use crate::object::{HostObject, ObjectClass};

/// Member names every ordinary object inherits from the base template.
pub const STANDARD_MEMBERS: &[&str] = &[
	"constructor",
	"__defineGetter__",
	"__defineSetter__",
	"hasOwnProperty",
	"__lookupGetter__",
	"__lookupSetter__",
	"isPrototypeOf",
	"propertyIsEnumerable",
	"toString",
	"valueOf",
	"__proto__",
	"toLocaleString",
];

/// The universal base-object template.
///
/// Objects created through [`BaseTemplate::instantiate`] inherit every member
/// of the template, so ordinary member access on them resolves these names
/// even when the object itself never defined them.
#[derive(Debug, Clone)]
pub struct BaseTemplate {
	object: HostObject,
}

impl BaseTemplate {
	/// Template carrying the standard member set.
	pub fn standard() -> Self {
		Self::with_members(STANDARD_MEMBERS.iter().copied())
	}

	/// Template carrying an arbitrary member set, e.g. a snapshot of another
	/// host environment.
	pub fn with_members<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
		let object = HostObject::new(ObjectClass::Plain);
		for name in names {
			let member = HostObject::new(ObjectClass::Function { name: name.to_string() });
			// Template members are non-enumerable, like their host counterparts.
			let _ = object.define_hidden(name, member.into());
		}
		Self { object }
	}

	/// Names of every member defined on the template.
	pub fn member_names(&self) -> Vec<String> {
		self.object.own_keys()
	}

	/// Returns true when `name` is a template member.
	pub fn defines(&self, name: &str) -> bool {
		self.object.has_own(name)
	}

	/// The template object itself.
	pub fn object(&self) -> &HostObject {
		&self.object
	}

	/// Creates an object of `class` inheriting from this template.
	pub fn instantiate(&self, class: ObjectClass) -> HostObject {
		HostObject::with_prototype(class, Some(self.object.clone()))
	}
}

impl Default for BaseTemplate {
	fn default() -> Self {
		Self::standard()
	}
}
