use std::borrow::Cow;

use rustc_hash::FxHashMap;
use shapeshot_host::BaseTemplate;

/// Delimiter wrapped around rewritten names.
pub const SENTINEL: &str = "@@";

/// Rewrites names that collide with base template members.
///
/// The table is fixed at construction: every template member name maps to a
/// decorated alternative (`toString` becomes `@@toString@@`). Names that
/// already look decorated gain one more layer (`@@toString@@` becomes
/// `@@@@toString@@@@`) so no two names share a rewritten form. Every other
/// name maps to itself. Lookups never mutate, so one sanitizer can be shared
/// freely across walkers and threads.
#[derive(Debug, Clone)]
pub struct NameSanitizer {
	forward: FxHashMap<String, String>,
	reverse: FxHashMap<String, String>,
}

impl NameSanitizer {
	/// Sanitizer for the standard base template.
	pub fn standard() -> Self {
		Self::from_template(&BaseTemplate::standard())
	}

	/// Sanitizer for the members of a specific template snapshot.
	///
	/// A table built from one host environment may under- or over-protect in
	/// another; build it from the template that is actually being walked.
	pub fn from_template(template: &BaseTemplate) -> Self {
		Self::from_names(template.member_names())
	}

	/// Sanitizer for an explicit forbidden-name set.
	pub fn from_names<S: AsRef<str>>(names: impl IntoIterator<Item = S>) -> Self {
		let mut forward = FxHashMap::default();
		let mut reverse = FxHashMap::default();
		for name in names {
			let name = name.as_ref();
			let decorated = format!("{SENTINEL}{name}{SENTINEL}");
			reverse.insert(decorated.clone(), name.to_string());
			forward.insert(name.to_string(), decorated);
		}
		Self { forward, reverse }
	}

	/// Returns the collision-free form of `name`.
	pub fn rewrite<'a>(&'a self, name: &'a str) -> Cow<'a, str> {
		if let Some(decorated) = self.forward.get(name) {
			return Cow::Borrowed(decorated);
		}
		if is_decorated(name) {
			return Cow::Owned(format!("{SENTINEL}{name}{SENTINEL}"));
		}
		Cow::Borrowed(name)
	}

	/// Reverses [`Self::rewrite`].
	pub fn restore<'a>(&'a self, name: &'a str) -> &'a str {
		if let Some(original) = self.reverse.get(name) {
			return original;
		}
		match strip(name) {
			Some(inner) if is_decorated(inner) => inner,
			_ => name,
		}
	}

	/// Returns true when `name` is in the forbidden set.
	pub fn is_forbidden(&self, name: &str) -> bool {
		self.forward.contains_key(name)
	}

	/// Number of forbidden names.
	pub fn len(&self) -> usize {
		self.forward.len()
	}

	pub fn is_empty(&self) -> bool {
		self.forward.is_empty()
	}
}

fn strip(name: &str) -> Option<&str> {
	name.strip_prefix(SENTINEL)?.strip_suffix(SENTINEL)
}

fn is_decorated(name: &str) -> bool {
	name.len() >= 2 * SENTINEL.len() && strip(name).is_some()
}

impl Default for NameSanitizer {
	fn default() -> Self {
		Self::standard()
	}
}

#[cfg(test)]
mod tests {
	use proptest::prelude::*;
	use shapeshot_host::template::STANDARD_MEMBERS;

	use super::*;

	#[test]
	fn forbidden_names_are_decorated() {
		let sanitizer = NameSanitizer::standard();
		assert_eq!(sanitizer.rewrite("toString"), "@@toString@@");
		assert_eq!(sanitizer.rewrite("__proto__"), "@@__proto__@@");
		assert_eq!(sanitizer.restore("@@toString@@"), "toString");
		assert!(sanitizer.is_forbidden("constructor"));
		assert_eq!(sanitizer.len(), STANDARD_MEMBERS.len());
	}

	#[test]
	fn every_standard_member_is_rewritten_and_stable() {
		let sanitizer = NameSanitizer::standard();
		for name in STANDARD_MEMBERS {
			let first = sanitizer.rewrite(name);
			assert_ne!(first, *name);
			assert_eq!(first, sanitizer.rewrite(name));
			assert_eq!(sanitizer.restore(&first), *name);
		}
	}

	#[test]
	fn table_follows_the_template_it_was_built_from() {
		let template = BaseTemplate::with_members(["toJSON"]);
		let sanitizer = NameSanitizer::from_template(&template);
		assert_eq!(sanitizer.rewrite("toJSON"), "@@toJSON@@");
		assert_eq!(sanitizer.rewrite("toString"), "toString");
	}

	#[test]
	fn matching_is_exact() {
		let sanitizer = NameSanitizer::standard();
		assert_eq!(sanitizer.rewrite("ToString"), "ToString");
		assert_eq!(sanitizer.rewrite("toString "), "toString ");
		assert_eq!(sanitizer.rewrite(""), "");
	}

	#[test]
	fn decorated_looking_names_are_escaped() {
		let sanitizer = NameSanitizer::standard();
		assert_eq!(sanitizer.rewrite("@@toString@@"), "@@@@toString@@@@");
		assert_eq!(sanitizer.restore("@@@@toString@@@@"), "@@toString@@");
		assert_ne!(sanitizer.rewrite("@@toString@@"), sanitizer.rewrite("toString"));
		assert_eq!(sanitizer.rewrite("@@"), "@@");
		assert_eq!(sanitizer.rewrite("@@half"), "@@half");
	}

	proptest! {
		#[test]
		fn rewriting_is_reversible(name in "(@@)*(toString|valueOf|[a-z@]{0,6})(@@)*") {
			let sanitizer = NameSanitizer::standard();
			let rewritten = sanitizer.rewrite(&name);
			prop_assert_eq!(sanitizer.restore(&rewritten), name.as_str());
		}

		#[test]
		fn names_outside_the_table_are_unchanged(name in "[a-zA-Z_$][a-zA-Z0-9_$]{0,24}") {
			let sanitizer = NameSanitizer::standard();
			prop_assume!(!STANDARD_MEMBERS.contains(&name.as_str()));
			prop_assert_eq!(sanitizer.rewrite(&name), name.as_str());
			prop_assert_eq!(sanitizer.restore(&name), name.as_str());
		}
	}
}
