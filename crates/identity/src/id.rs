use std::fmt;

use serde::Serialize;

/// Unique id of an object observed by an [`IdentityRegistry`](crate::IdentityRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectId(u64);

impl ObjectId {
	/// First id a registry issues. Values below it are never minted and are
	/// left to callers for their own sentinels.
	pub const RESERVED_FLOOR: u64 = 10_000;

	/// Caller-defined sentinel inside the reserved range.
	///
	/// Returns `None` when `value` is not below [`Self::RESERVED_FLOOR`].
	pub const fn sentinel(value: u64) -> Option<Self> {
		if value < Self::RESERVED_FLOOR { Some(Self(value)) } else { None }
	}

	pub(crate) const fn minted(value: u64) -> Self {
		Self(value)
	}

	pub const fn get(self) -> u64 {
		self.0
	}

	/// Returns true for sentinel values a registry never issues.
	pub const fn is_reserved(self) -> bool {
		self.0 < Self::RESERVED_FLOOR
	}
}

impl fmt::Display for ObjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn sentinels_stay_below_the_floor() {
		assert_eq!(ObjectId::sentinel(0).map(ObjectId::get), Some(0));
		assert!(ObjectId::sentinel(9_999).is_some_and(ObjectId::is_reserved));
		assert_eq!(ObjectId::sentinel(ObjectId::RESERVED_FLOOR), None);
	}
}
