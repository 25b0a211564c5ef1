//! Identity and name-safety layers for walking foreign object graphs.
//!
//! [`IdentityRegistry`] answers "have I seen this exact object before?" with a
//! stable [`ObjectId`], which is what lets a walker re-express cycles and
//! shared substructure as back-references. [`NameSanitizer`] rewrites
//! bookkeeping names that would collide with members every object inherits
//! from the base template, so stamping bookkeeping onto a visited object can
//! neither corrupt it nor be fooled by an inherited member.

/// Object id newtype and the reserved range.
pub mod id;
/// Reference-keyed identity registry.
pub mod registry;
/// Forbidden-name rewrite table.
pub mod sanitizer;

pub use id::ObjectId;
pub use registry::{DEFAULT_ID_FIELD, IdentityRegistry, IdentityStrategy, Resolved};
pub use sanitizer::NameSanitizer;
