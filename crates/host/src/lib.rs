//! Host object model for shapeshot.
//!
//! The walker operates on a dynamic, possibly cyclic graph of objects that it
//! does not own: property bags with an insertion-ordered key space, optional
//! prototypes, and per-property enumerability. This crate models that graph
//! so the scheduling and identity layers can be exercised against the same
//! hazards a live environment presents:
//!
//! - objects that reference themselves or each other,
//! - members inherited from a shared base template,
//! - own members whose names shadow template members,
//! - host objects that refuse hidden metadata.

/// Demo environment graphs.
pub mod fixtures;
/// Objects, properties, and host-level errors.
pub mod object;
/// The universal base-object template.
pub mod template;
/// Primitive and object values.
pub mod value;

pub use object::{HostError, HostObject, ObjectClass, Property};
pub use template::BaseTemplate;
pub use value::HostValue;
