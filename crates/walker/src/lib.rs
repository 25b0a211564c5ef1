//! Incremental walker producing JSON shape snapshots of host object graphs.
//!
//! A [`GraphWalker`] turns every discovered object into one visit task on a
//! [`BatchScheduler`](shapeshot_worker::BatchScheduler), resolves each object
//! through an [`IdentityRegistry`](shapeshot_identity::IdentityRegistry), and
//! records cycles and shared substructure as `{"$ref": id}` back-references
//! instead of descending twice.

pub mod settings;
pub mod snapshot;
mod walker;

pub use settings::{IdentityMode, SettingsError, WalkerSettings};
pub use snapshot::{NodeRecord, Slot, Snapshot};
pub use walker::{GraphWalker, Progress, RegistryHandle, WalkError, WalkerConfig};
