//! File-backed walker settings.
//!
//! Settings are written in TOML; every key is optional:
//!
//! ```toml
//! max-dequeue-size = 25
//! max-depth = 16
//! max-nodes = 50000
//! identity = "stamp"
//! id-field = "__shapeshot_id__"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use shapeshot_identity::DEFAULT_ID_FIELD;
use thiserror::Error;

/// Upper bound on `max-depth`; snapshot rendering recurses once per level.
pub const MAX_DEPTH_LIMIT: usize = 512;

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
	/// Error reading a settings file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// A value is out of range.
	#[error("invalid setting: {0}")]
	Invalid(String),
}

/// Which identity registry a walk uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityMode {
	/// Fresh side-table registry per walker.
	#[default]
	SideTable,
	/// Fresh registry stamping hidden id fields onto objects.
	Stamp,
	/// The process-wide registry.
	Global,
}

/// Walker settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct WalkerSettings {
	pub max_dequeue_size: usize,
	pub max_depth: usize,
	pub max_nodes: usize,
	pub identity: IdentityMode,
	pub id_field: String,
}

impl Default for WalkerSettings {
	fn default() -> Self {
		Self {
			max_dequeue_size: 10,
			max_depth: 32,
			max_nodes: 100_000,
			identity: IdentityMode::default(),
			id_field: DEFAULT_ID_FIELD.to_string(),
		}
	}
}

impl WalkerSettings {
	/// Reads and validates a settings file.
	pub fn load(path: &Path) -> Result<Self, SettingsError> {
		let text = std::fs::read_to_string(path).map_err(|error| SettingsError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&text)
	}

	/// Parses and validates settings from TOML text.
	pub fn from_toml_str(text: &str) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(text)?;
		settings.validate()?;
		Ok(settings)
	}

	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.max_dequeue_size == 0 {
			return Err(SettingsError::Invalid("max-dequeue-size must be > 0".into()));
		}
		if self.max_nodes == 0 {
			return Err(SettingsError::Invalid("max-nodes must be > 0".into()));
		}
		if self.max_depth > MAX_DEPTH_LIMIT {
			return Err(SettingsError::Invalid(format!("max-depth must be <= {MAX_DEPTH_LIMIT}")));
		}
		if self.id_field.is_empty() {
			return Err(SettingsError::Invalid("id-field must not be empty".into()));
		}
		Ok(())
	}
}
