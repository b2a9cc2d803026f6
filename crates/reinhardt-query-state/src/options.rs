//! Options for [`UseQuery`](crate::UseQuery).
//!
//! Options can be built fluently or deserialized from page props / settings,
//! using the same camelCase keys the page payload carries:
//!
//! ```ignore
//! let options = UseQueryOptions::new()
//!     .with_keys(["search", "page"])
//!     .preserve_state(true);
//!
//! let options = UseQueryOptions::from_json_str(r#"{"keys": ["search"], "eager": false}"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{QueryStateError, Result};
use crate::navigator::VisitOptions;
use crate::value::{ParamMap, QueryValue};

/// Separator used for list values when none is configured.
pub const DEFAULT_DELIMITER: &str = ",";

/// Configuration of a query-state manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UseQueryOptions {
	/// Keep the scroll position across reloads.
	pub preserve_scroll: bool,
	/// Keep component state across reloads.
	pub preserve_state: bool,
	/// Restrict partial reloads to these data keys.
	pub only: Vec<String>,
	/// Exclude these data keys from partial reloads.
	pub except: Vec<String>,
	/// React to changes right after the initial URL sync.
	pub eager: bool,
	/// Token joining list values.
	pub delimiter: String,
	/// Declared parameter names, each seeded to null.
	pub keys: Vec<String>,
}

impl Default for UseQueryOptions {
	fn default() -> Self {
		Self {
			preserve_scroll: false,
			preserve_state: false,
			only: Vec::new(),
			except: Vec::new(),
			eager: true,
			delimiter: DEFAULT_DELIMITER.to_string(),
			keys: Vec::new(),
		}
	}
}

impl UseQueryOptions {
	/// Creates options with every default.
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads options from a JSON document.
	pub fn from_json_str(json: &str) -> Result<Self> {
		serde_json::from_str(json).map_err(|e| QueryStateError::Config(e.to_string()))
	}

	/// Loads options from a TOML document.
	#[cfg(feature = "toml")]
	pub fn from_toml_str(source: &str) -> Result<Self> {
		toml::from_str(source).map_err(|e| QueryStateError::Config(e.to_string()))
	}

	/// Sets the declared keys.
	pub fn with_keys<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.keys = keys.into_iter().map(Into::into).collect();
		self
	}

	/// Sets the list delimiter.
	pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
		self.delimiter = delimiter.into();
		self
	}

	/// Sets `preserve_scroll`.
	pub fn preserve_scroll(mut self, preserve: bool) -> Self {
		self.preserve_scroll = preserve;
		self
	}

	/// Sets `preserve_state`.
	pub fn preserve_state(mut self, preserve: bool) -> Self {
		self.preserve_state = preserve;
		self
	}

	/// Sets the partial-reload allow list.
	pub fn only<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.only = keys.into_iter().map(Into::into).collect();
		self
	}

	/// Sets the partial-reload deny list.
	pub fn except<I, S>(mut self, keys: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.except = keys.into_iter().map(Into::into).collect();
		self
	}

	/// Sets whether reactions start right after the initial URL sync.
	pub fn eager(mut self, eager: bool) -> Self {
		self.eager = eager;
		self
	}

	/// Shorthand for `eager(false)`: the caller resumes reactions manually.
	pub fn lazy(self) -> Self {
		self.eager(false)
	}

	/// Returns the effective delimiter.
	///
	/// An empty delimiter cannot split anything, so it falls back to
	/// [`DEFAULT_DELIMITER`].
	pub fn delimiter(&self) -> &str {
		if self.delimiter.is_empty() {
			DEFAULT_DELIMITER
		} else {
			&self.delimiter
		}
	}

	/// Returns `{key: null}` for every declared key.
	pub fn seed(&self) -> ParamMap {
		self.keys
			.iter()
			.map(|key| (key.clone(), QueryValue::Null))
			.collect()
	}

	/// Builds the navigator options for a reload carrying `data`.
	pub(crate) fn visit_options(&self, data: indexmap::IndexMap<String, String>) -> VisitOptions {
		VisitOptions {
			data,
			preserve_scroll: self.preserve_scroll,
			preserve_state: self.preserve_state,
			only: self.only.clone(),
			except: self.except.clone(),
		}
	}
}
