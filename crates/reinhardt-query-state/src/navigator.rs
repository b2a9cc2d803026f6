//! Navigator abstraction.
//!
//! A [`Navigator`] performs the actual page visit once the query state has
//! been serialized. The query-state manager only builds [`VisitOptions`] and
//! hands them over; fetching page data, partial reloads (`only`/`except`),
//! scroll and state preservation are the navigator's business.
//!
//! Any `Fn(&str, VisitOptions) -> Result<(), NavigationError>` closure is a
//! navigator, which keeps wiring to an existing client router short:
//!
//! ```ignore
//! let navigator = |path: &str, options: VisitOptions| {
//!     router.push(&options.href(path)?).map_err(|e| NavigationError::Rejected(e.to_string()))
//! };
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::codec::encode_query_string;
use crate::error::NavigationError;

/// Options passed along with every visit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitOptions {
	/// Serialized query parameters, sent as request data.
	pub data: IndexMap<String, String>,
	/// Do not reset the scroll position.
	pub preserve_scroll: bool,
	/// Keep component state across the visit.
	pub preserve_state: bool,
	/// Restrict the partial reload to these data keys.
	pub only: Vec<String>,
	/// Exclude these data keys from the partial reload.
	pub except: Vec<String>,
}

impl VisitOptions {
	/// Returns `path` with `data` appended as its query string.
	///
	/// Any query already present on `path` is replaced.
	pub fn href(&self, path: &str) -> Result<String, NavigationError> {
		let path = path.split_once('?').map_or(path, |(path, _)| path);
		if self.data.is_empty() {
			return Ok(path.to_string());
		}
		let query =
			encode_query_string(&self.data).map_err(|e| NavigationError::Encode(e.to_string()))?;
		Ok(format!("{}?{}", path, query))
	}

	/// Returns whether the visit asks for a partial reload.
	pub fn is_partial(&self) -> bool {
		!self.only.is_empty() || !self.except.is_empty()
	}
}

/// Performs page visits on behalf of the query-state manager.
pub trait Navigator {
	/// Visits `path` with the given options.
	///
	/// # Errors
	///
	/// Returns a [`NavigationError`] if the visit could not be started.
	/// Failures of the visit itself (network, server) are the navigator's
	/// to handle.
	fn visit(&self, path: &str, options: VisitOptions) -> Result<(), NavigationError>;
}

impl<F> Navigator for F
where
	F: Fn(&str, VisitOptions) -> Result<(), NavigationError>,
{
	fn visit(&self, path: &str, options: VisitOptions) -> Result<(), NavigationError> {
		self(path, options)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::cell::RefCell;

	fn options_with(data: &[(&str, &str)]) -> VisitOptions {
		VisitOptions {
			data: data
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect(),
			..Default::default()
		}
	}

	#[rstest]
	#[case("/users", &[], "/users")]
	#[case("/users", &[("page", "2")], "/users?page=2")]
	#[case("/users?page=1", &[("page", "2")], "/users?page=2")]
	#[case("/users?page=1", &[], "/users")]
	#[case("/", &[("ids", "1,2"), ("q", "a b")], "/?ids=1%2C2&q=a+b")]
	fn test_href(#[case] path: &str, #[case] data: &[(&str, &str)], #[case] expected: &str) {
		assert_eq!(options_with(data).href(path).unwrap(), expected);
	}

	#[rstest]
	fn test_is_partial() {
		let mut options = VisitOptions::default();
		assert!(!options.is_partial());

		options.only = vec!["users".to_string()];
		assert!(options.is_partial());
	}

	#[rstest]
	fn test_closure_navigator() {
		let seen = RefCell::new(Vec::new());
		let navigator = |path: &str, options: VisitOptions| -> Result<(), NavigationError> {
			seen.borrow_mut().push((path.to_string(), options));
			Ok(())
		};

		navigator
			.visit("/posts", options_with(&[("page", "1")]))
			.unwrap();

		let seen = seen.borrow();
		assert_eq!(seen.len(), 1);
		assert_eq!(seen[0].0, "/posts");
		assert_eq!(seen[0].1.data["page"], "1");
	}

	#[rstest]
	fn test_closure_navigator_error_passes_through() {
		let navigator = |_: &str, _: VisitOptions| -> Result<(), NavigationError> {
			Err(NavigationError::Rejected("offline".to_string()))
		};

		let result = navigator.visit("/", VisitOptions::default());
		assert_eq!(result, Err(NavigationError::Rejected("offline".to_string())));
	}
}
