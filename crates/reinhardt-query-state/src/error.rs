//! Error types for reinhardt-query-state

use thiserror::Error;

/// Failure to read the current URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
	/// No URL surface is reachable (e.g. no `window` object).
	#[error("Location unavailable: {0}")]
	Unavailable(String),

	/// The URL surface exists but could not be read.
	#[error("Failed to read location: {0}")]
	Read(String),
}

/// Failure reported by a [`Navigator`](crate::Navigator).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
	/// No navigation surface is reachable.
	#[error("Navigator unavailable: {0}")]
	Unavailable(String),

	/// The navigator refused or failed the visit.
	#[error("Navigation rejected: {0}")]
	Rejected(String),

	/// The request data could not be encoded into a URL.
	#[error("Failed to encode visit data: {0}")]
	Encode(String),
}

/// Error type for query-state operations.
#[derive(Debug, Error)]
pub enum QueryStateError {
	/// Reading the current location failed.
	#[error(transparent)]
	Location(#[from] LocationError),

	/// Navigation failed.
	#[error(transparent)]
	Navigation(#[from] NavigationError),

	/// Encoding parameters as a query string failed.
	#[error("Failed to encode query string: {0}")]
	Encode(#[from] serde_urlencoded::ser::Error),

	/// Options could not be loaded.
	#[error("Invalid query options: {0}")]
	Config(String),
}

/// Result type for query-state operations.
pub type Result<T> = std::result::Result<T, QueryStateError>;
