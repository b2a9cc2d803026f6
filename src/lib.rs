//! # Reinhardt URL State
//!
//! Reactive query-string state for Reinhardt frontends.
//!
//! A page declares the query parameters it cares about. The manager seeds
//! them, syncs their values from the current URL on mount, and reloads the
//! page data whenever they change. Reloads are coalesced: any number of
//! mutations inside one flush produce a single visit.
//!
//! ## Crates
//!
//! - [`reactive`]: `Signal`, pausable watchers, `batch` and `flush_updates`
//! - [`query`]: `UseQuery`, `UseQueryOptions`, `QueryValue`, the URL codec
//!   and the location/navigator seams
//!
//! ## Feature Flags
//!
//! - `config-toml` - load `UseQueryOptions` from TOML settings
//! - `full` (default) - all of the above
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use reinhardt_url_state::prelude::*;
//!
//! // URL: /users?search=ada&ids=1,2,3
//! let query = use_query(
//!     UseQueryOptions::new()
//!         .with_keys(["search", "ids", "page"])
//!         .preserve_state(true),
//! );
//!
//! assert_eq!(query.get("ids"), Some(vec![1, 2, 3].into()));
//!
//! query.set("page", 2);
//! query.clear("search");
//! flush_updates(); // one visit to /users?ids=1%2C2%2C3&page=2
//! ```

pub mod query;
pub mod reactive;

/// Commonly used types.
pub mod prelude {
	pub use crate::query::{
		LocationProvider, MemoryLocation, NavigationError, Navigator, QueryValue, UseQuery,
		UseQueryOptions, VisitOptions, use_query,
	};
	pub use crate::reactive::{Signal, batch, flush_updates};
}
