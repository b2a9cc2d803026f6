//! # Reinhardt Query State
//!
//! Keeps a reactive map of page parameters in sync with the URL query string
//! and reloads page data through a [`Navigator`] whenever the map changes.
//!
//! ## Overview
//!
//! - [`UseQuery`] / [`use_query`]: the manager. Exposes `params`, `get`,
//!   `set`, `clear`, `reset`, `reload`, `pause` and `resume`.
//! - [`QueryValue`]: null, bool, number, string or a list of numbers and
//!   strings.
//! - [`codec`]: map-to-query-string serialization and URL parsing with
//!   numeric coercion and delimited lists.
//! - [`LocationProvider`] / [`Navigator`]: the URL surface and the page
//!   visitor, injected so the logic runs outside a browser too.
//!
//! ## Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use reinhardt_query_state::{MemoryLocation, UseQuery, UseQueryOptions};
//! use reinhardt_reactive::flush_updates;
//!
//! let location = Rc::new(MemoryLocation::new("/users?ids=1,2,3"));
//! let query = UseQuery::new(
//!     UseQueryOptions::new().with_keys(["ids"]),
//!     location.clone(),
//!     location.clone(),
//! );
//! query.mount();
//! assert_eq!(query.get("ids"), Some(vec![1, 2, 3].into()));
//!
//! query.clear("ids");
//! flush_updates();
//! assert_eq!(location.href(), "/users");
//! ```
//!
//! ## Feature Flags
//!
//! - `toml`: [`UseQueryOptions::from_toml_str`]

pub mod codec;
pub mod error;
pub mod location;
pub mod navigator;
pub mod options;
pub mod use_query;
pub mod value;

pub use codec::{encode_query_string, parse_query_string, to_query_params};
pub use error::{LocationError, NavigationError, QueryStateError, Result};
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub use location::BrowserLocation;
pub use location::{LocationProvider, MemoryLocation, PlatformLocation, RecordedVisit};
pub use navigator::{Navigator, VisitOptions};
pub use options::{DEFAULT_DELIMITER, UseQueryOptions};
pub use use_query::{UseQuery, use_query};
pub use value::{ParamMap, QueryItem, QueryValue};
