//! Location providers.
//!
//! The current URL is read through [`LocationProvider`] so that the
//! query-state logic runs the same in the browser and in native tests.
//!
//! | Provider | Target | Reads | Navigates |
//! |----------|--------|-------|-----------|
//! | [`MemoryLocation`] | any | in-process URL | rewrites the in-process URL |
//! | `BrowserLocation` | wasm32 | `window.location` | `history.pushState` + `popstate` |

use std::cell::RefCell;

use crate::error::{LocationError, NavigationError};
use crate::navigator::{Navigator, VisitOptions};

/// Read access to the current path and query string.
pub trait LocationProvider {
	/// Returns the current path, e.g. `/users`.
	fn pathname(&self) -> Result<String, LocationError>;

	/// Returns the current query string including its leading `?`, or an
	/// empty string when there is none.
	fn search(&self) -> Result<String, LocationError>;
}

/// A visit recorded by [`MemoryLocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedVisit {
	/// Path passed to the navigator.
	pub path: String,
	/// Options passed to the navigator.
	pub options: VisitOptions,
}

/// In-process URL, used on native targets and in tests.
///
/// It doubles as a [`Navigator`]: a visit replaces the stored path and query
/// with the visited URL and is appended to [`visits`](Self::visits).
#[derive(Debug)]
pub struct MemoryLocation {
	pathname: RefCell<String>,
	search: RefCell<String>,
	visits: RefCell<Vec<RecordedVisit>>,
}

impl Default for MemoryLocation {
	fn default() -> Self {
		Self::new("/")
	}
}

impl MemoryLocation {
	/// Creates a location pointing at `url` (path plus optional query).
	///
	/// # Example
	///
	/// ```ignore
	/// let location = MemoryLocation::new("/users?page=2");
	/// assert_eq!(location.pathname()?, "/users");
	/// assert_eq!(location.search()?, "?page=2");
	/// ```
	pub fn new(url: &str) -> Self {
		let location = Self {
			pathname: RefCell::new(String::new()),
			search: RefCell::new(String::new()),
			visits: RefCell::new(Vec::new()),
		};
		location.set_url(url);
		location
	}

	/// Points the location at `url` without recording a visit.
	pub fn set_url(&self, url: &str) {
		// Fragments never reach the server.
		let url = url.split_once('#').map_or(url, |(url, _)| url);
		let (path, query) = url.split_once('?').unwrap_or((url, ""));
		let path = if path.is_empty() { "/" } else { path };

		*self.pathname.borrow_mut() = path.to_string();
		*self.search.borrow_mut() = if query.is_empty() {
			String::new()
		} else {
			format!("?{}", query)
		};
	}

	/// Returns the current path followed by the query string.
	pub fn href(&self) -> String {
		format!("{}{}", self.pathname.borrow(), self.search.borrow())
	}

	/// Returns every visit made through this location, oldest first.
	pub fn visits(&self) -> Vec<RecordedVisit> {
		self.visits.borrow().clone()
	}

	/// Returns the most recent visit.
	pub fn last_visit(&self) -> Option<RecordedVisit> {
		self.visits.borrow().last().cloned()
	}

	/// Returns the number of visits made.
	pub fn visit_count(&self) -> usize {
		self.visits.borrow().len()
	}

	/// Forgets recorded visits.
	pub fn clear_visits(&self) {
		self.visits.borrow_mut().clear();
	}
}

impl LocationProvider for MemoryLocation {
	fn pathname(&self) -> Result<String, LocationError> {
		Ok(self.pathname.borrow().clone())
	}

	fn search(&self) -> Result<String, LocationError> {
		Ok(self.search.borrow().clone())
	}
}

impl Navigator for MemoryLocation {
	fn visit(&self, path: &str, options: VisitOptions) -> Result<(), NavigationError> {
		let href = options.href(path)?;
		self.set_url(&href);
		self.visits.borrow_mut().push(RecordedVisit {
			path: path.to_string(),
			options,
		});
		Ok(())
	}
}

#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub use browser::BrowserLocation;

#[cfg(all(target_family = "wasm", target_os = "unknown"))]
mod browser {
	use wasm_bindgen::JsValue;

	use super::LocationProvider;
	use crate::error::{LocationError, NavigationError};
	use crate::navigator::{Navigator, VisitOptions};

	fn js_error(err: JsValue) -> String {
		err.as_string().unwrap_or_else(|| format!("{:?}", err))
	}

	/// The browser's `window.location`.
	///
	/// As a [`Navigator`] it pushes the visited URL onto the session history
	/// and dispatches `popstate`, so a client router listening for history
	/// changes loads the page data. `only`/`except` are left to that router.
	#[derive(Debug, Clone, Copy, Default)]
	pub struct BrowserLocation;

	impl BrowserLocation {
		/// Creates a handle to the browser location.
		pub fn new() -> Self {
			Self
		}
	}

	impl LocationProvider for BrowserLocation {
		fn pathname(&self) -> Result<String, LocationError> {
			let window = web_sys::window()
				.ok_or_else(|| LocationError::Unavailable("no window object".to_string()))?;
			window
				.location()
				.pathname()
				.map_err(|e| LocationError::Read(js_error(e)))
		}

		fn search(&self) -> Result<String, LocationError> {
			let window = web_sys::window()
				.ok_or_else(|| LocationError::Unavailable("no window object".to_string()))?;
			window
				.location()
				.search()
				.map_err(|e| LocationError::Read(js_error(e)))
		}
	}

	impl Navigator for BrowserLocation {
		fn visit(&self, path: &str, options: VisitOptions) -> Result<(), NavigationError> {
			let href = options.href(path)?;
			let window = web_sys::window()
				.ok_or_else(|| NavigationError::Unavailable("no window object".to_string()))?;
			let history = window
				.history()
				.map_err(|e| NavigationError::Unavailable(js_error(e)))?;

			history
				.push_state_with_url(&JsValue::NULL, "", Some(&href))
				.map_err(|e| NavigationError::Rejected(js_error(e)))?;

			let event = web_sys::PopStateEvent::new("popstate")
				.map_err(|e| NavigationError::Rejected(js_error(e)))?;
			window
				.dispatch_event(&event)
				.map_err(|e| NavigationError::Rejected(js_error(e)))?;

			if !options.preserve_scroll {
				window.scroll_to_with_x_and_y(0.0, 0.0);
			}
			Ok(())
		}
	}
}

/// Location used by [`use_query`](crate::use_query) on this target.
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub type PlatformLocation = BrowserLocation;

/// Location used by [`use_query`](crate::use_query) on this target.
#[cfg(not(all(target_family = "wasm", target_os = "unknown")))]
pub type PlatformLocation = MemoryLocation;
