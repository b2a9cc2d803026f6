//! Query-state manager: `use_query`
//!
//! [`UseQuery`] owns a reactive [`ParamMap`] mirroring the page's query
//! string. Mutations through its setters queue a reload, which serializes
//! the map and asks the [`Navigator`] to visit the current path with it.
//!
//! ## Lifecycle
//!
//! 1. **Create**: the map is seeded with `{key: null}` for every declared key.
//! 2. **Mount**: reactions are paused, values parsed from the current URL are
//!    merged into the map, and reactions resume if `eager` is set.
//! 3. **Mutate**: `set` / `clear` / `reset` queue one reload per flush while
//!    reactions are active. The flush runs on the thread's scheduler (a
//!    browser microtask under [`use_query`] on wasm), or on a manual
//!    `flush_updates()` where none is installed.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_query_state::{UseQueryOptions, use_query};
//!
//! // URL: /users?search=ada&page=1
//! let query = use_query(UseQueryOptions::new().with_keys(["search", "page"]));
//! assert_eq!(query.get("page"), Some(1.into()));
//!
//! query.set("page", 2);
//! query.set("search", "grace");
//! // next microtask: one visit to /users?search=grace&page=2
//! ```

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use reinhardt_reactive::{PausableWatch, Signal, watch_pausable};

use crate::codec::{encode_query_string, parse_query_string, to_query_params};
use crate::error::Result;
use crate::location::{LocationProvider, PlatformLocation};
use crate::navigator::Navigator;
use crate::options::UseQueryOptions;
use crate::value::{ParamMap, QueryValue};

/// Everything a reload needs, shared with the watcher callback.
struct Reloader {
	params: Signal<ParamMap>,
	options: UseQueryOptions,
	location: Rc<dyn LocationProvider>,
	navigator: Rc<dyn Navigator>,
}

impl Reloader {
	fn query_params(&self) -> IndexMap<String, String> {
		let delimiter = self.options.delimiter();
		self.params.with(|params| to_query_params(params, delimiter))
	}

	fn reload(&self) {
		let path = match self.location.pathname() {
			Ok(path) => path,
			Err(err) => {
				tracing::warn!(error = %err, "skipping reload: current path unavailable");
				return;
			}
		};

		let span = tracing::debug_span!("query_state.reload", path = %path);
		let _enter = span.enter();

		let options = self.options.visit_options(self.query_params());
		tracing::debug!(params = options.data.len(), partial = options.is_partial(), "visiting");

		if let Err(err) = self.navigator.visit(&path, options) {
			tracing::warn!(error = %err, "navigator rejected reload");
		}
	}
}

/// Reactive query parameters bound to the page URL.
///
/// Cloning is cheap; clones share the same parameters and reaction gate.
#[derive(Clone)]
pub struct UseQuery {
	reloader: Rc<Reloader>,
	watch: PausableWatch,
}

impl fmt::Debug for UseQuery {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("UseQuery")
			.field("params", &self.reloader.params)
			.field("options", &self.reloader.options)
			.field("active", &self.watch.is_active())
			.finish()
	}
}

impl UseQuery {
	/// Creates a manager seeded with the declared keys.
	///
	/// The URL is not read until [`mount`](Self::mount). Reactions are active
	/// from the start.
	pub fn new<L, N>(options: UseQueryOptions, location: Rc<L>, navigator: Rc<N>) -> Self
	where
		L: LocationProvider + 'static,
		N: Navigator + 'static,
	{
		let params = Signal::new(options.seed());
		tracing::debug!(keys = ?options.keys, eager = options.eager, "query state created");

		let reloader = Rc::new(Reloader {
			params: params.clone(),
			options,
			location,
			navigator,
		});

		let watch = watch_pausable(&params, {
			let reloader = Rc::clone(&reloader);
			move || reloader.reload()
		});

		Self { reloader, watch }
	}

	/// Merges the parameters found in the current URL into the map.
	///
	/// Runs with reactions paused, so syncing never triggers a reload.
	/// Reactions are resumed afterwards only when `eager` is set. A URL that
	/// cannot be read leaves the map untouched.
	pub fn mount(&self) {
		self.watch.pause();

		match self.reloader.location.search() {
			Ok(search) => {
				let parsed = parse_query_string(&search, self.reloader.options.delimiter());
				tracing::debug!(synced = parsed.len(), "query state synced from URL");
				self.reloader.params.update(|params| params.extend(parsed));
			}
			Err(err) => {
				tracing::warn!(error = %err, "query state not synced: location unavailable");
			}
		}

		if self.reloader.options.eager {
			self.watch.resume();
		}
	}

	/// Returns the reactive parameter map.
	pub fn params(&self) -> &Signal<ParamMap> {
		&self.reloader.params
	}

	/// Returns the options this manager was created with.
	pub fn options(&self) -> &UseQueryOptions {
		&self.reloader.options
	}

	/// Returns the value of `key`, or `None` if it was never set.
	pub fn get(&self, key: &str) -> Option<QueryValue> {
		self.reloader.params.with(|params| params.get(key).cloned())
	}

	/// Inserts or overwrites `key`.
	pub fn set(&self, key: impl Into<String>, value: impl Into<QueryValue>) {
		let key = key.into();
		let value = value.into();
		tracing::trace!(key = %key, value = ?value, "set query param");
		self.reloader.params.update(|params| {
			params.insert(key, value);
		});
	}

	/// Sets `key` to null.
	pub fn clear(&self, key: impl Into<String>) {
		self.set(key, QueryValue::Null);
	}

	/// Restores `{key: null}` for every declared key, dropping keys added later.
	pub fn reset(&self) {
		tracing::trace!("reset query params");
		self.reloader.params.set(self.reloader.options.seed());
	}

	/// Visits the current path with the serialized parameters.
	///
	/// Fire-and-forget: navigator errors are logged, not returned.
	pub fn reload(&self) {
		self.reloader.reload();
	}

	/// Stops mutations from triggering reloads.
	pub fn pause(&self) {
		tracing::debug!("query state reactions paused");
		self.watch.pause();
	}

	/// Lets future mutations trigger reloads again.
	///
	/// Changes made while paused are not replayed.
	pub fn resume(&self) {
		tracing::debug!("query state reactions resumed");
		self.watch.resume();
	}

	/// Returns whether mutations currently trigger reloads.
	pub fn is_active(&self) -> bool {
		self.watch.is_active()
	}

	/// Returns the serialized parameters a reload would send.
	pub fn to_query_params(&self) -> IndexMap<String, String> {
		self.reloader.query_params()
	}

	/// Returns the URL a reload would visit.
	pub fn href(&self) -> Result<String> {
		let path = self.reloader.location.pathname()?;
		let data = self.to_query_params();
		if data.is_empty() {
			return Ok(path);
		}
		Ok(format!("{}?{}", path, encode_query_string(&data)?))
	}
}

/// Creates a [`UseQuery`] bound to this target's location and mounts it.
///
/// In the browser this reads `window.location`, navigates through the
/// History API and installs the microtask flush scheduler if none is set.
/// Elsewhere it uses an in-process [`MemoryLocation`](crate::MemoryLocation)
/// starting at `/`, and reloads run on whatever scheduler the thread has.
pub fn use_query(options: UseQueryOptions) -> UseQuery {
	#[cfg(all(target_family = "wasm", target_os = "unknown"))]
	reinhardt_reactive::install_browser_scheduler();

	let location = Rc::new(PlatformLocation::default());
	let query = UseQuery::new(options, Rc::clone(&location), location);
	query.mount();
	query
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::location::MemoryLocation;
	use crate::navigator::VisitOptions;
	use crate::error::NavigationError;
	use reinhardt_reactive::flush_updates;
	use rstest::{fixture, rstest};

	#[fixture]
	fn location() -> Rc<MemoryLocation> {
		Rc::new(MemoryLocation::new("/"))
	}

	fn query_with(options: UseQueryOptions, location: &Rc<MemoryLocation>) -> UseQuery {
		UseQuery::new(options, Rc::clone(location), Rc::clone(location))
	}

	#[rstest]
	fn test_new_seeds_declared_keys(location: Rc<MemoryLocation>) {
		let query = query_with(UseQueryOptions::new().with_keys(["search", "page"]), &location);

		assert_eq!(query.get("search"), Some(QueryValue::Null));
		assert_eq!(query.get("page"), Some(QueryValue::Null));
		assert_eq!(query.get("missing"), None);
	}

	#[rstest]
	fn test_unknown_keys_are_accepted(location: Rc<MemoryLocation>) {
		let query = query_with(UseQueryOptions::new(), &location);
		query.set("extra", "x");

		assert_eq!(query.get("extra"), Some("x".into()));
	}

	#[rstest]
	fn test_set_queues_one_reload_per_flush(location: Rc<MemoryLocation>) {
		let query = query_with(UseQueryOptions::new().with_keys(["search", "page"]), &location);
		query.set("search", "ada");
		query.set("page", 3);
		assert_eq!(location.visit_count(), 0);

		flush_updates();

		assert_eq!(location.visit_count(), 1);
		assert_eq!(location.href(), "/?search=ada&page=3");
	}

	#[rstest]
	fn test_reset_drops_dynamic_keys(location: Rc<MemoryLocation>) {
		let query = query_with(UseQueryOptions::new().with_keys(["search"]), &location);
		query.set("search", "x");
		query.set("dynamic", 1);
		query.reset();

		let expected: ParamMap = [("search".to_string(), QueryValue::Null)].into_iter().collect();
		assert_eq!(query.params().get(), expected);
	}

	#[rstest]
	fn test_mount_reads_url_without_reloading(location: Rc<MemoryLocation>) {
		location.set_url("/users?search=test&page=1");
		let query = query_with(UseQueryOptions::new().with_keys(["search", "page"]), &location);

		query.mount();
		flush_updates();

		assert_eq!(query.get("search"), Some("test".into()));
		assert_eq!(query.get("page"), Some(1.into()));
		assert_eq!(location.visit_count(), 0);
		assert!(query.is_active());
	}

	#[rstest]
	fn test_lazy_mount_stays_paused(location: Rc<MemoryLocation>) {
		let query = query_with(UseQueryOptions::new().with_keys(["page"]).lazy(), &location);
		query.mount();

		query.set("page", 2);
		flush_updates();
		assert!(!query.is_active());
		assert_eq!(location.visit_count(), 0);

		query.resume();
		query.set("page", 3);
		flush_updates();
		assert_eq!(location.visit_count(), 1);
	}

	#[rstest]
	fn test_reload_forwards_options(location: Rc<MemoryLocation>) {
		location.set_url("/reports");
		let options = UseQueryOptions::new()
			.with_keys(["ids"])
			.preserve_scroll(true)
			.only(["rows"])
			.except(["totals"]);
		let query = query_with(options, &location);
		query.set("ids", vec![4, 5]);
		query.reload();

		let visit = location.last_visit().unwrap();
		assert_eq!(visit.path, "/reports");
		assert_eq!(visit.options.data["ids"], "4,5");
		assert!(visit.options.preserve_scroll);
		assert!(!visit.options.preserve_state);
		assert_eq!(visit.options.only, vec!["rows"]);
		assert_eq!(visit.options.except, vec!["totals"]);
	}

	#[rstest]
	fn test_navigator_failure_is_swallowed(location: Rc<MemoryLocation>) {
		let failing = Rc::new(|_: &str, _: VisitOptions| -> std::result::Result<(), NavigationError> {
			Err(NavigationError::Rejected("offline".to_string()))
		});
		let query = UseQuery::new(UseQueryOptions::new().with_keys(["page"]), location, failing);

		query.set("page", 1);
		flush_updates();
		query.reload();

		assert_eq!(query.get("page"), Some(1.into()));
	}

	#[rstest]
	fn test_href_and_query_params(location: Rc<MemoryLocation>) {
		location.set_url("/search");
		let query = query_with(
			UseQueryOptions::new().with_keys(["q", "tags"]).with_delimiter("|"),
			&location,
		);
		query.set("q", "a b");
		query.set("tags", ["x", "y"]);

		assert_eq!(query.to_query_params()["tags"], "x|y");
		assert_eq!(query.href().unwrap(), "/search?q=a+b&tags=x%7Cy");
	}

	#[rstest]
	fn test_clones_share_state(location: Rc<MemoryLocation>) {
		let query = query_with(UseQueryOptions::new().with_keys(["page"]), &location);
		let clone = query.clone();

		clone.set("page", 9);
		query.pause();

		assert_eq!(query.get("page"), Some(9.into()));
		assert!(!clone.is_active());
	}

	#[rstest]
	fn test_use_query_mounts_platform_location() {
		let query = use_query(UseQueryOptions::new().with_keys(["page"]));

		assert!(query.is_active());
		assert_eq!(query.get("page"), Some(QueryValue::Null));
		assert_eq!(query.href().unwrap(), "/");
	}
}
