//! Pausable watchers
//!
//! [`watch_pausable`] subscribes a callback to a signal. The returned
//! [`PausableWatch`] gates the subscription:
//!
//! - while paused, mutations of the source are not queued at all, so
//!   resuming never replays them;
//! - a watcher paused after being queued is skipped by the next flush;
//! - dropping the last handle clone (or calling [`PausableWatch::stop`])
//!   unsubscribes the callback.

use core::cell::Cell;
use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use crate::runtime::{NodeId, WatchFn, WatcherEntry, try_with_runtime, with_runtime};
use crate::signal::Signal;

/// Handle controlling a watcher created by [`watch_pausable`].
#[derive(Clone)]
pub struct PausableWatch {
	inner: Rc<WatchInner>,
}

struct WatchInner {
	id: NodeId,
	active: Rc<Cell<bool>>,
	stopped: Cell<bool>,
}

impl Drop for WatchInner {
	fn drop(&mut self) {
		if !self.stopped.get() {
			// Released outside the runtime borrow: the callback may own signals.
			let removed = try_with_runtime(|rt| rt.remove_watcher(self.id)).flatten();
			drop(removed);
		}
	}
}

impl PausableWatch {
	/// Stops queueing the callback until [`resume`](Self::resume) is called.
	pub fn pause(&self) {
		self.inner.active.set(false);
		tracing::trace!(watcher = self.inner.id.as_u64(), "watcher paused");
	}

	/// Re-enables the callback for future mutations.
	pub fn resume(&self) {
		if self.inner.stopped.get() {
			return;
		}
		self.inner.active.set(true);
		tracing::trace!(watcher = self.inner.id.as_u64(), "watcher resumed");
	}

	/// Returns whether mutations currently queue the callback.
	pub fn is_active(&self) -> bool {
		self.inner.active.get()
	}

	/// Unsubscribes the callback permanently.
	pub fn stop(&self) {
		if self.inner.stopped.replace(true) {
			return;
		}
		self.inner.active.set(false);
		let removed = with_runtime(|rt| rt.remove_watcher(self.inner.id));
		drop(removed);
	}

	/// Returns the watcher's node id.
	pub fn id(&self) -> NodeId {
		self.inner.id
	}
}

impl fmt::Debug for PausableWatch {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PausableWatch")
			.field("id", &self.inner.id)
			.field("active", &self.inner.active.get())
			.field("stopped", &self.inner.stopped.get())
			.finish()
	}
}

/// Runs `callback` on flush after each change of `source`.
///
/// The watcher starts active and does not run on creation.
///
/// # Example
///
/// ```ignore
/// let params = Signal::new(0);
/// let watch = watch_pausable(&params, move || reload());
///
/// watch.pause();
/// params.set(1); // ignored
/// watch.resume();
/// params.set(2);
/// flush_updates(); // reload() runs once
/// ```
pub fn watch_pausable<T, F>(source: &Signal<T>, callback: F) -> PausableWatch
where
	T: 'static,
	F: FnMut() + 'static,
{
	let id = NodeId::new();
	let active = Rc::new(Cell::new(true));
	let callback: WatchFn = Rc::new(RefCell::new(callback));

	with_runtime(|rt| {
		rt.register_watcher(
			id,
			WatcherEntry {
				source: source.id(),
				callback,
				active: Rc::clone(&active),
			},
		)
	});

	PausableWatch {
		inner: Rc::new(WatchInner {
			id,
			active,
			stopped: Cell::new(false),
		}),
	}
}
