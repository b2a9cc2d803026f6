//! Runtime - Subscription registry and update queue
//!
//! The runtime keeps track of which watchers observe which signals and
//! queues watchers whose source changed. Nothing runs until the queue is
//! flushed, so several synchronous mutations collapse into one callback run.
//!
//! ## Flush Modes
//!
//! | Mode | Behavior |
//! |------|----------|
//! | [`FlushMode::Batched`] | Queued watchers run on [`flush_updates`] (default) |
//! | [`FlushMode::Sync`] | Queued watchers run at the end of every top-level mutation |
//!
//! Inside [`batch`] automatic flushing is suppressed in both modes; the
//! queue is flushed once when the outermost batch returns.
//!
//! ## Scheduling
//!
//! In [`FlushMode::Batched`] a scheduler installed with [`set_scheduler`]
//! receives one flush task per dirty cycle: the first mutation after a flush
//! hands [`flush_updates`] to the scheduler, later mutations only join the
//! queue. In the browser, [`install_browser_scheduler`] runs that task as a
//! microtask through `wasm_bindgen_futures::spawn_local`. Without a scheduler
//! the queue waits for a manual [`flush_updates`].

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicU64, Ordering};
use std::collections::BTreeMap;
use std::rc::Rc;

use indexmap::IndexSet;

/// Upper bound on callback runs inside a single flush.
///
/// A watcher that keeps mutating its own source would otherwise loop forever.
const MAX_FLUSH_RUNS: usize = 10_000;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
	static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

/// Unique identifier of a signal or watcher node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
	/// Allocates a fresh, process-unique identifier.
	pub fn new() -> Self {
		Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
	}

	/// Returns the raw identifier.
	pub fn as_u64(self) -> u64 {
		self.0
	}
}

impl Default for NodeId {
	fn default() -> Self {
		Self::new()
	}
}

/// When queued watchers are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushMode {
	/// Watchers wait for an explicit [`flush_updates`] call.
	#[default]
	Batched,
	/// Watchers run as soon as the triggering mutation completes.
	Sync,
}

pub(crate) type WatchFn = Rc<RefCell<dyn FnMut()>>;

/// Task handed to a scheduler. Running it flushes the queue.
pub type ScheduledTask = Box<dyn FnOnce()>;

/// Type for the per-thread flush scheduler
type SchedulerFn = Rc<dyn Fn(ScheduledTask)>;

/// A registered watcher.
pub(crate) struct WatcherEntry {
	/// Signal this watcher observes.
	pub(crate) source: NodeId,
	/// Callback run on flush.
	pub(crate) callback: WatchFn,
	/// Gate shared with the [`PausableWatch`](crate::PausableWatch) handle.
	pub(crate) active: Rc<Cell<bool>>,
}

/// Thread-local reactive runtime.
pub struct Runtime {
	/// Watchers subscribed to each signal.
	subscribers: BTreeMap<NodeId, Vec<NodeId>>,
	/// Registered watchers by id.
	watchers: BTreeMap<NodeId, WatcherEntry>,
	/// Watchers waiting for the next flush, in scheduling order.
	pending: IndexSet<NodeId>,
	/// Nesting depth of [`batch`] calls.
	batch_depth: usize,
	/// Whether a flush is in progress on this thread.
	flushing: bool,
	/// Whether a flush task is waiting in the scheduler.
	update_scheduled: bool,
	scheduler: Option<SchedulerFn>,
	flush_mode: FlushMode,
}

impl Default for Runtime {
	fn default() -> Self {
		Self::new()
	}
}

impl Runtime {
	/// Creates an empty runtime.
	pub fn new() -> Self {
		Self {
			subscribers: BTreeMap::new(),
			watchers: BTreeMap::new(),
			pending: IndexSet::new(),
			batch_depth: 0,
			flushing: false,
			update_scheduled: false,
			scheduler: None,
			flush_mode: FlushMode::default(),
		}
	}

	/// Records that `source` changed and queues every active watcher on it.
	///
	/// Returns `true` when the caller should flush right away, which only
	/// happens in [`FlushMode::Sync`] outside of a batch or running flush.
	pub fn notify_signal_change(&mut self, source: NodeId) -> bool {
		let Some(watcher_ids) = self.subscribers.get(&source) else {
			return false;
		};

		let mut queued = false;
		for id in watcher_ids {
			let Some(entry) = self.watchers.get(id) else {
				continue;
			};
			if entry.active.get() {
				queued |= self.pending.insert(*id);
			}
		}

		if queued {
			tracing::trace!(source = source.as_u64(), pending = self.pending.len(), "watchers queued");
		}

		queued && self.flush_mode == FlushMode::Sync && self.batch_depth == 0 && !self.flushing
	}

	/// Returns whether any watcher is waiting for a flush.
	pub fn has_pending_updates(&self) -> bool {
		!self.pending.is_empty()
	}

	/// Returns the number of queued watchers.
	pub fn pending_count(&self) -> usize {
		self.pending.len()
	}

	/// Returns the number of registered watchers.
	pub fn watcher_count(&self) -> usize {
		self.watchers.len()
	}

	/// Returns the number of watchers observing `source`.
	pub fn subscriber_count(&self, source: NodeId) -> usize {
		self.subscribers.get(&source).map_or(0, Vec::len)
	}

	/// Returns the current flush mode.
	pub fn flush_mode(&self) -> FlushMode {
		self.flush_mode
	}

	/// Returns whether a flush task is waiting in the scheduler.
	pub fn is_update_scheduled(&self) -> bool {
		self.update_scheduled
	}

	/// Returns whether a scheduler is installed on this thread.
	pub fn has_scheduler(&self) -> bool {
		self.scheduler.is_some()
	}

	/// Drops the subscription list of a signal that no longer exists.
	pub fn remove_node(&mut self, source: NodeId) {
		self.subscribers.remove(&source);
	}

	pub(crate) fn register_watcher(&mut self, id: NodeId, entry: WatcherEntry) {
		self.subscribers.entry(entry.source).or_default().push(id);
		self.watchers.insert(id, entry);
	}

	/// Unregisters a watcher and hands its entry back.
	///
	/// The entry is returned instead of dropped so that the callback (and any
	/// signal it captured) is released after the runtime borrow ends.
	pub(crate) fn remove_watcher(&mut self, id: NodeId) -> Option<WatcherEntry> {
		let entry = self.watchers.remove(&id)?;
		self.pending.shift_remove(&id);
		if let Some(ids) = self.subscribers.get_mut(&entry.source) {
			ids.retain(|watcher| *watcher != id);
			if ids.is_empty() {
				self.subscribers.remove(&entry.source);
			}
		}
		Some(entry)
	}

	/// Marks a flush as scheduled and returns the scheduler to hand it to.
	///
	/// Returns `None` when nothing is queued, a flush task is already
	/// outstanding, a batch or flush will drain the queue anyway, or no
	/// scheduler is installed.
	fn claim_scheduled_flush(&mut self) -> Option<SchedulerFn> {
		if self.pending.is_empty() || self.update_scheduled || self.batch_depth > 0 || self.flushing {
			return None;
		}
		let scheduler = Rc::clone(self.scheduler.as_ref()?);
		self.update_scheduled = true;
		Some(scheduler)
	}

	/// Pops the next queued watcher that is still active.
	fn next_pending(&mut self) -> Option<WatchFn> {
		while let Some(id) = self.pending.shift_remove_index(0) {
			match self.watchers.get(&id) {
				Some(entry) if entry.active.get() => return Some(Rc::clone(&entry.callback)),
				_ => continue,
			}
		}
		None
	}
}

/// Runs `f` with mutable access to this thread's runtime.
///
/// # Panics
///
/// Panics if called re-entrantly from inside another `with_runtime` closure.
pub fn with_runtime<F, R>(f: F) -> R
where
	F: FnOnce(&mut Runtime) -> R,
{
	RUNTIME.with(|rt| f(&mut rt.borrow_mut()))
}

/// Like [`with_runtime`], but returns `None` instead of panicking when the
/// runtime is already borrowed or being torn down.
pub fn try_with_runtime<F, R>(f: F) -> Option<R>
where
	F: FnOnce(&mut Runtime) -> R,
{
	RUNTIME
		.try_with(|rt| rt.try_borrow_mut().ok().map(|mut rt| f(&mut rt)))
		.ok()
		.flatten()
}

/// Returns this thread's flush mode.
pub fn flush_mode() -> FlushMode {
	with_runtime(|rt| rt.flush_mode)
}

/// Sets this thread's flush mode.
pub fn set_flush_mode(mode: FlushMode) {
	with_runtime(|rt| rt.flush_mode = mode);
}

/// Installs the scheduler that receives flush tasks on this thread.
///
/// Replaces any scheduler installed before. The scheduler is called outside
/// the runtime borrow, so it may run the task right away.
///
/// # Example
///
/// ```ignore
/// // In WASM environment
/// reinhardt_reactive::set_scheduler(|task| {
///     wasm_bindgen_futures::spawn_local(async move { task() });
/// });
/// ```
pub fn set_scheduler<F>(scheduler: F)
where
	F: Fn(ScheduledTask) + 'static,
{
	with_runtime(|rt| rt.scheduler = Some(Rc::new(scheduler)));
}

/// Removes this thread's scheduler. Queued updates then wait for a manual
/// [`flush_updates`].
pub fn clear_scheduler() {
	with_runtime(|rt| {
		rt.scheduler = None;
		rt.update_scheduled = false;
	});
}

/// Returns whether a scheduler is installed on this thread.
pub fn has_scheduler() -> bool {
	with_runtime(|rt| rt.has_scheduler())
}

/// Schedules flushes as browser microtasks via `spawn_local`.
///
/// Does nothing if a scheduler is already installed.
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub fn install_browser_scheduler() {
	if has_scheduler() {
		return;
	}
	set_scheduler(|task| {
		wasm_bindgen_futures::spawn_local(async move { task() });
	});
	tracing::debug!("browser flush scheduler installed");
}

/// Notifies the runtime of a change to `source`, flushing if the mode asks
/// for it or handing a flush task to the scheduler.
pub(crate) fn notify(source: NodeId) {
	if with_runtime(|rt| rt.notify_signal_change(source)) {
		flush_updates();
	} else if let Some(scheduler) = with_runtime(Runtime::claim_scheduled_flush) {
		tracing::trace!(source = source.as_u64(), "flush scheduled");
		scheduler(Box::new(flush_updates));
	}
}

/// Resets the `flushing` flag even if a callback panics.
struct FlushGuard;

impl Drop for FlushGuard {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| rt.flushing = false);
	}
}

/// Runs every queued watcher once.
///
/// Watchers queued by callbacks during the flush run in the same flush.
/// Calling this from inside a watcher callback is a no-op.
pub fn flush_updates() {
	let started = with_runtime(|rt| {
		if rt.flushing {
			false
		} else {
			rt.flushing = true;
			rt.update_scheduled = false;
			true
		}
	});
	if !started {
		return;
	}
	let _guard = FlushGuard;

	let mut runs = 0usize;
	while let Some(callback) = with_runtime(Runtime::next_pending) {
		runs += 1;
		if runs > MAX_FLUSH_RUNS {
			let dropped = with_runtime(|rt| {
				let count = rt.pending.len();
				rt.pending.clear();
				count
			});
			tracing::warn!(runs, dropped, "flush aborted: watchers keep re-triggering each other");
			break;
		}
		let mut f = callback.borrow_mut();
		(&mut *f)();
	}
}

/// Decrements the batch depth even if the batched closure panics.
struct BatchGuard;

impl Drop for BatchGuard {
	fn drop(&mut self) {
		let _ = try_with_runtime(|rt| rt.batch_depth -= 1);
	}
}

/// Runs `f` with automatic flushing suppressed, then flushes once.
///
/// # Example
///
/// ```ignore
/// batch(|| {
///     page.set(2);
///     search.set("rust".to_string());
/// }); // watchers of both signals run here, once each
/// ```
pub fn batch<F, R>(f: F) -> R
where
	F: FnOnce() -> R,
{
	with_runtime(|rt| rt.batch_depth += 1);
	let result = {
		let _guard = BatchGuard;
		f()
	};
	if with_runtime(|rt| rt.batch_depth == 0) {
		flush_updates();
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Signal, watch_pausable};
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	fn test_node_ids_are_unique() {
		let a = NodeId::new();
		let b = NodeId::new();
		assert_ne!(a, b);
		assert!(b.as_u64() > a.as_u64());
	}

	#[rstest]
	fn test_notify_without_subscribers_is_noop() {
		let id = NodeId::new();
		let flush_now = with_runtime(|rt| rt.notify_signal_change(id));
		assert!(!flush_now);
		assert_eq!(with_runtime(|rt| rt.subscriber_count(id)), 0);
	}

	#[rstest]
	fn test_pending_is_deduplicated() {
		let signal = Signal::new(0);
		let runs = Rc::new(Cell::new(0));
		let _watch = watch_pausable(&signal, {
			let runs = Rc::clone(&runs);
			move || runs.set(runs.get() + 1)
		});

		signal.set(1);
		signal.set(2);
		signal.set(3);
		assert_eq!(with_runtime(|rt| rt.pending_count()), 1);

		flush_updates();
		assert_eq!(runs.get(), 1);
		assert!(!with_runtime(|rt| rt.has_pending_updates()));
	}

	#[rstest]
	fn test_batch_flushes_once_at_end() {
		let signal = Signal::new(0);
		let runs = Rc::new(Cell::new(0));
		let _watch = watch_pausable(&signal, {
			let runs = Rc::clone(&runs);
			move || runs.set(runs.get() + 1)
		});

		let value = batch(|| {
			signal.set(1);
			batch(|| signal.set(2));
			assert_eq!(runs.get(), 0);
			signal.get()
		});

		assert_eq!(value, 2);
		assert_eq!(runs.get(), 1);
	}

	#[rstest]
	#[serial]
	fn test_sync_mode_runs_immediately() {
		set_flush_mode(FlushMode::Sync);
		let signal = Signal::new(0);
		let runs = Rc::new(Cell::new(0));
		let _watch = watch_pausable(&signal, {
			let runs = Rc::clone(&runs);
			move || runs.set(runs.get() + 1)
		});

		signal.set(1);
		signal.set(2);
		let after_sets = runs.get();
		set_flush_mode(FlushMode::Batched);

		assert_eq!(after_sets, 2);
	}

	#[rstest]
	fn test_watcher_chain_runs_in_same_flush() {
		let first = Signal::new(0);
		let second = Signal::new(0);
		let seen = Rc::new(Cell::new(0));

		let _forward = watch_pausable(&first, {
			let first = first.clone();
			let second = second.clone();
			move || second.set(first.get() * 10)
		});
		let _observe = watch_pausable(&second, {
			let second = second.clone();
			let seen = Rc::clone(&seen);
			move || seen.set(second.get())
		});

		first.set(4);
		flush_updates();

		assert_eq!(seen.get(), 40);
	}

	#[rstest]
	fn test_runaway_watcher_is_cut_off() {
		let signal = Signal::new(0u64);
		let _watch = watch_pausable(&signal, {
			let signal = signal.clone();
			move || signal.update(|n| *n += 1)
		});

		signal.set(1);
		flush_updates();

		assert!(signal.get() > MAX_FLUSH_RUNS as u64);
		assert!(!with_runtime(|rt| rt.has_pending_updates()));
	}

	fn recording_scheduler() -> Rc<RefCell<Vec<ScheduledTask>>> {
		let tasks: Rc<RefCell<Vec<ScheduledTask>>> = Rc::new(RefCell::new(Vec::new()));
		set_scheduler({
			let tasks = Rc::clone(&tasks);
			move |task| tasks.borrow_mut().push(task)
		});
		tasks
	}

	fn run_tasks(tasks: &Rc<RefCell<Vec<ScheduledTask>>>) {
		let drained: Vec<ScheduledTask> = tasks.borrow_mut().drain(..).collect();
		for task in drained {
			task();
		}
	}

	#[rstest]
	fn test_scheduler_receives_one_task_per_dirty_cycle() {
		let tasks = recording_scheduler();
		let signal = Signal::new(0);
		let runs = Rc::new(Cell::new(0));
		let _watch = watch_pausable(&signal, {
			let runs = Rc::clone(&runs);
			move || runs.set(runs.get() + 1)
		});

		signal.set(1);
		signal.set(2);
		assert_eq!(tasks.borrow().len(), 1);
		assert!(with_runtime(|rt| rt.is_update_scheduled()));
		assert_eq!(runs.get(), 0);

		run_tasks(&tasks);
		assert_eq!(runs.get(), 1);
		assert!(!with_runtime(|rt| rt.is_update_scheduled()));

		signal.set(3);
		assert_eq!(tasks.borrow().len(), 1);
		run_tasks(&tasks);
		assert_eq!(runs.get(), 2);
		clear_scheduler();
	}

	#[rstest]
	fn test_scheduler_not_called_without_active_watchers() {
		let tasks = recording_scheduler();
		let signal = Signal::new(0);
		let watch = watch_pausable(&signal, || {});

		watch.pause();
		signal.set(1);
		let unwatched = Signal::new(0);
		unwatched.set(1);

		assert!(tasks.borrow().is_empty());
		clear_scheduler();
	}

	#[rstest]
	fn test_batch_does_not_schedule() {
		let tasks = recording_scheduler();
		let signal = Signal::new(0);
		let runs = Rc::new(Cell::new(0));
		let _watch = watch_pausable(&signal, {
			let runs = Rc::clone(&runs);
			move || runs.set(runs.get() + 1)
		});

		batch(|| {
			signal.set(1);
			signal.set(2);
		});

		assert!(tasks.borrow().is_empty());
		assert_eq!(runs.get(), 1);
		clear_scheduler();
	}

	#[rstest]
	fn test_immediate_scheduler_flushes_on_mutation() {
		set_scheduler(|task| task());
		let signal = Signal::new(0);
		let runs = Rc::new(Cell::new(0));
		let _watch = watch_pausable(&signal, {
			let runs = Rc::clone(&runs);
			move || runs.set(runs.get() + 1)
		});

		signal.set(1);
		signal.set(2);

		assert_eq!(runs.get(), 2);
		assert!(has_scheduler());
		clear_scheduler();
		assert!(!has_scheduler());
	}

	#[rstest]
	fn test_manual_flush_leaves_stale_task_harmless() {
		let tasks = recording_scheduler();
		let signal = Signal::new(0);
		let runs = Rc::new(Cell::new(0));
		let _watch = watch_pausable(&signal, {
			let runs = Rc::clone(&runs);
			move || runs.set(runs.get() + 1)
		});

		signal.set(1);
		flush_updates();
		run_tasks(&tasks);

		assert_eq!(runs.get(), 1);
		clear_scheduler();
	}
}
