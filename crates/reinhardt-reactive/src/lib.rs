//! # Reinhardt Reactive
//!
//! A small observer/subject runtime used by Reinhardt frontends to react to
//! state changes without a host UI framework.
//!
//! ## Building Blocks
//!
//! - [`Signal`]: a shared value holder that notifies the runtime on mutation.
//! - [`watch_pausable`]: registers a callback on a signal, returning a
//!   [`PausableWatch`] handle whose gate can be paused and resumed.
//! - [`flush_updates`]: runs every queued watcher exactly once. Several
//!   synchronous mutations before a flush coalesce into one run.
//! - [`batch`]: groups mutations and flushes once at the end.
//! - [`set_scheduler`]: hands one flush task per dirty cycle to an event
//!   loop, so queued watchers run without a manual flush.
//!
//! ## Example
//!
//! ```ignore
//! use reinhardt_reactive::{Signal, flush_updates, watch_pausable};
//!
//! let count = Signal::new(0);
//! let watch = watch_pausable(&count, || println!("count changed"));
//!
//! count.set(1);
//! count.set(2);
//! flush_updates(); // prints once
//!
//! watch.pause();
//! count.set(3);
//! watch.resume();
//! flush_updates(); // prints nothing
//! ```
//!
//! The runtime is thread-local: signals and watchers are `!Send` and belong
//! to the thread that created them.

pub mod runtime;
pub mod signal;
pub mod watch;

pub use runtime::{
	FlushMode, NodeId, Runtime, ScheduledTask, batch, clear_scheduler, flush_mode, flush_updates,
	has_scheduler, set_flush_mode, set_scheduler, try_with_runtime, with_runtime,
};
#[cfg(all(target_family = "wasm", target_os = "unknown"))]
pub use runtime::install_browser_scheduler;
pub use signal::Signal;
pub use watch::{PausableWatch, watch_pausable};
