//! Fine-grained reactivity: signals, pausable watchers and the flush queue.
//!
//! ## Example
//!
//! ```rust,ignore
//! use reinhardt_url_state::reactive::{Signal, flush_updates, watch_pausable};
//!
//! let count = Signal::new(0);
//! let watch = watch_pausable(&count, || println!("count changed"));
//!
//! count.set(1);
//! flush_updates(); // prints once
//!
//! watch.pause();
//! count.set(2);
//! flush_updates(); // prints nothing
//! ```

// Re-export all reinhardt-reactive functionality
pub use reinhardt_reactive::*;
