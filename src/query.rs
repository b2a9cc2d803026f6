//! URL query-string state.
//!
//! See [`UseQuery`] for the manager and [`UseQueryOptions`] for its
//! configuration.

// Re-export all reinhardt-query-state functionality
pub use reinhardt_query_state::*;
