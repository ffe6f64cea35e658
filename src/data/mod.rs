//! Reading daily climate records from disk.
//!
//! Includes:
//! - `loader`: spreadsheet/CSV parsing and normalization into a `Dataset`.
//! - `cache`: the `ObservationSource` seam and its load-once memoizing wrapper.

mod cache;
mod loader;

pub use cache::*;
