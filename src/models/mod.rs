//! Defines the data structures and models used throughout the application.
//!
//! This includes the tracked climate variables, daily observations as loaded
//! from the input file, monthly aggregates, and the result types shown to the user.

mod climate;

pub use climate::*;
