//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes defining commands and parsing arguments, handling user interaction
//! (prompts, menus), and rendering pipeline results to the terminal.

mod commands;
pub mod prompts;
pub mod render;

pub use commands::*;
