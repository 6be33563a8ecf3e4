//! CLI module for silabo-rag
//!
//! Argument parsing, the interactive question prompt and terminal output.

pub mod args;
pub mod display;
pub mod input;

pub use args::{Args, Commands, Verbosity};
pub use input::{ChatInput, InputHandler};
