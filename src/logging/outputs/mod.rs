//! Output handlers for the logging destinations
//!
//! - Console output (with colors)
//! - File output (the diagnostics destination)

pub mod console;
pub mod file;

pub use console::ConsoleOutput;
pub use file::FileOutput;
