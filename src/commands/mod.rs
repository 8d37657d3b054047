//! CLI command implementations.
//!
//! Commands orchestrate the library components to perform user tasks.

pub mod demo;
pub mod utils;

// Re-export main command functions
pub use demo::{execute_demo, validate_args, DemoArgs};
pub use utils::{display_format, display_version, validate_trace_file};
