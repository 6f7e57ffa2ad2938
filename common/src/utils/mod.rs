//! Utility functions and helpers.

pub mod filename;
pub mod id_generator;

// Re-export commonly used types
pub use filename::{custom_dump_filename, dump_filename, sanitize_component};
pub use id_generator::IdGenerator;
