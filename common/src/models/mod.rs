//! Shared data models for the client and the services.

pub mod container;
pub mod database;
pub mod dump;
pub mod server;

// Re-export commonly used types
pub use container::{Container, ContainerStatus};
pub use database::Database;
pub use dump::{DumpKind, DumpOptions, DumpQuery};
pub use server::{Server, ServerStatus};
