//! Unique ID generator.

use uuid::Uuid;

/// Generates unique identifiers.
pub struct IdGenerator;

impl IdGenerator {
    /// Generates a unique request ID for the `x-request-id` header.
    pub fn request_id() -> String {
        Uuid::new_v4().to_string()
    }
}
