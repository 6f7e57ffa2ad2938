//! Shared building blocks for the PostgreSQL manager client and services.
//!
//! - `models`: wire entities (servers, containers, databases, dump options)
//! - `response`: list envelopes and error bodies exchanged over HTTP
//! - `errors`: the error taxonomy used on both sides of the wire
//! - `config`: environment-driven configuration
//! - `middleware`: axum middleware shared by services
//! - `utils`: id and filename helpers

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod response;
pub mod utils;

pub use errors::{AppError, AppResult, ErrorKind};
