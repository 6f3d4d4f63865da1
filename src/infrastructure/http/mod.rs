//! REST transport for the paged fetch contract

pub mod auth;
pub mod client;

pub use auth::StaticToken;
pub use client::{ApiClient, ResourceSource};
