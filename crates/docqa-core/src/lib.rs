//! Shared building blocks for the docqa workspace: configuration, the error
//! type, domain types, provider traits, corpus loading and chunking.

pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
