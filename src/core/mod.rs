//! Core types and error handling shared across the updater.

pub mod error;

pub use error::{ErrorContext, UpdaterError, user_friendly_error};
