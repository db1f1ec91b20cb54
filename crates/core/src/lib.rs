//! Core business logic for tidepool.

pub mod services;

pub use services::*;
