//! Utility functions shared by the binary and the library.
//!
//! ## Modules
//!
//! - [`app_data`] - Application data directory and JSON configuration
//! - [`progress`] - Spinner that compiles away without the `progress` feature
//! - [`units`] - Byte sizes with units (`10MB`) in both directions

pub mod app_data;
pub mod progress;
pub mod units;

pub use app_data::*;
pub use units::*;
