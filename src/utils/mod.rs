//! Utility modules and helper functions
//!
//! This module contains shared utilities and helper functions used across the application.

pub mod logging;
pub mod process;

// Re-export commonly used utilities
pub use logging::*;
pub use process::*;
