//! Core business logic module
//!
//! This module contains the pipeline steps: playlist link extraction, audio
//! downloading, container conversion, tag editing, and the interactive
//! orchestrator that chains them.

pub mod config;
pub mod downloader;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod tagger;
pub mod transcoder;


// Re-export commonly used types
pub use config::AppConfig;
pub use models::{AppError, AppResult};
