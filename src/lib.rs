//! tube2mp3 - Core Library
//!
//! This library provides the core functionality for the YouTube-to-MP3
//! pipeline: playlist link extraction, audio downloading and transcoding,
//! container conversion, and batch tag editing.

pub mod core;
pub mod utils;

// Re-export commonly used types
pub use core::{
    config::AppConfig,
    downloader::{download_batch, download_single, BatchSummary},
    extractor::extract_playlist_links,
    models::{AppError, AppResult, TagFields},
    pipeline::{run_menu, run_playlist_flow, run_single_flow},
    tagger::{tag_directory, TagSummary},
    transcoder::{
        convert_directory, convert_webm_to_mp4, extract_mp4_audio, AudioExtractor, Transcode,
        TranscodeSummary, VideoConverter,
    },
};
