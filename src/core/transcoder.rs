//! Container conversion
//!
//! Two interchangeable transcoding strategies behind the [`Transcode`] trait,
//! plus the batch driver that applies a strategy to every matching file in a
//! directory. All codec work is delegated to ffmpeg with fixed parameters;
//! this module only derives destination names, isolates per-file failures,
//! and reports a found/converted summary.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::core::config::AppConfig;
use crate::core::models::{AppError, AppResult};
use crate::utils::process::run_tool_checked;

/// Summary of one directory conversion pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranscodeSummary {
    /// Files matching the source extension
    pub found: usize,

    /// Files successfully converted
    pub converted: usize,
}

/// A fixed-parameter conversion from one container/codec to another.
#[async_trait]
pub trait Transcode: Send + Sync {
    /// Short description for logs, e.g. "webm -> mp4".
    fn describe(&self) -> &'static str;

    async fn transcode(&self, input: &Path, output: &Path) -> AppResult<()>;
}

/// WEBM to MP4 conversion (H.264 video, AAC audio).
pub struct VideoConverter {
    ffmpeg: PathBuf,
}

impl VideoConverter {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_bin.clone(),
        }
    }
}

#[async_trait]
impl Transcode for VideoConverter {
    fn describe(&self) -> &'static str {
        "webm -> mp4 (libx264/aac)"
    }

    async fn transcode(&self, input: &Path, output: &Path) -> AppResult<()> {
        let args: Vec<&OsStr> = vec![
            "-i".as_ref(),
            input.as_os_str(),
            "-codec:v".as_ref(),
            "libx264".as_ref(),
            "-codec:a".as_ref(),
            "aac".as_ref(),
            "-strict".as_ref(),
            "experimental".as_ref(),
            "-y".as_ref(),
            output.as_os_str(),
        ];
        run_tool_checked(&self.ffmpeg, args).await?;
        Ok(())
    }
}

/// MP4 to M4A audio extraction (drops video streams, AAC audio).
pub struct AudioExtractor {
    ffmpeg: PathBuf,
}

impl AudioExtractor {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            ffmpeg: config.ffmpeg_bin.clone(),
        }
    }
}

#[async_trait]
impl Transcode for AudioExtractor {
    fn describe(&self) -> &'static str {
        "mp4 -> m4a (aac)"
    }

    async fn transcode(&self, input: &Path, output: &Path) -> AppResult<()> {
        let args: Vec<&OsStr> = vec![
            "-i".as_ref(),
            input.as_os_str(),
            "-vn".as_ref(),
            "-codec:a".as_ref(),
            "aac".as_ref(),
            "-y".as_ref(),
            output.as_os_str(),
        ];
        run_tool_checked(&self.ffmpeg, args).await?;
        Ok(())
    }
}

/// Case-insensitive extension match.
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Snapshot of the files in `dir` (non-recursive) matching `extension`,
/// sorted by name for a stable processing order.
fn matching_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extension))
        .collect()
}

/// Convert every `source_ext` file in `dir` with `strategy`, writing a
/// sibling file with `target_ext`. On success the source is deleted when
/// `delete_sources` is set. Per-file failures are logged and the scan
/// continues; the summary is always produced.
pub async fn convert_directory(
    dir: &Path,
    strategy: &dyn Transcode,
    source_ext: &str,
    target_ext: &str,
    delete_sources: bool,
) -> AppResult<TranscodeSummary> {
    let files = matching_files(dir, source_ext);

    let mut summary = TranscodeSummary {
        found: files.len(),
        converted: 0,
    };

    for input in &files {
        let output = input.with_extension(target_ext);
        info!("Converting {:?} -> {:?} [{}]", input, output, strategy.describe());

        match strategy.transcode(input, &output).await {
            Ok(()) => {
                summary.converted += 1;

                if delete_sources {
                    match tokio::fs::remove_file(input).await {
                        Ok(()) => info!("Deleted original file: {:?}", input),
                        Err(e) => warn!("Could not delete {:?}: {}", input, e),
                    }
                }
            }
            Err(AppError::ToolMissing { tool }) => {
                error!(
                    "{} not found. Make sure it is installed and on your PATH.",
                    tool
                );
            }
            Err(AppError::ToolFailed {
                tool,
                code,
                stdout,
                stderr,
            }) => {
                warn!(
                    "Error converting {:?}: {} failed (code {:?})",
                    input, tool, code
                );
                warn!("  stdout: {}", stdout);
                warn!("  stderr: {}", stderr);
            }
            Err(e) => {
                warn!("Unexpected error converting {:?}: {}", input, e);
            }
        }
    }

    info!(
        "Conversion pass complete [{}]: {} files found, {} converted",
        strategy.describe(),
        summary.found,
        summary.converted
    );

    Ok(summary)
}

/// Convert all WEBM files in `dir` to MP4.
pub async fn convert_webm_to_mp4(
    config: &AppConfig,
    dir: &Path,
    delete_sources: bool,
) -> AppResult<TranscodeSummary> {
    let strategy = VideoConverter::new(config);
    convert_directory(dir, &strategy, "webm", "mp4", delete_sources).await
}

/// Extract M4A audio from all MP4 files in `dir`.
pub async fn extract_mp4_audio(
    config: &AppConfig,
    dir: &Path,
    delete_sources: bool,
) -> AppResult<TranscodeSummary> {
    let strategy = AudioExtractor::new(config);
    convert_directory(dir, &strategy, "mp4", "m4a", delete_sources).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_extension_case_insensitive() {
        assert!(has_extension(Path::new("clip.WEBM"), "webm"));
        assert!(has_extension(Path::new("clip.webm"), "webm"));
        assert!(!has_extension(Path::new("clip.mp4"), "webm"));
        assert!(!has_extension(Path::new("webm"), "webm"));
    }

    #[test]
    fn test_matching_files_skips_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.webm"), b"x").unwrap();
        std::fs::write(dir.path().join("a.webm"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::create_dir(dir.path().join("sub.webm")).unwrap();

        let files = matching_files(dir.path(), "webm");
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.webm", "b.webm"]);
    }

    #[test]
    fn test_destination_swaps_extension() {
        let input = Path::new("video1.webm");
        assert_eq!(input.with_extension("mp4"), PathBuf::from("video1.mp4"));
    }
}
