//! Playlist link extraction
//!
//! Resolves a playlist locator to the ordered list of video URLs it contains
//! (delegated to yt-dlp) and writes them one per line to a links file,
//! overwriting any previous content.

use std::path::Path;

use tracing::info;

use crate::core::config::AppConfig;
use crate::core::models::{AppError, AppResult};
use crate::utils::process::run_tool;

/// Resolve a playlist locator to its item URLs, in playlist order.
pub async fn resolve_playlist(config: &AppConfig, playlist_url: &str) -> AppResult<Vec<String>> {
    let output = run_tool(
        &config.ytdlp_bin,
        ["--flat-playlist", "--print", "url", playlist_url],
    )
    .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Resolve(format!(
            "{}: {}",
            playlist_url,
            stderr.lines().last().unwrap_or("unknown resolution failure")
        )));
    }

    let urls: Vec<String> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        return Err(AppError::Resolve(format!(
            "{}: playlist resolved to no items",
            playlist_url
        )));
    }

    Ok(urls)
}

/// Extract every video URL from `playlist_url` and write them to
/// `output_file`, one per line. Returns the number of links written.
pub async fn extract_playlist_links(
    config: &AppConfig,
    playlist_url: &str,
    output_file: &Path,
) -> AppResult<usize> {
    let urls = resolve_playlist(config, playlist_url).await?;

    let mut content = urls.join("\n");
    content.push('\n');
    tokio::fs::write(output_file, content).await?;

    info!(
        "Extracted {} video links from playlist and saved to {:?}",
        urls.len(),
        output_file
    );

    Ok(urls.len())
}
