//! Audio downloading and MP3 transcoding
//!
//! For each video URL: probe the title, retrieve the best available audio
//! stream to a temporary file while reporting download progress, transcode
//! the result to MP3 at the configured bitrate, and delete the intermediate
//! on success. Batch mode applies the same steps to every line of a links
//! file; a failing item never aborts the batch.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::core::config::AppConfig;
use crate::core::models::{AppError, AppResult};
use crate::utils::process::{run_tool, run_tool_checked, tool_name};

/// Outcome of a batch download run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchSummary {
    /// Number of non-blank links read from the links file
    pub total: usize,

    /// Number of links that made it all the way to an MP3 file
    pub succeeded: usize,
}

/// Split links-file content into locators: lines are trimmed, blank lines
/// are dropped, duplicates and order are preserved.
pub fn parse_links(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read and parse a links file.
pub async fn read_links_file(path: &Path) -> AppResult<Vec<String>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(parse_links(&content))
}

/// One parsed yt-dlp progress line: percent complete and total size in bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub percent: f64,
    pub total_bytes: u64,
}

impl Progress {
    pub fn downloaded_bytes(&self) -> u64 {
        (self.percent / 100.0 * self.total_bytes as f64) as u64
    }
}

fn progress_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[download\]\s+([0-9.]+)% of ~?\s*([0-9.]+)(B|KiB|MiB|GiB|TiB)")
            .expect("progress regex is valid")
    })
}

/// Parse a `--newline --progress` output line from yt-dlp.
pub fn parse_progress(line: &str) -> Option<Progress> {
    let captures = progress_regex().captures(line.trim_start())?;

    let percent: f64 = captures[1].parse().ok()?;
    let size: f64 = captures[2].parse().ok()?;
    let multiplier: f64 = match &captures[3] {
        "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        _ => 1024.0 * 1024.0 * 1024.0 * 1024.0,
    };

    Some(Progress {
        percent,
        total_bytes: (size * multiplier) as u64,
    })
}

/// Probe the item's title. Failure means the metadata is unavailable and the
/// item should be skipped.
async fn probe_title(config: &AppConfig, url: &str) -> AppResult<String> {
    let output = run_tool(
        &config.ytdlp_bin,
        ["--no-playlist", "--print", "%(title)s", url],
    )
    .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::Metadata(format!(
            "{}: {}",
            url,
            stderr.lines().last().unwrap_or("no video information")
        )));
    }

    let title = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if title.is_empty() {
        return Err(AppError::Metadata(format!("{}: empty title", url)));
    }

    Ok(title)
}

/// Ask yt-dlp which path the download below will produce for `template`,
/// without downloading anything.
async fn predict_download_path(
    config: &AppConfig,
    url: &str,
    template: &str,
) -> AppResult<PathBuf> {
    let output = run_tool_checked(
        &config.ytdlp_bin,
        [
            "--no-playlist",
            "-f",
            "bestaudio/best",
            "--print",
            "filename",
            "-o",
            template,
            url,
        ],
    )
    .await?;

    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if path.is_empty() {
        return Err(AppError::Download(format!(
            "{}: could not determine output filename",
            url
        )));
    }

    Ok(PathBuf::from(path))
}

/// Retrieve the best available audio stream, logging byte-level progress as
/// yt-dlp reports it.
async fn fetch_audio(config: &AppConfig, url: &str, template: &str, title: &str) -> AppResult<()> {
    let mut child = Command::new(&config.ytdlp_bin)
        .args([
            "--no-playlist",
            "-f",
            "bestaudio/best",
            "--newline",
            "--progress",
            "-o",
            template,
            url,
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AppError::ToolMissing {
                tool: tool_name(&config.ytdlp_bin),
            },
            _ => AppError::Io(e),
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::Download(format!("{}: stdout pipe unavailable", url)))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::Download(format!("{}: stderr pipe unavailable", url)))?;

    // Drain stderr concurrently so a chatty child cannot deadlock on a full
    // pipe while we read stdout.
    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut collected = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            collected.push(line);
        }
        collected
    });

    let mut lines = BufReader::new(stdout).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                // A broken output pipe must not leave the child running.
                let _ = child.kill().await;
                return Err(e.into());
            }
        };

        if let Some(progress) = parse_progress(&line) {
            info!(
                "Downloading {}: {:.1}% of {} bytes ({} bytes done)",
                title,
                progress.percent,
                progress.total_bytes,
                progress.downloaded_bytes()
            );
        } else {
            debug!("{}", line);
        }
    }

    let status = child.wait().await?;
    let stderr_lines = stderr_task.await.unwrap_or_default();

    if !status.success() {
        return Err(AppError::Download(format!(
            "{}: {}",
            url,
            stderr_lines.last().map(String::as_str).unwrap_or("download failed")
        )));
    }

    Ok(())
}

/// Transcode a downloaded audio file to MP3 at the configured bitrate.
async fn transcode_to_mp3(config: &AppConfig, input: &Path, output: &Path) -> AppResult<()> {
    let args: Vec<&std::ffi::OsStr> = vec![
        "-i".as_ref(),
        input.as_os_str(),
        "-vn".as_ref(),
        "-codec:a".as_ref(),
        "libmp3lame".as_ref(),
        "-b:a".as_ref(),
        config.mp3_bitrate.as_ref(),
        "-y".as_ref(),
        output.as_os_str(),
    ];
    run_tool_checked(&config.ffmpeg_bin, args).await?;

    Ok(())
}

/// Download one video as MP3. Returns the path of the final MP3 file.
pub async fn download_single(config: &AppConfig, url: &str, dir: &Path) -> AppResult<PathBuf> {
    let title = probe_title(config, url).await?;
    info!("Downloading audio for video: {}", title);

    tokio::fs::create_dir_all(dir).await?;

    let template = dir.join("%(title)s.%(ext)s").to_string_lossy().into_owned();
    let temp_path = predict_download_path(config, url, &template).await?;

    fetch_audio(config, url, &template, &title).await?;
    info!("Downloaded audio file: {:?}", temp_path);

    let mp3_path = temp_path.with_extension("mp3");
    if mp3_path == temp_path {
        // Source stream was already MP3, nothing to transcode.
        return Ok(mp3_path);
    }

    transcode_to_mp3(config, &temp_path, &mp3_path).await?;
    info!("Converted to MP3: {:?}", mp3_path);

    tokio::fs::remove_file(&temp_path).await?;
    debug!("Deleted original audio file: {:?}", temp_path);

    Ok(mp3_path)
}

/// Download every link in `links_file` as MP3 into `dir`. Per-item failures
/// are logged and the batch continues.
pub async fn download_batch(
    config: &AppConfig,
    links_file: &Path,
    dir: &Path,
) -> AppResult<BatchSummary> {
    let links = read_links_file(links_file).await?;
    info!(
        "Found {} video links in {:?}, starting downloads",
        links.len(),
        links_file
    );

    let mut summary = BatchSummary {
        total: links.len(),
        succeeded: 0,
    };

    for url in &links {
        info!("Processing URL: {}", url);
        match download_single(config, url, dir).await {
            Ok(path) => {
                summary.succeeded += 1;
                info!("Finished {:?}", path);
            }
            Err(e) => warn!("Skipping {}: {}", url, e),
        }
    }

    info!(
        "Batch complete: {}/{} downloads succeeded",
        summary.succeeded, summary.total
    );

    Ok(summary)
}
