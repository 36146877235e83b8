//! Interactive menu and the fixed step flows
//!
//! The menu chains the pipeline steps in a fixed order. Steps are composed
//! as in-process calls; each one is individually guarded so a failed step is
//! logged and the flow moves on to the next step, and the menu keeps
//! prompting.

use std::io::Write;
use std::path::Path;

use tracing::error;

use crate::core::config::AppConfig;
use crate::core::downloader::{download_batch, download_single};
use crate::core::extractor::extract_playlist_links;
use crate::core::models::{AppResult, TagFields};
use crate::core::tagger::tag_directory;
use crate::core::transcoder::convert_webm_to_mp4;

/// Log a failed step and keep going.
fn log_step<T>(step: &str, result: AppResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            error!("{} failed: {}", step, e);
            None
        }
    }
}

/// Download one video as MP3, convert leftover WEBM files, then tag the
/// output directory.
pub async fn run_single_flow(config: &AppConfig, url: &str, dir: &Path, fields: &TagFields) {
    log_step("Single download", download_single(config, url, dir).await);
    log_step(
        "WEBM to MP4 conversion",
        convert_webm_to_mp4(config, dir, config.delete_sources).await,
    );
    log_step("Metadata editing", tag_directory(dir, fields).await);
}

/// Extract the playlist into the links file, download every link as MP3,
/// convert leftover WEBM files, then tag the output directory.
pub async fn run_playlist_flow(
    config: &AppConfig,
    playlist_url: &str,
    dir: &Path,
    fields: &TagFields,
) {
    log_step(
        "Link extraction",
        extract_playlist_links(config, playlist_url, &config.links_file).await,
    );
    log_step(
        "Playlist download",
        download_batch(config, &config.links_file, dir).await,
    );
    log_step(
        "WEBM to MP4 conversion",
        convert_webm_to_mp4(config, dir, config.delete_sources).await,
    );
    log_step("Metadata editing", tag_directory(dir, fields).await);
}

/// Print `message` and read one line from stdin. Returns `None` on EOF.
fn prompt(message: &str) -> AppResult<Option<String>> {
    print!("{}", message);
    std::io::stdout().flush()?;

    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }

    Ok(Some(line.trim().to_string()))
}

fn prompt_fields() -> AppResult<Option<TagFields>> {
    let Some(artist) = prompt("Enter the Artist Name for all audio files: ")? else {
        return Ok(None);
    };
    let Some(album) = prompt("Enter the Album Name for all audio files: ")? else {
        return Ok(None);
    };
    let Some(genre) = prompt("Enter the Genre for all audio files: ")? else {
        return Ok(None);
    };

    Ok(Some(TagFields {
        artist,
        album,
        genre,
    }))
}

fn prompt_directory() -> AppResult<Option<String>> {
    let answer = prompt("Enter download directory (leave blank for current directory): ")?;
    Ok(answer.map(|dir| if dir.is_empty() { ".".to_string() } else { dir }))
}

/// Run the interactive menu loop until the user exits or stdin closes.
pub async fn run_menu(config: &AppConfig) -> AppResult<()> {
    println!("YouTube to MP3 Downloader and Metadata Editor");

    loop {
        println!("\nChoose download type:");
        println!("1. Download Single Video to MP3");
        println!("2. Download Playlist to MP3s");
        println!("3. Exit");

        let Some(choice) = prompt("Enter your choice (1, 2, or 3): ")? else {
            break;
        };

        match choice.as_str() {
            "1" => {
                let Some(url) = prompt("Enter YouTube Video URL: ")? else {
                    break;
                };
                if url.is_empty() {
                    println!("No URL given.");
                    continue;
                }
                let Some(dir) = prompt_directory()? else { break };
                let Some(fields) = prompt_fields()? else { break };

                run_single_flow(config, &url, Path::new(&dir), &fields).await;
                println!("\nSingle video MP3 download process complete.");
            }
            "2" => {
                let Some(playlist_url) = prompt("Enter YouTube Playlist URL: ")? else {
                    break;
                };
                if playlist_url.is_empty() {
                    println!("No playlist URL given.");
                    continue;
                }
                let Some(dir) = prompt_directory()? else { break };
                let Some(fields) = prompt_fields()? else { break };

                run_playlist_flow(config, &playlist_url, Path::new(&dir), &fields).await;
                println!("\nPlaylist MP3 download process complete.");
            }
            "3" => {
                println!("Exiting.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1, 2, or 3."),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_step_passes_through_success() {
        assert_eq!(log_step("step", Ok::<_, crate::AppError>(7)), Some(7));
    }

    #[test]
    fn test_log_step_swallows_failure() {
        let failed: AppResult<()> = Err(crate::AppError::Download("boom".to_string()));
        assert_eq!(log_step("step", failed), None);
    }
}
