//! Application configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default MP3 bitrate passed to ffmpeg, e.g. "320k".
pub const DEFAULT_MP3_BITRATE: &str = "320k";

/// Default links file written by the extractor and read by the batch
/// downloader.
pub const DEFAULT_LINKS_FILE: &str = "video_links.txt";

/// Main application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// yt-dlp executable, resolved on PATH unless an absolute path is given
    pub ytdlp_bin: PathBuf,

    /// ffmpeg executable, resolved on PATH unless an absolute path is given
    pub ffmpeg_bin: PathBuf,

    /// Links file consumed by batch downloads
    pub links_file: PathBuf,

    /// Default download directory
    pub download_dir: PathBuf,

    /// Target MP3 bitrate, e.g. "320k"
    pub mp3_bitrate: String,

    /// Delete source files after a successful container conversion
    pub delete_sources: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ytdlp_bin: PathBuf::from("yt-dlp"),

            ffmpeg_bin: PathBuf::from("ffmpeg"),

            links_file: PathBuf::from(DEFAULT_LINKS_FILE),

            download_dir: PathBuf::from("."),

            mp3_bitrate: DEFAULT_MP3_BITRATE.to_string(),

            delete_sources: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from file, creating default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let config: AppConfig =
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")?;

            tracing::debug!("Loaded configuration from: {:?}", config_path);
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        tracing::info!("Saved configuration to: {:?}", config_path);
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "tube2mp3", "tube2mp3")
            .with_context(|| "Failed to get project directories")?;

        let config_dir = project_dirs.config_dir();
        Ok(config_dir.join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = AppConfig::default();

        assert_eq!(config.ytdlp_bin, PathBuf::from("yt-dlp"));
        assert_eq!(config.ffmpeg_bin, PathBuf::from("ffmpeg"));
        assert_eq!(config.links_file, PathBuf::from("video_links.txt"));
        assert_eq!(config.download_dir, PathBuf::from("."));
        assert_eq!(config.mp3_bitrate, "320k");
        assert!(config.delete_sources);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = AppConfig::default();
        config.mp3_bitrate = "192k".to_string();
        config.delete_sources = false;

        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: AppConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.mp3_bitrate, "192k");
        assert!(!restored.delete_sources);
        assert_eq!(restored.ytdlp_bin, config.ytdlp_bin);
    }

    #[test]
    fn test_partial_config_rejected() {
        // A config file missing fields should fail to parse rather than
        // silently producing defaults.
        let result = serde_json::from_str::<AppConfig>(r#"{"mp3_bitrate": "320k"}"#);
        assert!(result.is_err());
    }
}
