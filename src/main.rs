//! tube2mp3 command-line entry point
//!
//! One subcommand per pipeline step, plus an interactive menu when invoked
//! without a subcommand. Step errors are logged and the process exits
//! normally; per-item failure isolation happens inside the steps themselves.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

use tube2mp3::utils::logging::init_tracing;
use tube2mp3::{
    convert_webm_to_mp4, download_batch, download_single, extract_mp4_audio,
    extract_playlist_links, run_menu, tag_directory, AppConfig, TagFields,
};

#[derive(Parser)]
#[command(
    name = "tube2mp3",
    version,
    about = "YouTube to MP3 downloader and metadata editor"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Extract video links from a playlist into a links file
    Extract {
        /// Playlist URL to resolve
        playlist_url: String,

        /// Output links file (defaults to the configured links file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download a single video (or a whole links file with --playlist) as MP3
    Download {
        /// Video URL; omit when using --playlist
        url: Option<String>,

        /// Download directory (defaults to the current directory)
        dir: Option<PathBuf>,

        /// Download every link in the links file instead of a single URL
        #[arg(long)]
        playlist: bool,

        /// Links file to read in --playlist mode
        #[arg(long)]
        links_file: Option<PathBuf>,
    },

    /// Convert all WEBM files in a directory to MP4
    Convert {
        /// Directory to scan (defaults to the current directory)
        dir: Option<PathBuf>,

        /// Keep the WEBM sources after a successful conversion
        #[arg(long)]
        keep_sources: bool,
    },

    /// Extract M4A audio from all MP4 files in a directory
    ExtractAudio {
        /// Directory to scan (defaults to the current directory)
        dir: Option<PathBuf>,

        /// Keep the MP4 sources after a successful extraction
        #[arg(long)]
        keep_sources: bool,
    },

    /// Overwrite artist/album/genre tags and artwork on supported audio files
    Tag {
        /// Artist name, also written as album artist
        #[arg(long)]
        artist: String,

        /// Album name
        #[arg(long)]
        album: String,

        /// Genre
        #[arg(long)]
        genre: String,

        /// Directory to scan (defaults to the current directory)
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let config = AppConfig::load().unwrap_or_else(|e| {
        error!("Could not load configuration, using defaults: {}", e);
        AppConfig::default()
    });

    match cli.command {
        None => run_menu(&config).await?,

        Some(Command::Extract {
            playlist_url,
            output,
        }) => {
            let output = output.unwrap_or_else(|| config.links_file.clone());
            if let Err(e) = extract_playlist_links(&config, &playlist_url, &output).await {
                error!("Error extracting playlist links: {}", e);
            }
        }

        Some(Command::Download {
            url,
            dir,
            playlist,
            links_file,
        }) => {
            let dir = dir.unwrap_or_else(|| config.download_dir.clone());

            if playlist {
                let links_file = links_file.unwrap_or_else(|| config.links_file.clone());
                if let Err(e) = download_batch(&config, &links_file, &dir).await {
                    error!("Error processing video links from file: {}", e);
                }
            } else if let Some(url) = url {
                if let Err(e) = download_single(&config, &url, &dir).await {
                    error!("Error downloading video: {}", e);
                }
            } else {
                eprintln!("Usage:");
                eprintln!("  For a single video: tube2mp3 download <video_url> [download_dir]");
                eprintln!("  For a links file:   tube2mp3 download --playlist [download_dir]");
            }
        }

        Some(Command::Convert { dir, keep_sources }) => {
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            let delete_sources = config.delete_sources && !keep_sources;
            if let Err(e) = convert_webm_to_mp4(&config, &dir, delete_sources).await {
                error!("Error converting WEBM files: {}", e);
            }
        }

        Some(Command::ExtractAudio { dir, keep_sources }) => {
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            let delete_sources = config.delete_sources && !keep_sources;
            if let Err(e) = extract_mp4_audio(&config, &dir, delete_sources).await {
                error!("Error extracting audio from MP4 files: {}", e);
            }
        }

        Some(Command::Tag {
            artist,
            album,
            genre,
            dir,
        }) => {
            let dir = dir.unwrap_or_else(|| PathBuf::from("."));
            let fields = TagFields {
                artist,
                album,
                genre,
            };
            if let Err(e) = tag_directory(&dir, &fields).await {
                error!("Error editing metadata: {}", e);
            }
        }
    }

    Ok(())
}
