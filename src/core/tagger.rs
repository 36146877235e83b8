//! Batch metadata editing
//!
//! Overwrites artist, album artist, album, genre, and the embedded front
//! cover on every supported audio file in a directory. Tag encoding is
//! delegated to lofty; files whose format lofty cannot read are skipped with
//! a logged error. The artwork blob is looked up once per run, trying
//! `artwork.jpg` then `artwork.png`, first match wins.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use lofty::{
    Accessor, ItemKey, MimeType, Picture, PictureType, Probe, Tag, TagExt, TagType, TaggedFileExt,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::core::models::{AppError, AppResult, TagFields};

/// Extensions the editor will touch. WEBM and everything else are ignored.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["mp3", "m4a", "mp4"];

/// Artwork candidates, tried in order.
const ARTWORK_CANDIDATES: [&str; 2] = ["artwork.jpg", "artwork.png"];

/// Summary of one tagging pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagSummary {
    /// Files with a supported extension
    pub found: usize,

    /// Files successfully tagged and saved
    pub tagged: usize,
}

/// Artwork blob ready to embed.
pub struct Artwork {
    pub mime: MimeType,
    pub data: Vec<u8>,
}

/// Locate an artwork file in `dir`: `artwork.jpg` first, then `artwork.png`.
/// No content sniffing, the extension decides the MIME type.
pub fn find_artwork(dir: &Path) -> Option<PathBuf> {
    ARTWORK_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Read an artwork file into an embeddable blob.
pub fn load_artwork(path: &Path) -> AppResult<Artwork> {
    let data = std::fs::read(path)?;

    let mime = if has_extension(path, "png") {
        MimeType::Png
    } else {
        MimeType::Jpeg
    };

    Ok(Artwork { mime, data })
}

/// Overwrite the four text fields. Always a replacement, never an append, so
/// re-running with the same values is a no-op.
pub fn apply_fields(tag: &mut Tag, fields: &TagFields) {
    tag.set_artist(fields.artist.clone());
    tag.insert_text(ItemKey::AlbumArtist, fields.artist.clone());
    tag.set_album(fields.album.clone());
    tag.set_genre(fields.genre.clone());
}

/// Replace the front cover with `artwork`.
pub fn apply_artwork(tag: &mut Tag, artwork: &Artwork) {
    let picture = Picture::new_unchecked(
        PictureType::CoverFront,
        Some(artwork.mime.clone()),
        None,
        artwork.data.clone(),
    );

    if tag.pictures().is_empty() {
        tag.push_picture(picture);
    } else {
        tag.set_picture(0, picture);
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| ext.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| has_extension(path, ext))
}

/// Tag container type for files that have none yet: ID3v2 for the MP3
/// family, MP4 ilst for the MP4 family.
fn tag_type_for(path: &Path, fallback: TagType) -> TagType {
    if has_extension(path, "mp3") {
        TagType::Id3v2
    } else if has_extension(path, "m4a") || has_extension(path, "mp4") {
        TagType::Mp4Ilst
    } else {
        fallback
    }
}

/// Tag a single file in place, creating a tag container if none exists.
pub fn tag_file(path: &Path, fields: &TagFields, artwork: Option<&Artwork>) -> AppResult<()> {
    let mut tagged_file = Probe::open(path)
        .map_err(|e| AppError::Tag(format!("{:?}: {}", path, e)))?
        .read()
        .map_err(|e| AppError::Tag(format!("{:?}: unrecognized audio format: {}", path, e)))?;

    if tagged_file.primary_tag().is_none() {
        let tag_type = tag_type_for(path, tagged_file.primary_tag_type());
        debug!("No existing tags in {:?}, creating {:?}", path, tag_type);
        tagged_file.insert_tag(Tag::new(tag_type));
    }

    let tag = tagged_file
        .primary_tag_mut()
        .ok_or_else(|| AppError::Tag(format!("{:?}: failed to create tag container", path)))?;

    apply_fields(tag, fields);
    if let Some(artwork) = artwork {
        apply_artwork(tag, artwork);
    }

    tag.save_to_path(path)
        .map_err(|e| AppError::Tag(format!("{:?}: save failed: {}", path, e)))?;

    Ok(())
}

/// Tag every supported audio file in `dir` with the same field values.
/// Per-file failures are logged and the scan continues.
pub async fn tag_directory(dir: &Path, fields: &TagFields) -> AppResult<TagSummary> {
    let artwork = match find_artwork(dir) {
        Some(path) => match load_artwork(&path) {
            Ok(artwork) => {
                info!("Using artwork from {:?}", path);
                Some(artwork)
            }
            Err(e) => {
                warn!("Could not read artwork {:?}: {}", path, e);
                None
            }
        },
        None => {
            info!("Artwork file 'artwork.jpg' or 'artwork.png' not found, no artwork will be added");
            None
        }
    };

    let files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_supported(path))
        .collect();

    let mut summary = TagSummary {
        found: files.len(),
        tagged: 0,
    };

    for path in &files {
        info!("Processing audio file: {:?}", path);
        match tag_file(path, fields, artwork.as_ref()) {
            Ok(()) => {
                summary.tagged += 1;
                info!("Metadata updated for: {:?}", path);
            }
            Err(e) => warn!("Skipping {:?}: {}", path, e),
        }
    }

    info!(
        "Metadata update complete: {} of {} audio files processed",
        summary.tagged, summary.found
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> TagFields {
        TagFields {
            artist: "X".to_string(),
            album: "Y".to_string(),
            genre: "Z".to_string(),
        }
    }

    /// Two silent MPEG-1 Layer III frames (128 kbps, 44.1 kHz), the minimum
    /// lofty needs to recognize the file as MP3.
    fn write_minimal_mp3(path: &Path) {
        let mut frame = vec![0u8; 417];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);

        let mut data = frame.clone();
        data.extend_from_slice(&frame);
        std::fs::write(path, data).unwrap();
    }

    fn read_primary_tag(path: &Path) -> Tag {
        Probe::open(path)
            .unwrap()
            .read()
            .unwrap()
            .primary_tag()
            .expect("tag should exist after save")
            .clone()
    }

    #[test]
    fn test_find_artwork_prefers_jpg() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("artwork.png"), b"png").unwrap();
        std::fs::write(dir.path().join("artwork.jpg"), b"jpg").unwrap();

        let found = find_artwork(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "artwork.jpg");
    }

    #[test]
    fn test_find_artwork_falls_back_to_png() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("artwork.png"), b"png").unwrap();

        let found = find_artwork(dir.path()).unwrap();
        assert_eq!(found.file_name().unwrap(), "artwork.png");
    }

    #[test]
    fn test_find_artwork_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_artwork(dir.path()).is_none());
    }

    #[test]
    fn test_load_artwork_mime_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("artwork.png");
        std::fs::write(&png, b"not really a png").unwrap();

        let artwork = load_artwork(&png).unwrap();
        assert_eq!(artwork.mime, MimeType::Png);
        assert_eq!(artwork.data, b"not really a png");
    }

    #[test]
    fn test_apply_fields_overwrites() {
        let mut tag = Tag::new(TagType::Id3v2);

        apply_fields(&mut tag, &fields());
        apply_fields(&mut tag, &fields());

        assert_eq!(tag.artist().as_deref(), Some("X"));
        assert_eq!(tag.album().as_deref(), Some("Y"));
        assert_eq!(tag.genre().as_deref(), Some("Z"));
        assert_eq!(tag.get_string(&ItemKey::AlbumArtist), Some("X"));

        let mut changed = fields();
        changed.artist = "New".to_string();
        apply_fields(&mut tag, &changed);

        assert_eq!(tag.artist().as_deref(), Some("New"));
        assert_eq!(tag.get_string(&ItemKey::AlbumArtist), Some("New"));
    }

    #[test]
    fn test_apply_artwork_replaces_not_appends() {
        let mut tag = Tag::new(TagType::Id3v2);
        let artwork = Artwork {
            mime: MimeType::Jpeg,
            data: vec![1, 2, 3],
        };

        apply_artwork(&mut tag, &artwork);
        apply_artwork(&mut tag, &artwork);

        assert_eq!(tag.pictures().len(), 1);
    }

    #[test]
    fn test_tag_type_for_extension() {
        assert_eq!(
            tag_type_for(Path::new("a.mp3"), TagType::VorbisComments),
            TagType::Id3v2
        );
        assert_eq!(
            tag_type_for(Path::new("a.m4a"), TagType::VorbisComments),
            TagType::Mp4Ilst
        );
        assert_eq!(
            tag_type_for(Path::new("a.MP4"), TagType::VorbisComments),
            TagType::Mp4Ilst
        );
        assert_eq!(
            tag_type_for(Path::new("a.ogg"), TagType::VorbisComments),
            TagType::VorbisComments
        );
    }

    #[test]
    fn test_is_supported() {
        assert!(is_supported(Path::new("song.mp3")));
        assert!(is_supported(Path::new("song.M4A")));
        assert!(is_supported(Path::new("clip.mp4")));
        assert!(!is_supported(Path::new("clip.webm")));
        assert!(!is_supported(Path::new("notes.txt")));
    }

    #[test]
    fn test_tag_file_writes_fields_and_artwork_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        write_minimal_mp3(&path);

        let artwork = Artwork {
            mime: MimeType::Jpeg,
            data: vec![0xFF, 0xD8, 0xFF, 0xE0],
        };

        tag_file(&path, &fields(), Some(&artwork)).unwrap();

        let tag = read_primary_tag(&path);
        assert_eq!(tag.tag_type(), TagType::Id3v2);
        assert_eq!(tag.artist().as_deref(), Some("X"));
        assert_eq!(tag.album().as_deref(), Some("Y"));
        assert_eq!(tag.genre().as_deref(), Some("Z"));
        assert_eq!(tag.get_string(&ItemKey::AlbumArtist), Some("X"));

        assert_eq!(tag.pictures().len(), 1);
        assert_eq!(tag.pictures()[0].pic_type(), PictureType::CoverFront);
        assert_eq!(tag.pictures()[0].data(), &[0xFF, 0xD8, 0xFF, 0xE0][..]);

        // Re-running replaces, never accumulates
        tag_file(&path, &fields(), Some(&artwork)).unwrap();
        assert_eq!(read_primary_tag(&path).pictures().len(), 1);
    }

    #[tokio::test]
    async fn test_tag_directory_without_artwork_sets_fields_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        write_minimal_mp3(&path);

        let summary = tag_directory(dir.path(), &fields()).await.unwrap();
        assert_eq!(summary.found, 1);
        assert_eq!(summary.tagged, 1);

        let tag = read_primary_tag(&path);
        assert_eq!(tag.artist().as_deref(), Some("X"));
        assert_eq!(tag.album().as_deref(), Some("Y"));
        assert_eq!(tag.genre().as_deref(), Some("Z"));
        assert!(tag.pictures().is_empty());
    }

    #[tokio::test]
    async fn test_tag_directory_embeds_artwork_from_jpg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        write_minimal_mp3(&path);
        std::fs::write(dir.path().join("artwork.jpg"), [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let summary = tag_directory(dir.path(), &fields()).await.unwrap();
        assert_eq!(summary.tagged, 1);

        let tag = read_primary_tag(&path);
        assert_eq!(tag.pictures().len(), 1);
        assert_eq!(tag.pictures()[0].mime_type(), Some(&MimeType::Jpeg));
    }

    #[test]
    fn test_tag_file_rejects_unrecognized_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.mp3");
        std::fs::write(&path, b"this is not audio").unwrap();

        let result = tag_file(&path, &fields(), None);
        assert!(matches!(result, Err(AppError::Tag(_))));
    }

    #[tokio::test]
    async fn test_tag_directory_counts_unreadable_files_as_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fake.mp3"), b"junk").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"junk").unwrap();

        let summary = tag_directory(dir.path(), &fields()).await.unwrap();
        assert_eq!(summary.found, 1);
        assert_eq!(summary.tagged, 0);
    }
}
