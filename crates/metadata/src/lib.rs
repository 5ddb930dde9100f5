use std::path::Path;

use lofty::error::LoftyError;
use lofty::prelude::{ItemKey, TaggedFileExt};
use tracing::{debug, warn};

/// Tag values as found in the file, untouched. Absent fields are `None`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<String>,
    pub genre: Option<String>,
}

impl RawTags {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.track_number.is_none()
            && self.genre.is_none()
    }
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

/// Source of embedded tags. Implementations never fail: unreadable files
/// yield empty tags.
pub trait TagReader {
    fn read_tags(&self, path: &Path) -> RawTags;
}

impl<T: TagReader + ?Sized> TagReader for &T {
    fn read_tags(&self, path: &Path) -> RawTags {
        (**self).read_tags(path)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> RawTags {
        match read_tags_from_file(path) {
            Ok(tags) => {
                if tags.is_empty() {
                    debug!("No usable tags in {:?}", path);
                }
                tags
            }
            Err(err) => {
                warn!("Failed to read tags for {:?}: {}", path, err);
                RawTags::default()
            }
        }
    }
}

/// Stand-in used when no tag library should be consulted.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTagReader;

impl TagReader for NullTagReader {
    fn read_tags(&self, _path: &Path) -> RawTags {
        RawTags::default()
    }
}

pub fn read_tags_from_file(path: &Path) -> Result<RawTags, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;

    let mut tags = RawTags::default();
    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        tags.title = tag.get_string(&ItemKey::TrackTitle).and_then(non_blank);
        tags.album = tag.get_string(&ItemKey::AlbumTitle).and_then(non_blank);
        let track_artist = tag.get_string(&ItemKey::TrackArtist).and_then(non_blank);
        let album_artist = tag.get_string(&ItemKey::AlbumArtist).and_then(non_blank);
        tags.artist = track_artist.or(album_artist);
        tags.track_number = tag.get_string(&ItemKey::TrackNumber).and_then(non_blank);
        tags.genre = tag.get_string(&ItemKey::Genre).and_then(non_blank);
    }

    Ok(tags)
}

fn non_blank(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
