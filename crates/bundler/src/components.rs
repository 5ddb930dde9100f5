use std::path::Path;

use common::{lowercase_suffix, TrackComponents};
use metadata::RawTags;

use crate::sanitize::{format_track_number, primary_artist, sanitize_component, UNKNOWN_ARTIST};

const UNKNOWN_ALBUM: &str = "Unknown Album";
const UNKNOWN_GENRE: &str = "Unknown Genre";

pub fn derive_components(path: &Path, tags: &RawTags, include_genre: bool) -> TrackComponents {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let artist = primary_artist(present(&tags.artist).unwrap_or(UNKNOWN_ARTIST));
    let album = sanitize_component(present(&tags.album).unwrap_or(UNKNOWN_ALBUM));
    let title = sanitize_component(present(&tags.title).unwrap_or(&stem));
    let track = format_track_number(present(&tags.track_number), Some(&stem));

    // An absent genre only becomes "Unknown Genre" when it is used as a folder.
    let genre = match present(&tags.genre) {
        Some(genre) => sanitize_component(genre),
        None if include_genre => sanitize_component(UNKNOWN_GENRE),
        None => String::new(),
    };

    TrackComponents {
        artist,
        album,
        title,
        track,
        genre,
        suffix: lowercase_suffix(path),
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
