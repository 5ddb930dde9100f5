use std::collections::HashMap;
use std::path::Path;

use metadata::{RawTags, TagReader};

/// Tag reader keyed by file name so tests do not depend on resolved paths.
#[derive(Default)]
pub struct FakeTags {
    by_name: HashMap<String, RawTags>,
    fallback: Option<RawTags>,
}

fn raw(
    artist: &str,
    album: &str,
    title: &str,
    track: Option<&str>,
    genre: Option<&str>,
) -> RawTags {
    RawTags {
        title: Some(title.to_string()),
        artist: Some(artist.to_string()),
        album: Some(album.to_string()),
        track_number: track.map(str::to_string),
        genre: genre.map(str::to_string),
    }
}

impl FakeTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        file_name: &str,
        artist: &str,
        album: &str,
        title: &str,
        track: Option<&str>,
        genre: Option<&str>,
    ) -> Self {
        self.by_name
            .insert(file_name.to_string(), raw(artist, album, title, track, genre));
        self
    }

    pub fn fallback(
        mut self,
        artist: &str,
        album: &str,
        title: &str,
        track: Option<&str>,
        genre: Option<&str>,
    ) -> Self {
        self.fallback = Some(raw(artist, album, title, track, genre));
        self
    }
}

impl TagReader for FakeTags {
    fn read_tags(&self, path: &Path) -> RawTags {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.by_name
            .get(&name)
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}
