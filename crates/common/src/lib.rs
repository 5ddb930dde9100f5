use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};

pub const DEFAULT_EXTENSIONS: [&str; 6] = [".mp3", ".flac", ".wav", ".ogg", ".m4a", ".aac"];

/// Canonical, filesystem-safe description of one track.
///
/// Every field except `genre` is non-empty once derived. `genre` stays empty
/// when the source had no genre tag and genre folders were not requested.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackComponents {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub track: String,
    #[serde(default)]
    pub genre: String,
    pub suffix: String,
}

impl TrackComponents {
    pub fn key(&self) -> TrackKey {
        TrackKey {
            artist: self.artist.clone(),
            album: self.album.clone(),
            title: self.title.clone(),
            track: self.track.clone(),
            suffix: self.suffix.clone(),
        }
    }

    pub fn file_name(&self, counter: Option<usize>) -> String {
        match counter {
            Some(n) => format!("{} - {} ({}){}", self.track, self.title, n, self.suffix),
            None => format!("{} - {}{}", self.track, self.title, self.suffix),
        }
    }
}

/// Identity of a logical track across album and playlist sources.
/// Genre is left out so the genre-folder setting never splits duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackKey {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub track: String,
    pub suffix: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementAction {
    Copied,
    Moved,
    Error,
}

impl PlacementAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementAction::Copied => "copied",
            PlacementAction::Moved => "moved",
            PlacementAction::Error => "error",
        }
    }
}

impl fmt::Display for PlacementAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlacementOutcome {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub action: PlacementAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<TrackComponents>,
}

impl PlacementOutcome {
    pub fn placed(
        source: PathBuf,
        destination: PathBuf,
        action: PlacementAction,
        components: TrackComponents,
    ) -> Self {
        Self {
            source,
            destination: Some(destination),
            action,
            reason: None,
            components: Some(components),
        }
    }

    pub fn failed(source: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            source,
            destination: None,
            action: PlacementAction::Error,
            reason: Some(reason.into()),
            components: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.action == PlacementAction::Error
    }
}

/// A playlist that could not be written keeps its intended path, reports
/// `track_count == 0` and lists every one of its tracks as missing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlaylistBuildOutcome {
    pub playlist_path: PathBuf,
    pub track_count: usize,
    #[serde(default)]
    pub missing_sources: Vec<PathBuf>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BundleOutcome {
    pub music_results: Vec<PlacementOutcome>,
    pub playlist_results: Vec<PlaylistBuildOutcome>,
}

impl BundleOutcome {
    pub fn is_empty(&self) -> bool {
        self.music_results.is_empty() && self.playlist_results.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportedPlaylist {
    pub playlist_path: PathBuf,
    pub track_count: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub copied: usize,
    pub moved: usize,
    pub errors: usize,
}

pub fn count_actions<'a, I>(outcomes: I) -> ActionCounts
where
    I: IntoIterator<Item = &'a PlacementOutcome>,
{
    let mut counts = ActionCounts::default();
    for outcome in outcomes {
        match outcome.action {
            PlacementAction::Copied => counts.copied += 1,
            PlacementAction::Moved => counts.moved += 1,
            PlacementAction::Error => counts.errors += 1,
        }
    }
    counts
}

/// Accepted audio extensions, stored lowercase with a leading dot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtensionSet {
    exts: BTreeSet<String>,
}

impl ExtensionSet {
    /// Builds a set from raw entries; an empty result falls back to the defaults.
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exts: BTreeSet<String> = raw
            .into_iter()
            .filter_map(|value| normalize_extension(value.as_ref()))
            .collect();
        if exts.is_empty() {
            return Self::default();
        }
        Self { exts }
    }

    /// Parses a comma-separated list such as `"flac, .MP3"`.
    pub fn parse_list(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn contains(&self, ext: &str) -> bool {
        match normalize_extension(ext) {
            Some(ext) => self.exts.contains(&ext),
            None => false,
        }
    }

    pub fn matches(&self, path: &Path) -> bool {
        let suffix = lowercase_suffix(path);
        !suffix.is_empty() && self.exts.contains(&suffix)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.exts.iter().map(String::as_str)
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self {
            exts: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "." {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if lower.starts_with('.') {
        Some(lower)
    } else {
        Some(format!(".{}", lower))
    }
}

/// Lowercase extension including the dot, or an empty string.
pub fn lowercase_suffix(path: &Path) -> String {
    match path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
        None => String::new(),
    }
}

pub fn path_to_slash_string(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    parts.join("/")
}

/// Renders `target` relative to the directory `base` with `/` separators.
/// Both paths are expected to be absolute and already resolved.
pub fn relative_slash_path(target: &Path, base: &Path) -> String {
    let target_parts: Vec<Component<'_>> = target.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    if let (Some(Component::Prefix(a)), Some(Component::Prefix(b))) =
        (target_parts.first(), base_parts.first())
    {
        if a != b {
            return path_to_slash_string(target);
        }
    }

    let common = target_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..base_parts.len() {
        parts.push("..".to_string());
    }
    for part in &target_parts[common..] {
        parts.push(part.as_os_str().to_string_lossy().to_string());
    }

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Makes `path` absolute and resolves symlinks for the longest existing prefix,
/// so paths that do not exist yet still share a base with resolved siblings.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut tail: Vec<&std::ffi::OsStr> = Vec::new();
    loop {
        if existing.exists() {
            let mut resolved = existing.canonicalize()?;
            for part in tail.iter().rev() {
                resolved.push(part);
            }
            return Ok(resolved);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name);
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn components(title: &str) -> TrackComponents {
        TrackComponents {
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            title: title.to_string(),
            track: "01".to_string(),
            genre: String::new(),
            suffix: ".flac".to_string(),
        }
    }

    #[test]
    fn key_ignores_genre() {
        let plain = components("Song");
        let mut tagged = plain.clone();
        tagged.genre = "Rock".to_string();
        assert_eq!(plain.key(), tagged.key());
        assert_ne!(plain.key(), components("Other").key());
    }

    #[test]
    fn file_name_with_and_without_counter() {
        let c = components("Song");
        assert_eq!(c.file_name(None), "01 - Song.flac");
        assert_eq!(c.file_name(Some(2)), "01 - Song (2).flac");
    }

    #[test]
    fn extension_set_normalizes_entries() {
        let set = ExtensionSet::parse_list(" FLAC, .Mp3 ,, ");
        assert!(set.contains("flac"));
        assert!(set.contains(".MP3"));
        assert!(!set.contains(".ogg"));
        assert!(set.matches(Path::new("/music/a/Track.FLAC")));
        assert!(!set.matches(Path::new("/music/a/cover.jpg")));
        assert!(!set.matches(Path::new("/music/a/.flac")));
    }

    #[test]
    fn empty_extension_list_falls_back_to_defaults() {
        let set = ExtensionSet::parse_list(" , ");
        assert_eq!(set, ExtensionSet::default());
        assert_eq!(set.iter().count(), DEFAULT_EXTENSIONS.len());
    }

    #[test]
    fn relative_path_between_sibling_trees() {
        let target = Path::new("/bundle/Music/Artist/Album/01 - Song.flac");
        let base = Path::new("/bundle/Playlists");
        assert_eq!(
            relative_slash_path(target, base),
            "../Music/Artist/Album/01 - Song.flac"
        );
    }

    #[test]
    fn relative_path_inside_base() {
        let target = Path::new("/music/flacs/01-song.flac");
        assert_eq!(relative_slash_path(target, Path::new("/music/flacs")), "01-song.flac");
        assert_eq!(relative_slash_path(Path::new("/music"), Path::new("/music")), ".");
    }

    #[test]
    fn absolutize_resolves_missing_tail() {
        let dir = tempfile::TempDir::new().unwrap();
        let resolved_root = dir.path().canonicalize().unwrap();
        let missing = dir.path().join("not").join("there");
        let resolved = absolutize(&missing).unwrap();
        assert_eq!(resolved, resolved_root.join("not").join("there"));
    }

    #[test]
    fn action_counts() {
        let ok = PlacementOutcome::placed(
            PathBuf::from("a.flac"),
            PathBuf::from("b.flac"),
            PlacementAction::Copied,
            components("Song"),
        );
        let failed = PlacementOutcome::failed(PathBuf::from("c.flac"), "boom");
        let counts = count_actions([&ok, &failed]);
        assert_eq!(counts.copied, 1);
        assert_eq!(counts.moved, 0);
        assert_eq!(counts.errors, 1);
        assert!(failed.is_error());
        assert!(failed.destination.is_none());
    }
}
