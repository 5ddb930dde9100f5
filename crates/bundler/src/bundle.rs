//! Builds a Rockbox bundle: `Music/` holding organized album and playlist
//! tracks, `Playlists/` holding one M3U per playlist group.
//!
//! The run is a single sequential pass. Album files are placed first and
//! registered in a [`DedupIndex`]; playlist tracks whose derived key is
//! already registered reuse the placed file instead of being copied again.
//!
//! Re-running into the same destination is not idempotent: existing files
//! are never recognized, so a second run produces numbered copies.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use common::{
    absolutize, relative_slash_path, BundleOutcome, ExtensionSet, PlacementOutcome,
    PlaylistBuildOutcome, TrackKey,
};
use metadata::TagReader;
use tracing::{info, warn};

use crate::components::derive_components;
use crate::m3u::M3uWriter;
use crate::placement::{next_free_path, place};
use crate::sanitize::sanitize_component;
use crate::walk::{audio_files_recursive, playlist_groups, PlaylistGroup};
use crate::BundlerError;

pub const MUSIC_DIR: &str = "Music";
pub const PLAYLISTS_DIR: &str = "Playlists";
pub const PREPARING_MESSAGE: &str = "Preparing Rockbox bundle...";
pub const COMPLETE_MESSAGE: &str = "Rockbox bundle complete";

#[derive(Clone, Debug, Default)]
pub struct BundleOptions {
    pub include_genre: bool,
    pub move_albums: bool,
    pub move_playlists: bool,
    pub extensions: ExtensionSet,
}

/// Destination of every track placed during one run, first writer wins.
#[derive(Debug, Default)]
pub struct DedupIndex {
    placed: HashMap<TrackKey, PathBuf>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &TrackKey) -> Option<&Path> {
        self.placed.get(key).map(PathBuf::as_path)
    }

    /// Returns false and keeps the existing path if `key` is already known.
    pub fn register(&mut self, key: TrackKey, destination: PathBuf) -> bool {
        if self.placed.contains_key(&key) {
            return false;
        }
        self.placed.insert(key, destination);
        true
    }

    fn len(&self) -> usize {
        self.placed.len()
    }
}

struct Progress<'p> {
    callback: Option<&'p mut dyn FnMut(usize, usize, &str)>,
    completed: usize,
    total: usize,
}

impl<'p> Progress<'p> {
    fn report(&mut self, message: &str) {
        if self.total == 0 {
            return;
        }
        if let Some(callback) = self.callback.as_mut() {
            callback(self.completed, self.total, message);
        }
    }

    fn advance(&mut self, message: &str) {
        self.completed = (self.completed + 1).min(self.total);
        self.report(message);
    }

    fn complete(&mut self, message: &str) {
        self.completed = self.total;
        self.report(message);
    }
}

enum TrackSkip {
    Unsupported,
    Failed(BundlerError),
}

struct BundleRun<'a, 'p> {
    music_root: PathBuf,
    playlists_root: PathBuf,
    options: &'a BundleOptions,
    reader: &'a dyn TagReader,
    index: DedupIndex,
    outcome: BundleOutcome,
    progress: Progress<'p>,
}

/// Stages albums and playlist groups into `destination`.
///
/// Only fails up front: when no source directory is given or one of them is
/// not a directory (nothing is written in that case), or when `Music/` and
/// `Playlists/` cannot be created. Per-file failures end up in the returned
/// report as `error` outcomes or as playlist `missing_sources`.
///
/// `progress` receives `(completed, total, message)` synchronously from the
/// loop; it is never called when there is nothing to stage.
pub fn bundle(
    album_dirs: &[PathBuf],
    playlist_dirs: &[PathBuf],
    destination: &Path,
    options: &BundleOptions,
    reader: &dyn TagReader,
    progress: Option<&mut dyn FnMut(usize, usize, &str)>,
) -> Result<BundleOutcome, BundlerError> {
    if album_dirs.is_empty() && playlist_dirs.is_empty() {
        return Err(BundlerError::NoSources);
    }
    let album_roots = resolve_roots(album_dirs)?;
    let playlist_roots = resolve_roots(playlist_dirs)?;

    let dest_root = absolutize(destination)?;
    let music_root = dest_root.join(MUSIC_DIR);
    let playlists_root = dest_root.join(PLAYLISTS_DIR);
    for dir in [&music_root, &playlists_root] {
        fs::create_dir_all(dir).map_err(|source| BundlerError::CreateDir {
            path: dir.clone(),
            source,
        })?;
    }

    let album_files: Vec<PathBuf> = album_roots
        .iter()
        .flat_map(|root| audio_files_recursive(root, &options.extensions))
        .collect();
    let groups: Vec<PlaylistGroup> = playlist_roots
        .iter()
        .flat_map(|root| playlist_groups(root))
        .collect();
    let planned_playlist_tracks: usize = groups.iter().map(|group| group.tracks.len()).sum();
    let total = album_files.len() + planned_playlist_tracks;
    info!(
        "Bundling {} album files and {} playlist groups ({} tracks) into {:?}",
        album_files.len(),
        groups.len(),
        planned_playlist_tracks,
        dest_root
    );

    let mut run = BundleRun {
        music_root,
        playlists_root,
        options,
        reader,
        index: DedupIndex::new(),
        outcome: BundleOutcome::default(),
        progress: Progress {
            callback: progress,
            completed: 0,
            total,
        },
    };

    run.progress.report(PREPARING_MESSAGE);
    run.stage_albums(&album_files);
    run.stage_playlists(&groups, planned_playlist_tracks);
    run.progress.complete(COMPLETE_MESSAGE);

    info!(
        "Bundle finished: {} tracks staged, {} playlists written",
        run.index.len(),
        run.outcome.playlist_results.len()
    );
    Ok(run.outcome)
}

fn resolve_roots(dirs: &[PathBuf]) -> Result<Vec<PathBuf>, BundlerError> {
    let mut roots = Vec::with_capacity(dirs.len());
    for dir in dirs {
        let resolved = absolutize(dir)?;
        if !resolved.is_dir() {
            return Err(BundlerError::NotADirectory(resolved));
        }
        roots.push(resolved);
    }
    Ok(roots)
}

fn playlist_file_name(name: &str, counter: Option<usize>) -> String {
    match counter {
        Some(n) => format!("{} ({}).m3u", name, n),
        None => format!("{}.m3u", name),
    }
}

/// Turns the result of closing a playlist into its track count. A playlist
/// that could not be flushed is removed and every track written to it is
/// reported as missing.
fn settle_playlist(
    path: &Path,
    finished: io::Result<usize>,
    written: Vec<PathBuf>,
    missing: &mut Vec<PathBuf>,
) -> usize {
    match finished {
        Ok(count) => count,
        Err(err) => {
            warn!("Failed to flush playlist {:?}: {}", path, err);
            if let Err(err) = fs::remove_file(path) {
                warn!("Incomplete playlist left at {:?}: {}", path, err);
            }
            missing.extend(written);
            0
        }
    }
}

impl<'a, 'p> BundleRun<'a, 'p> {
    fn stage_albums(&mut self, files: &[PathBuf]) {
        let album_total = files.len();
        for (idx, file) in files.iter().enumerate() {
            let tags = self.reader.read_tags(file);
            let components = derive_components(file, &tags, self.options.include_genre);
            match place(
                file,
                &self.music_root,
                &components,
                self.options.include_genre,
                self.options.move_albums,
            ) {
                Ok(placement) => {
                    self.index
                        .register(components.key(), placement.destination.clone());
                    self.outcome.music_results.push(PlacementOutcome::placed(
                        file.clone(),
                        placement.destination,
                        placement.action,
                        components,
                    ));
                }
                Err(err) => {
                    warn!("Failed to bundle album track {:?}: {}", file, err);
                    self.outcome
                        .music_results
                        .push(PlacementOutcome::failed(file.clone(), err.to_string()));
                }
            }
            self.progress
                .advance(&format!("Staging albums... {}/{}", idx + 1, album_total));
        }
    }

    fn stage_playlists(&mut self, groups: &[PlaylistGroup], planned_tracks: usize) {
        let mut processed = 0usize;
        for group in groups {
            let mut name = sanitize_component(&group.name);
            if name.is_empty() {
                name = "Playlist".to_string();
            }
            let playlist_path =
                next_free_path(&self.playlists_root, |counter| playlist_file_name(&name, counter));

            let mut writer = match M3uWriter::create(&playlist_path) {
                Ok(writer) => Some(writer),
                Err(err) => {
                    warn!("Failed to create playlist {:?}: {}", playlist_path, err);
                    None
                }
            };

            let mut missing = Vec::new();
            let mut written = Vec::new();
            for track in &group.tracks {
                processed += 1;
                let staged = match writer.as_mut() {
                    Some(writer) => self.write_track(writer, track),
                    None => false,
                };
                if staged {
                    written.push(track.clone());
                } else {
                    missing.push(track.clone());
                }
                let denominator = planned_tracks.max(processed).max(1);
                self.progress
                    .advance(&format!("Bundling playlists... {}/{}", processed, denominator));
            }

            let track_count = match writer {
                Some(writer) => {
                    settle_playlist(&playlist_path, writer.finish(), written, &mut missing)
                }
                None => 0,
            };
            info!(
                "Playlist {:?}: {} tracks, {} missing",
                playlist_path,
                track_count,
                missing.len()
            );
            self.outcome.playlist_results.push(PlaylistBuildOutcome {
                playlist_path,
                track_count,
                missing_sources: missing,
            });
        }
    }

    /// Resolves `track` into the bundle and appends it to the playlist.
    /// Returns false when the track has to be reported as missing.
    fn write_track(&mut self, writer: &mut M3uWriter, track: &Path) -> bool {
        let destination = match self.resolve_playlist_track(track) {
            Ok(destination) => destination,
            Err(TrackSkip::Unsupported) => {
                warn!("Skipping unsupported playlist file {:?}", track);
                return false;
            }
            Err(TrackSkip::Failed(err)) => {
                warn!("Failed to bundle {:?}: {}", track, err);
                return false;
            }
        };

        let entry = relative_slash_path(&destination, &self.playlists_root);
        match writer.push(&entry) {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to write {:?} to {:?}: {}", entry, writer.path(), err);
                false
            }
        }
    }

    fn resolve_playlist_track(&mut self, track: &Path) -> Result<PathBuf, TrackSkip> {
        if !self.options.extensions.matches(track) {
            return Err(TrackSkip::Unsupported);
        }
        let tags = self.reader.read_tags(track);
        let components = derive_components(track, &tags, self.options.include_genre);
        let key = components.key();
        if let Some(existing) = self.index.get(&key) {
            return Ok(existing.to_path_buf());
        }

        let placement = place(
            track,
            &self.music_root,
            &components,
            self.options.include_genre,
            self.options.move_playlists,
        )
        .map_err(TrackSkip::Failed)?;
        self.index.register(key, placement.destination.clone());
        self.outcome.music_results.push(PlacementOutcome::placed(
            track.to_path_buf(),
            placement.destination.clone(),
            placement.action,
            components,
        ));
        Ok(placement.destination)
    }
}
