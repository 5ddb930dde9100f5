use std::fs;
use std::path::{Path, PathBuf};

use common::{absolutize, relative_slash_path, ExportedPlaylist, ExtensionSet};
use tracing::info;

use crate::m3u::M3uWriter;
use crate::walk::{dir_name, directory_tree, immediate_files};
use crate::BundlerError;

/// Writes one `{dir}.m3u` per directory that holds accepted audio files.
/// Entries point at the files in place, relative to the playlist's folder.
pub fn export_playlists(
    source: &Path,
    destination: Option<&Path>,
    extensions: &ExtensionSet,
    recursive: bool,
) -> Result<Vec<ExportedPlaylist>, BundlerError> {
    let source = absolutize(source)?;
    if !source.is_dir() {
        return Err(BundlerError::NotADirectory(source));
    }
    let destination = match destination {
        Some(path) => absolutize(path)?,
        None => source.clone(),
    };

    let directories = if recursive {
        directory_tree(&source)
    } else {
        vec![source.clone()]
    };

    let mut results = Vec::new();
    for directory in directories {
        let tracks: Vec<PathBuf> = immediate_files(&directory)
            .into_iter()
            .filter(|path| extensions.matches(path))
            .collect();
        if tracks.is_empty() {
            continue;
        }

        let playlist_path = playlist_path_for(&source, &directory, &destination);
        let playlist_dir = match playlist_path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => destination.clone(),
        };
        fs::create_dir_all(&playlist_dir).map_err(|source| BundlerError::CreateDir {
            path: playlist_dir.clone(),
            source,
        })?;

        let written = write_playlist(&playlist_path, &playlist_dir, &tracks).map_err(|source| {
            BundlerError::Playlist {
                path: playlist_path.clone(),
                source,
            }
        })?;
        info!("Created {:?} ({} tracks)", playlist_path, written);
        results.push(ExportedPlaylist {
            playlist_path,
            track_count: written,
        });
    }

    Ok(results)
}

fn playlist_path_for(source: &Path, directory: &Path, destination: &Path) -> PathBuf {
    let relative = directory.strip_prefix(source).unwrap_or_else(|_| Path::new(""));
    destination
        .join(relative)
        .join(format!("{}.m3u", dir_name(directory)))
}

fn write_playlist(path: &Path, base: &Path, tracks: &[PathBuf]) -> std::io::Result<usize> {
    let mut writer = M3uWriter::create(path)?;
    for track in tracks {
        writer.push(&relative_slash_path(track, base))?;
    }
    writer.finish()
}
