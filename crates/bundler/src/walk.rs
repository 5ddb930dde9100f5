use std::path::{Path, PathBuf};

use common::ExtensionSet;
use walkdir::WalkDir;

/// Files bound for one generated playlist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaylistGroup {
    pub name: String,
    pub tracks: Vec<PathBuf>,
}

/// Every accepted audio file below `root`, at any depth, sorted.
pub fn audio_files_recursive(root: &Path, extensions: &ExtensionSet) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = files_recursive(root)
        .into_iter()
        .filter(|path| extensions.matches(path))
        .collect();
    files.sort();
    files
}

pub fn files_recursive(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file() {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}

pub fn immediate_files(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file() {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    files
}

pub fn immediate_subdirs(dir: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
    {
        if entry.file_type().is_dir() {
            dirs.push(entry.path().to_path_buf());
        }
    }
    dirs.sort();
    dirs
}

/// `root` followed by all of its subdirectories in depth-first lexical order.
pub fn directory_tree(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.path().to_path_buf())
        .collect();
    dirs.sort();
    dirs.insert(0, root.to_path_buf());
    dirs
}

/// Groups under a playlist root: loose files in the root form a group named
/// after the root, each immediate subdirectory forms a group with all files
/// beneath it. Files are not filtered by extension here.
pub fn playlist_groups(root: &Path) -> Vec<PlaylistGroup> {
    let mut groups = Vec::new();

    let root_tracks = immediate_files(root);
    if !root_tracks.is_empty() {
        groups.push(PlaylistGroup {
            name: dir_name(root),
            tracks: root_tracks,
        });
    }

    for subdir in immediate_subdirs(root) {
        let tracks = files_recursive(&subdir);
        if tracks.is_empty() {
            continue;
        }
        groups.push(PlaylistGroup {
            name: dir_name(&subdir),
            tracks,
        });
    }

    groups
}

pub fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}
