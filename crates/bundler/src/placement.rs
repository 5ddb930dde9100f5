use std::fs::{self, File, FileTimes, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use common::{PlacementAction, TrackComponents};
use tracing::debug;

use crate::BundlerError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placement {
    pub destination: PathBuf,
    pub action: PlacementAction,
}

/// Copies or moves `file` to `[genre/]artist/album/NN - Title.ext` under
/// `destination_root`. Existing files are never overwritten; a ` (n)` counter
/// is appended instead.
pub fn place(
    file: &Path,
    destination_root: &Path,
    components: &TrackComponents,
    include_genre: bool,
    move_file: bool,
) -> Result<Placement, BundlerError> {
    let target_dir = target_dir(destination_root, components, include_genre);
    fs::create_dir_all(&target_dir).map_err(|source| BundlerError::CreateDir {
        path: target_dir.clone(),
        source,
    })?;

    let target = next_free_path(&target_dir, |counter| components.file_name(counter));
    let action = if move_file {
        move_path(file, &target)
    } else {
        copy_preserving(file, &target)
    }
    .map_err(|source| BundlerError::Transfer {
        from: file.to_path_buf(),
        to: target.clone(),
        source,
    })?;

    debug!("{} {:?} -> {:?}", action, file, target);
    Ok(Placement {
        destination: target,
        action,
    })
}

pub fn target_dir(
    destination_root: &Path,
    components: &TrackComponents,
    include_genre: bool,
) -> PathBuf {
    let mut dir = destination_root.to_path_buf();
    if include_genre && !components.genre.is_empty() {
        dir.push(&components.genre);
    }
    dir.push(&components.artist);
    dir.push(&components.album);
    dir
}

/// First path in `dir` named `name_for(None)`, `name_for(Some(1))`, ... that
/// is not taken. Dangling symlinks count as taken.
pub fn next_free_path<F>(dir: &Path, name_for: F) -> PathBuf
where
    F: Fn(Option<usize>) -> String,
{
    let mut candidate = dir.join(name_for(None));
    let mut counter = 1;
    while fs::symlink_metadata(&candidate).is_ok() {
        candidate = dir.join(name_for(Some(counter)));
        counter += 1;
    }
    candidate
}

fn move_path(from: &Path, to: &Path) -> io::Result<PlacementAction> {
    if fs::rename(from, to).is_ok() {
        return Ok(PlacementAction::Moved);
    }
    // rename fails across filesystems
    copy_then_remove(from, to)
}

/// Moves by copying. When the source cannot be removed the copy is deleted
/// again, so a failed move leaves nothing behind at `to`.
fn copy_then_remove(from: &Path, to: &Path) -> io::Result<PlacementAction> {
    copy_preserving(from, to)?;
    if let Err(err) = fs::remove_file(from) {
        let _ = fs::remove_file(to);
        return Err(err);
    }
    Ok(PlacementAction::Moved)
}

fn copy_preserving(from: &Path, to: &Path) -> io::Result<PlacementAction> {
    let mut reader = File::open(from)?;
    let metadata = reader.metadata()?;
    let mut writer = OpenOptions::new().write(true).create_new(true).open(to)?;

    let result = (|| {
        io::copy(&mut reader, &mut writer)?;
        let mut times = FileTimes::new();
        if let Ok(modified) = metadata.modified() {
            times = times.set_modified(modified);
        }
        if let Ok(accessed) = metadata.accessed() {
            times = times.set_accessed(accessed);
        }
        writer.set_times(times)?;
        writer.set_permissions(metadata.permissions())
    })();

    if let Err(err) = result {
        drop(writer);
        let _ = fs::remove_file(to);
        return Err(err);
    }
    Ok(PlacementAction::Copied)
}
