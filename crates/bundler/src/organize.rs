use std::fs;
use std::path::Path;

use common::{absolutize, ExtensionSet, PlacementOutcome};
use metadata::TagReader;
use tracing::{info, warn};

use crate::components::derive_components;
use crate::placement::place;
use crate::walk::{files_recursive, immediate_files};
use crate::BundlerError;

#[derive(Clone, Debug)]
pub struct OrganizeOptions {
    pub move_files: bool,
    pub include_genre: bool,
    pub extensions: ExtensionSet,
    pub recursive: bool,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            move_files: false,
            include_genre: false,
            extensions: ExtensionSet::default(),
            recursive: true,
        }
    }
}

/// Sorts the audio files under `source` into `destination/[Genre/]Artist/Album`.
pub fn organize(
    source: &Path,
    destination: &Path,
    options: &OrganizeOptions,
    reader: &dyn TagReader,
) -> Result<Vec<PlacementOutcome>, BundlerError> {
    let source = absolutize(source)?;
    if !source.is_dir() {
        return Err(BundlerError::NotADirectory(source));
    }
    let destination = absolutize(destination)?;
    fs::create_dir_all(&destination).map_err(|err| BundlerError::CreateDir {
        path: destination.clone(),
        source: err,
    })?;

    let candidates = if options.recursive {
        files_recursive(&source)
    } else {
        immediate_files(&source)
    };
    let files: Vec<_> = candidates
        .into_iter()
        .filter(|path| options.extensions.matches(path))
        .collect();
    info!("Organizing {} files from {:?}", files.len(), source);

    let mut results = Vec::with_capacity(files.len());
    for file in files {
        let tags = reader.read_tags(&file);
        let components = derive_components(&file, &tags, options.include_genre);
        match place(
            &file,
            &destination,
            &components,
            options.include_genre,
            options.move_files,
        ) {
            Ok(placement) => results.push(PlacementOutcome::placed(
                file,
                placement.destination,
                placement.action,
                components,
            )),
            Err(err) => {
                warn!("Failed to organize {:?}: {}", file, err);
                results.push(PlacementOutcome::failed(file, err.to_string()));
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTags;
    use common::PlacementAction;
    use metadata::NullTagReader;
    use tempfile::TempDir;

    #[test]
    fn copies_into_genre_artist_album() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("unsorted");
        fs::create_dir(&source).unwrap();
        let track = source.join("track.flac");
        fs::write(&track, b"audio").unwrap();
        let destination = dir.path().join("sorted");

        let reader = FakeTags::new().with(
            "track.flac",
            "AC/DC",
            "Back In Black",
            "Hells Bells",
            Some("1"),
            Some("Rock"),
        );
        let options = OrganizeOptions {
            include_genre: true,
            recursive: false,
            ..OrganizeOptions::default()
        };
        let results = organize(&source, &destination, &options, &reader).unwrap();

        assert_eq!(results.len(), 1);
        let dest = results[0].destination.clone().unwrap();
        let root = destination.canonicalize().unwrap();
        assert_eq!(dest.parent().unwrap(), root.join("Rock").join("AC DC").join("Back In Black"));
        assert!(dest
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("01 - Hells Bells"));
        assert_eq!(results[0].action, PlacementAction::Copied);
        assert!(track.exists());
    }

    #[test]
    fn moves_and_numbers_duplicates() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("unsorted");
        fs::create_dir(&source).unwrap();
        let first = source.join("track1.flac");
        let second = source.join("track2.flac");
        fs::write(&first, b"audio1").unwrap();
        fs::write(&second, b"audio2").unwrap();
        let destination = dir.path().join("sorted");

        let reader = FakeTags::new().fallback(
            "Miles Davis",
            "Kind of Blue",
            "So What",
            Some("1"),
            Some("Jazz"),
        );
        let options = OrganizeOptions {
            move_files: true,
            ..OrganizeOptions::default()
        };
        let results = organize(&source, &destination, &options, &reader).unwrap();

        assert_eq!(results.len(), 2);
        let root = destination.canonicalize().unwrap();
        let mut names = Vec::new();
        for result in &results {
            assert_eq!(result.action, PlacementAction::Moved);
            let dest = result.destination.as_ref().unwrap();
            assert_eq!(dest.parent().unwrap(), root.join("Miles Davis").join("Kind of Blue"));
            names.push(dest.file_name().unwrap().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["01 - So What.flac", "01 - So What (1).flac"]);
        assert!(!first.exists());
        assert!(!second.exists());
    }

    #[test]
    fn filename_supplies_track_number() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("unsorted");
        fs::create_dir(&source).unwrap();
        fs::write(source.join("03 - Mystery Song.flac"), b"audio").unwrap();
        fs::write(source.join("notes.txt"), b"text").unwrap();

        let results = organize(
            &source,
            &dir.path().join("sorted"),
            &OrganizeOptions::default(),
            &NullTagReader,
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        let dest = results[0].destination.as_ref().unwrap();
        assert!(dest.ends_with("Unknown Artist/Unknown Album/03 - 03 - Mystery Song.flac"));
    }

    #[test]
    fn non_recursive_skips_nested_files() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("unsorted");
        fs::create_dir_all(source.join("deep")).unwrap();
        fs::write(source.join("deep").join("a.mp3"), b"audio").unwrap();

        let options = OrganizeOptions {
            recursive: false,
            ..OrganizeOptions::default()
        };
        let results = organize(&source, &dir.path().join("out"), &options, &NullTagReader).unwrap();
        assert!(results.is_empty());

        let results = organize(
            &source,
            &dir.path().join("out"),
            &OrganizeOptions::default(),
            &NullTagReader,
        )
        .unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn rejects_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = organize(
            &dir.path().join("nope"),
            &dir.path().join("out"),
            &OrganizeOptions::default(),
            &NullTagReader,
        )
        .unwrap_err();
        assert!(err.is_validation());
        assert!(!dir.path().join("out").exists());
    }
}
