mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bundler::{bundle, export_playlists, organize, BundleOptions, BundlerError, OrganizeOptions};
use clap::{Parser, Subcommand};
use common::{count_actions, ActionCounts, BundleOutcome, ExtensionSet, PlacementOutcome};
use config::{config_path, load_config, save_config, BundlerConfig};
use metadata::LoftyTagReader;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rockbox")]
#[command(about = "Organize music folders and write M3U playlists for Rockbox players")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    /// YAML config file (defaults to rockbox.yaml next to the executable)
    #[arg(long, global = true, env = "ROCKBOX_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write .m3u playlists for the audio files in a directory tree
    Export {
        source: PathBuf,
        /// Directory to write playlists to (defaults to source)
        #[arg(long)]
        destination: Option<PathBuf>,
        /// Comma-separated list of extensions, e.g. "flac,mp3"
        #[arg(long)]
        extensions: Option<String>,
        /// One playlist per subdirectory, mirroring the tree
        #[arg(long)]
        recursive: bool,
    },
    /// Sort audio files into Artist/Album folders
    Organize {
        source: PathBuf,
        destination: PathBuf,
        #[arg(long = "move")]
        move_files: bool,
        #[arg(long)]
        include_genre: bool,
        #[arg(long)]
        extensions: Option<String>,
        #[arg(long)]
        no_recursive: bool,
        #[arg(long)]
        json: bool,
    },
    /// Organize album and playlist folders into a Music/ + Playlists/ bundle
    Bundle {
        destination: PathBuf,
        /// Directory containing albums (repeatable)
        #[arg(long = "albums")]
        albums: Vec<PathBuf>,
        /// Directory containing playlist folders (repeatable)
        #[arg(long = "playlists")]
        playlists: Vec<PathBuf>,
        #[arg(long)]
        include_genre: bool,
        #[arg(long)]
        move_albums: bool,
        #[arg(long)]
        move_playlists: bool,
        #[arg(long)]
        extensions: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Write a config file populated with the defaults
    InitConfig { path: Option<PathBuf> },
}

#[derive(Serialize)]
struct OrganizeReport<'a> {
    results: &'a [PlacementOutcome],
    counts: ActionCounts,
}

#[derive(Serialize)]
struct BundleReport<'a> {
    #[serde(flatten)]
    outcome: &'a BundleOutcome,
    counts: ActionCounts,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config_path = config_path(args.config.clone());
    let (config, loaded) = match load_config(&config_path) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Error: failed to load {}: {}", config_path.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let level = if args.verbose {
        "debug".to_string()
    } else {
        config.log_level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if loaded {
        info!("Loaded config from {:?}", config_path);
    }

    match run(args.command, &config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::from(failure_status(&*err))
        }
    }
}

/// Bad source arguments exit with 2, like a usage error; anything else with 1.
fn failure_status(err: &(dyn std::error::Error + 'static)) -> u8 {
    match err.downcast_ref::<BundlerError>() {
        Some(err) if err.is_validation() => 2,
        _ => 1,
    }
}

fn extensions_or(raw: Option<&str>, config: &BundlerConfig) -> ExtensionSet {
    let extensions = match raw {
        Some(raw) => ExtensionSet::parse_list(raw),
        None => config.extension_set(),
    };
    debug!("Accepted extensions: {}", extensions.iter().collect::<Vec<_>>().join(", "));
    extensions
}

fn run(command: Command, config: &BundlerConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Command::Export {
            source,
            destination,
            extensions,
            recursive,
        } => {
            let extensions = extensions_or(extensions.as_deref(), config);
            let results = export_playlists(
                &source,
                destination.as_deref(),
                &extensions,
                recursive || config.recursive_export,
            )?;
            if results.is_empty() {
                println!("No playlists generated (no matching tracks).");
                return Ok(ExitCode::SUCCESS);
            }
            for result in &results {
                println!(
                    "Created {} ({} tracks)",
                    result.playlist_path.display(),
                    result.track_count
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Organize {
            source,
            destination,
            move_files,
            include_genre,
            extensions,
            no_recursive,
            json,
        } => {
            let options = OrganizeOptions {
                move_files,
                include_genre: include_genre || config.include_genre,
                extensions: extensions_or(extensions.as_deref(), config),
                recursive: !no_recursive,
            };
            let results = organize(&source, &destination, &options, &LoftyTagReader)?;
            let counts = count_actions(&results);

            if json {
                let report = OrganizeReport {
                    results: &results,
                    counts,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if results.is_empty() {
                println!("No matching audio files found.");
            } else {
                for result in &results {
                    print_outcome(result);
                }
                println!(
                    "Completed: {} copied, {} moved, {} errors.",
                    counts.copied, counts.moved, counts.errors
                );
            }
            Ok(exit_code(counts))
        }
        Command::Bundle {
            destination,
            albums,
            playlists,
            include_genre,
            move_albums,
            move_playlists,
            extensions,
            json,
        } => {
            let options = BundleOptions {
                include_genre: include_genre || config.include_genre,
                move_albums: move_albums || config.move_albums,
                move_playlists: move_playlists || config.move_playlists,
                extensions: extensions_or(extensions.as_deref(), config),
            };
            let mut log_progress = |done: usize, total: usize, message: &str| {
                debug!("[{}/{}] {}", done, total, message);
            };
            let callback: &mut dyn FnMut(usize, usize, &str) = &mut log_progress;
            let outcome = bundle(
                &albums,
                &playlists,
                &destination,
                &options,
                &LoftyTagReader,
                Some(callback),
            )?;
            let counts = count_actions(&outcome.music_results);

            if json {
                let report = BundleReport {
                    outcome: &outcome,
                    counts,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if outcome.is_empty() {
                println!("No matching audio files found.");
            } else {
                for failed in outcome.music_results.iter().filter(|r| r.is_error()) {
                    print_outcome(failed);
                }
                for playlist in &outcome.playlist_results {
                    println!(
                        "Playlist: {} ({} tracks)",
                        playlist.playlist_path.display(),
                        playlist.track_count
                    );
                    for missing in &playlist.missing_sources {
                        println!("  ! Skipped {}", missing.display());
                    }
                }
                println!(
                    "Tracks: {} copied, {} moved, {} errors.",
                    counts.copied, counts.moved, counts.errors
                );
            }
            Ok(exit_code(counts))
        }
        Command::InitConfig { path } => {
            let path = path.unwrap_or_else(|| config_path(None));
            write_default_config(&path)?;
            println!("Wrote default config to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn write_default_config(path: &Path) -> Result<(), config::ConfigError> {
    save_config(path, &BundlerConfig::default())
}

fn action_label(outcome: &PlacementOutcome) -> String {
    let mut chars = outcome.action.as_str().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn print_outcome(outcome: &PlacementOutcome) {
    let label = action_label(outcome);
    match &outcome.destination {
        Some(destination) => println!(
            "{}: {} -> {}",
            label,
            outcome.source.display(),
            destination.display()
        ),
        None => println!(
            "{}: {} ({})",
            label,
            outcome.source.display(),
            outcome.reason.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn exit_code(counts: ActionCounts) -> ExitCode {
    if counts.errors > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
