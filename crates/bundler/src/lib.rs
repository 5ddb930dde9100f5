//! Organizes audio files into `[Genre/]Artist/Album` trees and writes M3U
//! playlists for Rockbox-style players.
//!
//! All operations are synchronous and single-threaded. Callers that need a
//! responsive UI should run them on a worker thread.

pub mod bundle;
pub mod components;
mod error;
pub mod export;
pub mod m3u;
pub mod organize;
pub mod placement;
pub mod sanitize;
pub mod walk;

#[cfg(test)]
mod test_support;

pub use bundle::{bundle, BundleOptions, DedupIndex};
pub use components::derive_components;
pub use error::BundlerError;
pub use export::export_playlists;
pub use organize::{organize, OrganizeOptions};
pub use placement::{place, Placement};
pub use sanitize::{format_track_number, primary_artist, sanitize_component};
