use std::path::PathBuf;

#[derive(Debug)]
pub enum BundlerError {
    Io(std::io::Error),
    NotADirectory(PathBuf),
    NoSources,
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    Transfer {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    Playlist {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl BundlerError {
    /// True for errors raised before any file is touched.
    pub fn is_validation(&self) -> bool {
        matches!(self, BundlerError::NotADirectory(_) | BundlerError::NoSources)
    }
}

impl std::fmt::Display for BundlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BundlerError::Io(err) => write!(f, "io error: {}", err),
            BundlerError::NotADirectory(path) => write!(f, "{} is not a directory", path.display()),
            BundlerError::NoSources => {
                write!(f, "Provide at least one album directory or playlist directory.")
            }
            BundlerError::CreateDir { path, source } => {
                write!(f, "failed to create {}: {}", path.display(), source)
            }
            BundlerError::Transfer { from, to, source } => write!(
                f,
                "failed to transfer {} to {}: {}",
                from.display(),
                to.display(),
                source
            ),
            BundlerError::Playlist { path, source } => {
                write!(f, "failed to write playlist {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for BundlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BundlerError::Io(err) => Some(err),
            BundlerError::CreateDir { source, .. }
            | BundlerError::Transfer { source, .. }
            | BundlerError::Playlist { source, .. } => Some(source),
            BundlerError::NotADirectory(_) | BundlerError::NoSources => None,
        }
    }
}

impl From<std::io::Error> for BundlerError {
    fn from(err: std::io::Error) -> Self {
        BundlerError::Io(err)
    }
}
