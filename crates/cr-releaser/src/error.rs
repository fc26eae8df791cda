//! Releaser error types

use std::path::PathBuf;
use thiserror::Error;

use cr_core::CoreError;
use cr_forge::ForgeError;

/// Broad category of a failure, used to pick exit codes and messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad options, no packages, malformed template or URL
    Input,
    /// An archive is not a chart package, or the index is unreadable
    Metadata,
    /// Forge API, upload or download failure
    Network,
    /// Local filesystem failure
    Io,
    /// A git command failed
    VersionControl,
}

#[derive(Error, Debug)]
pub enum ReleaserError {
    #[error("no charts found at {}", path.display())]
    NoCharts { path: PathBuf },

    #[error("invalid release name template {template:?}: {message}")]
    InvalidTemplate { template: String, message: String },

    #[error("invalid URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("{}: {source}", path.display())]
    Chart {
        path: PathBuf,
        #[source]
        source: CoreError,
    },

    #[error("index {}: {source}", path.display())]
    Index {
        path: PathBuf,
        #[source]
        source: CoreError,
    },

    #[error("error creating GitHub release {name}: {source}")]
    Release {
        name: String,
        #[source]
        source: ForgeError,
    },

    #[error("error downloading {url}: {message}")]
    Download { url: String, message: String },

    #[error(transparent)]
    Forge(#[from] ForgeError),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReleaserError {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoCharts { .. } | Self::InvalidTemplate { .. } | Self::InvalidUrl { .. } => {
                ErrorKind::Input
            }
            Self::Chart { .. } => ErrorKind::Metadata,
            Self::Index { source, .. } => match source {
                CoreError::Io(_) => ErrorKind::Io,
                _ => ErrorKind::Metadata,
            },
            Self::Release { source, .. } | Self::Forge(source) => forge_kind(source),
            Self::Download { .. } => ErrorKind::Network,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn forge_kind(error: &ForgeError) -> ErrorKind {
    match error {
        ForgeError::GitFailed { .. } | ForgeError::InvalidRemote { .. } => {
            ErrorKind::VersionControl
        }
        ForgeError::InvalidUrl { .. } => ErrorKind::Input,
        ForgeError::Io(_) => ErrorKind::Io,
        _ => ErrorKind::Network,
    }
}

pub type Result<T> = std::result::Result<T, ReleaserError>;
