//! Error types for manifest loading and version manipulation.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, transforming or saving a workspace.
#[derive(Debug, Error)]
pub enum VersionError {
    #[error("manifest not found: {}", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("failed to parse {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    #[error("invalid version `{version}`: {message}")]
    InvalidVersion { version: String, message: String },

    #[error("missing `{field}` in {}", path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("workspace member `{name}` is declared twice ({} and {})", first.display(), second.display())]
    DuplicateMember {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("invalid member pattern `{pattern}`: {message}")]
    MemberPattern { pattern: String, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VersionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_version(version: &str, err: impl std::fmt::Display) -> Self {
        Self::InvalidVersion {
            version: version.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VersionError>;
