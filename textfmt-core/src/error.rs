use std::{
    io,
    path::{Path, PathBuf},
};

/// Boxed error reported by a [`Transform`](crate::Transform) implementation.
pub type TransformError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from normalizing a stream or updating a file.
///
/// Messages describe the failed step only; the underlying cause is the error's
/// [`source`](std::error::Error::source).
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input stream could not be read.
    #[error("unable to read input")]
    Read(#[source] io::Error),

    /// The output sink rejected a write or flush.
    #[error("unable to write output")]
    Write(#[source] io::Error),

    /// The target is missing, unreadable, or not a regular file.
    #[error("unable to open file")]
    Open {
        /// Target file being updated.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },

    /// No staging file could be created.
    #[error("unable to create staging file in {}", dir.display())]
    StagingCreate {
        /// Target file being updated.
        path: PathBuf,
        /// Directory the staging file was to be created in.
        dir: PathBuf,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },

    /// The transform reported an error; the staged output was discarded.
    #[error("transform failed, file left untouched")]
    Transform {
        /// Target file being updated.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: TransformError,
    },

    /// Staged bytes could not be flushed and synced.
    #[error("unable to finalize staging file, file left untouched")]
    Finalize {
        /// Target file being updated.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },

    /// The target could not be replaced with the staged content.
    #[error("unable to commit staged content")]
    Commit {
        /// Target file being updated.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// The target file this error refers to, if it happened while updating a file.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Open { path, .. }
            | Self::StagingCreate { path, .. }
            | Self::Transform { path, .. }
            | Self::Finalize { path, .. }
            | Self::Commit { path, .. } => Some(path),
            Self::Read(_) | Self::Write(_) => None,
        }
    }

    /// Whether the target file is guaranteed to still hold its original content.
    ///
    /// Only a failed commit can leave the target in a state other than the original.
    #[must_use]
    pub fn target_untouched(&self) -> bool {
        !matches!(self, Self::Commit { .. })
    }
}
