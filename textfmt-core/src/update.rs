use std::{
    fs::{self, File, OpenOptions, Permissions},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;

use crate::{Error, Transform};

const STAGING_PREFIX: &str = ".textfmt-";
const STAGING_SUFFIX: &str = ".tmp";

/// How staged content replaces the target file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommitStrategy {
    /// Rename the staging file onto the target after re-applying the target's
    /// permission bits. Readers see either the old or the new file, never a
    /// partially written one. The staging directory must be on the same
    /// filesystem as the target.
    #[default]
    Rename,

    /// Truncate the target and copy the staged bytes into it. The target keeps
    /// its inode, links and ownership, but a concurrent reader can observe it
    /// truncated while the copy is in progress.
    Copy,
}

/// Options for [`update`].
///
/// Use [`Options::builder()`] to construct an instance.
///
/// # Example
///
/// ```
/// use textfmt_core::{CommitStrategy, Options};
///
/// let options = Options::builder()
///     .staging_dir("/var/tmp")
///     .commit_strategy(CommitStrategy::Copy)
///     .build();
/// assert_eq!(options.commit_strategy(), CommitStrategy::Copy);
/// ```
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct Options {
    staging_dir: Option<PathBuf>,
    commit_strategy: CommitStrategy,
}

impl Options {
    /// Create a new builder with default values.
    #[must_use]
    pub fn builder() -> OptionsBuilder {
        OptionsBuilder::default()
    }

    /// Directory staging files are created in.
    ///
    /// `None` means the directory containing the target file.
    #[must_use]
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging_dir.as_deref()
    }

    /// Get the commit strategy.
    #[must_use]
    pub fn commit_strategy(&self) -> CommitStrategy {
        self.commit_strategy
    }
}

/// Builder for [`Options`].
#[derive(Debug, Default, Clone)]
pub struct OptionsBuilder {
    staging_dir: Option<PathBuf>,
    commit_strategy: CommitStrategy,
}

impl OptionsBuilder {
    /// Create staging files in `dir` instead of next to the target.
    #[must_use]
    pub fn staging_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    /// Set the commit strategy.
    #[must_use]
    pub fn commit_strategy(mut self, strategy: CommitStrategy) -> Self {
        self.commit_strategy = strategy;
        self
    }

    /// Build the [`Options`] instance.
    #[must_use]
    pub fn build(self) -> Options {
        Options {
            staging_dir: self.staging_dir,
            commit_strategy: self.commit_strategy,
        }
    }
}

/// Replace the content of the file at `path` with the output of `transform`.
///
/// The transform reads the current content and writes into a freshly created
/// staging file. Only once the transform succeeded and the staged bytes are synced
/// to disk is the target replaced, using the configured [`CommitStrategy`]. The
/// target's permission bits are kept either way, and the staging file never
/// outlives the call.
///
/// Symlinks are resolved first, so updating through a link rewrites the file it
/// points to and leaves the link in place.
///
/// # Errors
///
/// - [`Error::Open`] if `path` does not exist, cannot be read, or is not a regular file
/// - [`Error::StagingCreate`] if the staging file cannot be created
/// - [`Error::Transform`] if `transform` fails
/// - [`Error::Finalize`] if the staged bytes cannot be flushed and synced
/// - [`Error::Commit`] if the target cannot be replaced
///
/// The target is left untouched for every error except [`Error::Commit`]. A failed
/// rename leaves the original in place; a failed copy may leave it truncated or
/// partially rewritten.
#[tracing::instrument(skip_all, fields(path = %path.display(), commit = ?options.commit_strategy))]
pub fn update<T: Transform>(path: &Path, transform: &T, options: &Options) -> Result<(), Error> {
    let open_error = |source: io::Error| Error::Open {
        path: path.to_path_buf(),
        source,
    };
    let target = fs::canonicalize(path).map_err(open_error)?;
    let original = File::open(&target).map_err(open_error)?;
    let metadata = original.metadata().map_err(open_error)?;
    if !metadata.is_file() {
        return Err(open_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    let permissions = metadata.permissions();

    let staging_dir = options
        .staging_dir
        .clone()
        .unwrap_or_else(|| default_staging_dir(&target));
    let mut staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(&staging_dir)
        .map_err(|source| Error::StagingCreate {
            path: path.to_path_buf(),
            dir: staging_dir.clone(),
            source,
        })?;
    tracing::debug!(staging = %staging.path().display(), "staging file created");

    let finalize_error = |source: io::Error| Error::Finalize {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(staging.as_file_mut());
    transform
        .transform(BufReader::new(&original), &mut writer)
        .map_err(|source| Error::Transform {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
    drop(original);
    tracing::debug!("transform done");

    writer.flush().map_err(finalize_error)?;
    drop(writer);
    staging.as_file().sync_all().map_err(finalize_error)?;

    match options.commit_strategy {
        CommitStrategy::Rename => rename_commit(staging, &target, permissions),
        CommitStrategy::Copy => copy_commit(staging, &target),
    }
    .map_err(|source| Error::Commit {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("committed staged content");

    Ok(())
}

fn default_staging_dir(target: &Path) -> PathBuf {
    target
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

fn rename_commit(staging: NamedTempFile, target: &Path, permissions: Permissions) -> io::Result<()> {
    staging.as_file().set_permissions(permissions)?;
    // On failure the returned handle is dropped, which removes the staging file.
    staging.persist(target).map_err(|err| err.error)?;
    sync_parent_dir(target);
    Ok(())
}

fn copy_commit(staging: NamedTempFile, target: &Path) -> io::Result<()> {
    let mut staged = staging.reopen()?;
    let mut file = OpenOptions::new().write(true).truncate(true).open(target)?;
    io::copy(&mut staged, &mut file)?;
    file.sync_all()?;
    drop(staged);
    remove_staging(staging);
    Ok(())
}

fn remove_staging(staging: NamedTempFile) {
    let staging_path = staging.path().to_path_buf();
    match staging.close() {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            tracing::warn!(%error, staging = %staging_path.display(), "unable to remove staging file");
        }
    }
}

/// Make the rename itself durable. A failure here does not undo the commit.
#[cfg(unix)]
fn sync_parent_dir(target: &Path) {
    let Some(dir) = target.parent() else {
        return;
    };
    if let Err(error) = File::open(dir).and_then(|dir| dir.sync_all()) {
        tracing::warn!(%error, dir = %dir.display(), "unable to sync directory after rename");
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_target: &Path) {}
