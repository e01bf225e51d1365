//! Core of the `textfmt` normalizer.
//!
//! This crate provides the two pieces the CLI is built from:
//!
//! - [`normalize`] - strips trailing whitespace (space, tab, U+3000) from every line
//!   and drops trailing blank lines, always ending non-empty output with a newline
//! - [`update`] - replaces a file's content with the output of a [`Transform`]
//!   through a staging file, so the target is either fully original or fully updated
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use textfmt_core::{CommitStrategy, Normalize, Options};
//!
//! let options = Options::builder()
//!     .commit_strategy(CommitStrategy::Rename)
//!     .build();
//! textfmt_core::update(Path::new("notes.txt"), &Normalize, &options)?;
//! # Ok::<(), textfmt_core::Error>(())
//! ```

use std::io::{BufRead, Write};

mod error;
mod normalize;
mod update;

pub use error::{Error, TransformError};
pub use normalize::{Normalize, normalize};
pub use update::{CommitStrategy, Options, OptionsBuilder, update};

/// A pass that reads a whole input and writes its replacement.
///
/// [`update`] runs a transform exactly once per call, with the original file as
/// `input` and a staging file as `output`. Anything written before an error is
/// discarded along with the staging file.
pub trait Transform {
    /// The error type reported when the transform cannot complete.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read all of `input` and write the transformed content to `output`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, the output cannot be
    /// written, or the content is rejected by the transform.
    fn transform<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<(), Self::Error>;
}
