use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use textfmt_core::{Normalize, Options};

/// Normalize `input` into `output`. Used for the stdin-to-stdout mode.
#[tracing::instrument(skip_all)]
pub(crate) fn format_stream<R: BufRead, W: Write>(input: R, output: W) -> Result<()> {
    textfmt_core::normalize(input, output)?;
    Ok(())
}

/// Update every file in order, stopping at the first failure.
///
/// The returned error carries the failing path as context, so its alternate
/// rendering reads `<path>: <message>: <cause>`.
#[tracing::instrument(skip_all, fields(files = files.len()))]
pub(crate) fn format_files(files: &[PathBuf], options: &Options) -> Result<()> {
    for file in files {
        textfmt_core::update(file, &Normalize, options)
            .with_context(|| file.display().to_string())?;
        tracing::debug!(file = %file.display(), "formatted");
    }
    Ok(())
}
