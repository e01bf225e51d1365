use std::{
    io::{self, BufWriter},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use textfmt_core::Options;

mod run;

/// Strips trailing whitespace and trailing blank lines.
///
/// Without arguments, reads standard input and writes the result to standard
/// output. With arguments, rewrites each file in place, stopping at the first one
/// that fails.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files to format in place
    files: Vec<PathBuf>,
}

fn setup_logging() {
    use tracing_subscriber::{EnvFilter, prelude::*};

    // Diagnostics on stderr are part of the interface, so logging stays off unless asked for.
    if let Ok(filter) = EnvFilter::try_from_env("TEXTFMT_LOG") {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(io::IsTerminal::is_terminal(&io::stderr()))
            .with_timer(tracing_subscriber::fmt::time::Uptime::default())
            .with_filter(filter);

        tracing_subscriber::registry().with(layer).init();
    }
}

fn main() -> ExitCode {
    setup_logging();

    let args = Args::parse();

    let result = if args.files.is_empty() {
        let stdin = io::stdin();
        let stdout = io::stdout();
        run::format_stream(stdin.lock(), BufWriter::new(stdout.lock()))
    } else {
        run::format_files(&args.files, &Options::default())
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error:#}");
            ExitCode::FAILURE
        }
    }
}
