use std::io::{BufRead, Write};

use crate::{Error, Transform};

/// Whitespace stripped from the end of every line: space, tab and the
/// ideographic space (U+3000).
const TRAILING_WHITESPACE: [&[u8]; 3] = [b" ", b"\t", "\u{3000}".as_bytes()];

/// The normalization pass as a [`Transform`], for use with [`update`](crate::update).
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalize;

impl Transform for Normalize {
    type Error = Error;

    fn transform<R: BufRead, W: Write>(&self, input: R, output: W) -> Result<(), Error> {
        normalize(input, output)
    }
}

/// Normalize `input` into `output`.
///
/// The input is split on `\n` (a `\r` right before the line break is dropped with
/// it), trailing space, tab and U+3000 are trimmed from each line, and trailing
/// empty lines are removed. Every remaining line is written followed by `\n`. An
/// input made only of blank lines produces no output at all.
///
/// Lines are handled as bytes, so input that is not valid UTF-8 passes through
/// untouched apart from the trimming.
///
/// # Errors
///
/// Returns [`Error::Read`] if `input` fails and [`Error::Write`] if `output` fails.
#[tracing::instrument(level = "trace", skip_all)]
pub fn normalize<R: BufRead, W: Write>(input: R, mut output: W) -> Result<(), Error> {
    let mut lines = Vec::new();
    for line in input.split(b'\n') {
        let mut line = line.map_err(Error::Read)?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        let len = trim_line_end(&line).len();
        line.truncate(len);
        lines.push(line);
    }

    while lines.last().is_some_and(Vec::is_empty) {
        lines.pop();
    }
    tracing::trace!(lines = lines.len(), "normalized");

    for line in &lines {
        output.write_all(line).map_err(Error::Write)?;
        output.write_all(b"\n").map_err(Error::Write)?;
    }
    output.flush().map_err(Error::Write)
}

fn trim_line_end(mut line: &[u8]) -> &[u8] {
    'trim: loop {
        for whitespace in TRAILING_WHITESPACE {
            if let Some(rest) = line.strip_suffix(whitespace) {
                line = rest;
                continue 'trim;
            }
        }
        return line;
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn run(input: &[u8]) -> Result<Vec<u8>, Error> {
        let mut output = Vec::new();
        normalize(input, &mut output)?;
        Ok(output)
    }

    #[rstest]
    #[case::empty("", "")]
    #[case::no_final_newline("これはテストです。", "これはテストです。\n")]
    #[case::trailing_blank_lines("これはテストです。\n\n\n", "これはテストです。\n")]
    #[case::several_lines("line1\nline2\n\n", "line1\nline2\n")]
    #[case::only_blank_lines("\n\n\n", "")]
    #[case::trailing_space_and_tab("trailing   \t", "trailing\n")]
    #[case::full_width_space("全角\u{3000}\u{3000}\n", "全角\n")]
    #[case::mixed_whitespace("a \u{3000}\t \nb\n", "a\nb\n")]
    #[case::whitespace_only_lines_at_end("a\n  \n\t\n\u{3000}\n", "a\n")]
    #[case::interior_blank_lines_kept("a\n\n\nb\n", "a\n\n\nb\n")]
    #[case::leading_whitespace_kept("  indented  \n", "  indented\n")]
    #[case::crlf("one \r\ntwo\r\n\r\n", "one\ntwo\n")]
    #[case::lone_carriage_return_at_end("last\r", "last\n")]
    #[case::no_break_space_kept("nbsp\u{a0}\n", "nbsp\u{a0}\n")]
    fn normalizes(#[case] input: &str, #[case] expected: &str) -> Result<(), Error> {
        let output = run(input.as_bytes())?;
        assert_eq!(String::from_utf8_lossy(&output), expected);
        Ok(())
    }

    #[rstest]
    #[case("")]
    #[case("\n\n")]
    #[case("a  \n\n b\t\n\n\n")]
    #[case("x\r\ny \u{3000}\r\n")]
    #[case("#!/bin/sh\necho test")]
    fn is_idempotent(#[case] input: &str) -> Result<(), Error> {
        let once = run(input.as_bytes())?;
        let twice = run(&once)?;
        assert_eq!(once, twice);
        Ok(())
    }

    #[rstest]
    #[case("a  \n\n b\t\n\n\n")]
    #[case("no newline \t")]
    #[case("\u{3000}\n x \n")]
    fn output_has_no_trailing_whitespace_or_blank_tail(#[case] input: &str) -> Result<(), Error> {
        let output = String::from_utf8_lossy(&run(input.as_bytes())?).into_owned();
        assert!(output.ends_with('\n'));
        assert!(!output.ends_with("\n\n"));
        for line in output.lines() {
            assert_eq!(line, line.trim_end_matches([' ', '\t', '\u{3000}']));
        }
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_trimmed_bytewise() -> Result<(), Error> {
        let output = run(b"\xff\xfe  \n\n")?;
        assert_eq!(output, b"\xff\xfe\n");
        Ok(())
    }

    struct FailingReader;

    impl io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device unplugged"))
        }
    }

    #[test]
    fn read_failure_is_reported() {
        let mut output = Vec::new();
        let result = normalize(io::BufReader::new(FailingReader), &mut output);
        assert!(matches!(result, Err(Error::Read(_))));
        assert!(output.is_empty());
    }

    struct FullSink;

    impl io::Write for FullSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::StorageFull))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_is_reported() {
        let result = normalize(&b"text\n"[..], FullSink);
        assert!(matches!(result, Err(Error::Write(_))));
    }

    #[test]
    fn trims_repeated_mixed_whitespace() {
        assert_eq!(trim_line_end("x \t\u{3000} \t".as_bytes()), b"x");
        assert_eq!(trim_line_end(b" \t"), b"");
    }
}
