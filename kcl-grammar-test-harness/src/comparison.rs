//! Comparison of captured output against golden results.

use std::path::PathBuf;

/// Outcome of comparing output line-by-line against a golden result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineComparison {
    /// Every line matches.
    Matches,
    /// The line sequences differ.
    Differs {
        /// Lines of the golden result.
        expected: Vec<String>,
        /// Lines of the actual output.
        actual: Vec<String>,
    },
    /// The actual output does not end with a newline.
    MissingTrailingNewline {
        /// Lines of the actual output.
        actual: Vec<String>,
    },
    /// The actual output is not valid UTF-8.
    InvalidUtf8 {
        /// Byte offset of the first invalid sequence.
        valid_up_to: usize,
    },
    /// The generated golden output is not valid UTF-8.
    InvalidGoldenUtf8 {
        /// Byte offset of the first invalid sequence.
        valid_up_to: usize,
    },
}

impl LineComparison {
    /// Returns whether this comparison indicates a failure.
    pub const fn is_failure(&self) -> bool {
        !matches!(self, Self::Matches)
    }
}

fn split_output(output: &[u8]) -> Result<Vec<String>, std::str::Utf8Error> {
    Ok(std::str::from_utf8(output)?
        .split('\n')
        .map(String::from)
        .collect())
}

fn invalid_utf8(err: std::str::Utf8Error) -> LineComparison {
    LineComparison::InvalidUtf8 {
        valid_up_to: err.valid_up_to(),
    }
}

/// Splits golden file text into lines the way a text-mode line reader would:
/// `\r\n` and `\r` count as newlines, and each line loses its terminator.
fn split_golden_lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = normalized.split('\n').map(String::from).collect();

    // A final newline terminates the last line; it doesn't start another one.
    if normalized.is_empty() || normalized.ends_with('\n') {
        lines.pop();
    }

    lines
}

/// Compares actual output against output produced by a golden generator.
///
/// Both sides are split on `\n` and compared element-wise, so trailing newlines must
/// agree exactly. Output on either side that is not valid UTF-8 never matches.
pub fn compare_results(actual: &[u8], generated: &[u8]) -> LineComparison {
    let actual_lines = match split_output(actual) {
        Ok(lines) => lines,
        Err(err) => return invalid_utf8(err),
    };
    let expected_lines = match split_output(generated) {
        Ok(lines) => lines,
        Err(err) => {
            return LineComparison::InvalidGoldenUtf8 {
                valid_up_to: err.valid_up_to(),
            };
        }
    };

    if actual_lines == expected_lines {
        LineComparison::Matches
    } else {
        LineComparison::Differs {
            expected: expected_lines,
            actual: actual_lines,
        }
    }
}

/// Compares actual output against the contents of a static golden file.
///
/// The actual output must end with a newline; the golden file's last line may omit it.
pub fn compare_results_with_lines(actual: &[u8], golden_text: &str) -> LineComparison {
    let actual_lines = match split_output(actual) {
        Ok(lines) => lines,
        Err(err) => return invalid_utf8(err),
    };

    if actual_lines.last().is_none_or(|last| !last.is_empty()) {
        return LineComparison::MissingTrailingNewline {
            actual: actual_lines,
        };
    }

    let mut expected_lines = split_golden_lines(golden_text);
    expected_lines.push(String::new());

    if actual_lines == expected_lines {
        LineComparison::Matches
    } else {
        LineComparison::Differs {
            expected: expected_lines,
            actual: actual_lines,
        }
    }
}

/// Result of checking one output channel of a test case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelComparison {
    /// Neither a generator script nor a static golden file exists.
    Skipped,
    /// Output was compared against a golden result.
    Compared {
        /// The generator script or static golden file that was used.
        golden: PathBuf,
        /// Outcome of the line comparison.
        result: LineComparison,
    },
    /// Output matched the static golden file, but the exit code was wrong.
    ExitCodeMismatch {
        /// The static golden file that was used.
        golden: PathBuf,
        /// The required exit code.
        expected: i32,
        /// The actual exit code.
        actual: i32,
    },
    /// The golden generator script exited with a non-zero code.
    GeneratorFailed {
        /// Path to the generator script.
        script: PathBuf,
        /// Its exit code.
        exit_code: i32,
        /// What it wrote to stderr.
        stderr: String,
    },
}

impl ChannelComparison {
    /// Returns whether this comparison indicates a failure.
    pub const fn is_failure(&self) -> bool {
        match self {
            Self::Skipped => false,
            Self::Compared { result, .. } => result.is_failure(),
            Self::ExitCodeMismatch { .. } | Self::GeneratorFailed { .. } => true,
        }
    }
}

/// Combined result of checking all channels of a test case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestComparison {
    /// Comparison of stdout.
    pub stdout: ChannelComparison,
    /// Comparison of stderr.
    pub stderr: ChannelComparison,
}

impl TestComparison {
    /// Returns whether this comparison indicates a failure.
    pub const fn is_failure(&self) -> bool {
        self.stdout.is_failure() || self.stderr.is_failure()
    }

    /// Returns the comparison for the given channel.
    pub const fn channel(&self, channel: crate::testcase::Channel) -> &ChannelComparison {
        match channel {
            crate::testcase::Channel::Stdout => &self.stdout,
            crate::testcase::Channel::Stderr => &self.stderr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identical_output_matches_golden() {
        assert_eq!(
            compare_results_with_lines(b"hello\n", "hello\n"),
            LineComparison::Matches
        );
    }

    #[test]
    fn test_golden_without_final_newline_still_matches() {
        assert_eq!(
            compare_results_with_lines(b"a\nb\n", "a\nb"),
            LineComparison::Matches
        );
    }

    #[test]
    fn test_missing_trailing_newline_fails() {
        assert_eq!(
            compare_results_with_lines(b"hello", "hello\n"),
            LineComparison::MissingTrailingNewline {
                actual: vec![String::from("hello")],
            }
        );
    }

    #[test]
    fn test_missing_trailing_newline_fails_even_if_golden_agrees() {
        assert!(compare_results_with_lines(b"hello", "hello").is_failure());
    }

    #[test]
    fn test_empty_output_matches_empty_golden() {
        assert_eq!(
            compare_results_with_lines(b"", ""),
            LineComparison::Matches
        );
    }

    #[test]
    fn test_blank_lines_are_significant() {
        assert_eq!(
            compare_results_with_lines(b"a\n\n", "a\n\n"),
            LineComparison::Matches
        );
        assert_eq!(
            compare_results_with_lines(b"a\n\n", "a\n"),
            LineComparison::Differs {
                expected: vec![String::from("a"), String::new()],
                actual: vec![String::from("a"), String::new(), String::new()],
            }
        );
    }

    #[test]
    fn test_crlf_golden_lines() {
        assert_eq!(
            compare_results_with_lines(b"x: 1\ny: 2\n", "x: 1\r\ny: 2\r\n"),
            LineComparison::Matches
        );
    }

    #[test]
    fn test_content_mismatch() {
        assert_eq!(
            compare_results_with_lines(b"a = 1\n", "a = 2\n"),
            LineComparison::Differs {
                expected: vec![String::from("a = 2"), String::new()],
                actual: vec![String::from("a = 1"), String::new()],
            }
        );
    }

    #[test]
    fn test_generated_comparison_is_exact() {
        assert_eq!(compare_results(b"a\nb\n", b"a\nb\n"), LineComparison::Matches);
        assert_eq!(compare_results(b"a\nb", b"a\nb"), LineComparison::Matches);
        assert!(compare_results(b"a\nb", b"a\nb\n").is_failure());
    }

    #[test]
    fn test_invalid_utf8_output_never_matches() {
        assert_eq!(
            compare_results_with_lines(b"x\xff\n", "x\u{FFFD}\n"),
            LineComparison::InvalidUtf8 { valid_up_to: 1 }
        );
        assert_eq!(
            compare_results(b"ok\n\xfe", b"ok\n\xfe"),
            LineComparison::InvalidUtf8 { valid_up_to: 3 }
        );
        assert_eq!(
            compare_results("x\u{FFFD}\n".as_bytes(), b"x\xff\n"),
            LineComparison::InvalidGoldenUtf8 { valid_up_to: 1 }
        );
    }

    #[test]
    fn test_channel_failure_states() {
        assert!(!ChannelComparison::Skipped.is_failure());
        assert!(
            ChannelComparison::ExitCodeMismatch {
                golden: PathBuf::from("stderr.golden"),
                expected: 1,
                actual: 0,
            }
            .is_failure()
        );
        assert!(
            !ChannelComparison::Compared {
                golden: PathBuf::from("stdout.golden"),
                result: LineComparison::Matches,
            }
            .is_failure()
        );
    }
}
