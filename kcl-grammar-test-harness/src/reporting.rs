//! Reporting utilities for test results.

use crate::comparison::{ChannelComparison, LineComparison, TestComparison};
use crate::config::{OutputFormat, TestOptions};
use crate::error::HarnessError;
use crate::execution::RunResult;
use crate::testcase::Channel;
use crate::util::{display_output, write_diff};
use anyhow::Result;
use colored::Colorize;
use std::io::Write;

/// Result of running a single test case.
#[derive(Debug)]
pub struct TestCaseResult {
    /// Name of the test case.
    pub name: String,
    /// Captured result of running the program under test, if it got that far.
    pub run: Option<RunResult>,
    /// The comparison result, or the error that aborted the test case.
    pub outcome: Result<TestComparison, HarnessError>,
    /// Duration of the whole test case.
    pub duration: std::time::Duration,
}

impl TestCaseResult {
    /// Returns whether the test case passed.
    pub fn success(&self) -> bool {
        self.outcome
            .as_ref()
            .is_ok_and(|comparison| !comparison.is_failure())
    }

    /// Reports this result in pretty format.
    pub fn report_pretty(&self, options: &TestOptions) -> Result<()> {
        self.write_details(std::io::stderr(), options)
    }

    /// Writes the details of this result to a writer.
    pub fn write_details<W: Write>(&self, mut writer: W, options: &TestOptions) -> Result<()> {
        let success = self.success();

        if success && !options.verbose && !options.show_output {
            return Ok(());
        }

        write!(
            writer,
            "* {}: [{}]... ",
            "Test case".bright_yellow(),
            self.name.italic()
        )?;

        if success {
            writeln!(writer, "{}", "ok.".bright_green())?;
        } else {
            writeln!(writer)?;
        }

        if !success || options.verbose {
            match &self.outcome {
                Ok(comparison) => {
                    for channel in Channel::ALL {
                        write_channel_details(&mut writer, channel, comparison.channel(channel))?;
                    }
                }
                Err(err) => {
                    writeln!(writer, "    {} {err}", "error:".bright_red())?;
                }
            }
        }

        if !success || options.verbose || options.show_output {
            if let Some(run) = &self.run {
                write_captured_output(&mut writer, run)?;
            }
        }

        if !success {
            writeln!(writer, "    {}", "FAILED.".bright_red())?;
        }

        Ok(())
    }
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy())
        .to_string()
}

fn write_channel_details<W: Write>(
    writer: &mut W,
    channel: Channel,
    comparison: &ChannelComparison,
) -> Result<()> {
    match comparison {
        ChannelComparison::Skipped => {
            writeln!(writer, "      {channel} {}", "skipped (no golden)".cyan())?;
        }
        ChannelComparison::Compared { golden, result } => match result {
            LineComparison::Matches => {
                writeln!(
                    writer,
                    "      {channel} matches {} {}",
                    file_name_of(golden).cyan(),
                    "✔️".green()
                )?;
            }
            LineComparison::Differs { expected, actual } => {
                writeln!(
                    writer,
                    "      {channel} {} {}:",
                    "DIFFERS from".bright_red(),
                    file_name_of(golden).cyan()
                )?;

                writeln!(
                    writer,
                    "          {}",
                    "------ Golden <> Actual ---------------------------------------".cyan()
                )?;

                write_diff(writer, 10, expected, actual)?;

                writeln!(
                    writer,
                    "          {}",
                    "---------------------------------------------------------------".cyan()
                )?;
            }
            LineComparison::MissingTrailingNewline { .. } => {
                writeln!(
                    writer,
                    "      {channel} {}: the output does not end with a newline",
                    "DIFFERS".bright_red(),
                )?;
            }
            LineComparison::InvalidUtf8 { valid_up_to } => {
                writeln!(
                    writer,
                    "      {channel} {}: the output is not valid UTF-8 (at byte {valid_up_to})",
                    "DIFFERS".bright_red(),
                )?;
            }
            LineComparison::InvalidGoldenUtf8 { valid_up_to } => {
                writeln!(
                    writer,
                    "      {channel} {}: {} output is not valid UTF-8 (at byte {valid_up_to})",
                    "DIFFERS".bright_red(),
                    file_name_of(golden).cyan()
                )?;
            }
        },
        ChannelComparison::ExitCodeMismatch {
            golden,
            expected,
            actual,
        } => {
            writeln!(
                writer,
                "      {channel} matches {}, but exit code {}: expected {}, got {}",
                file_name_of(golden).cyan(),
                "DIFFERS".bright_red(),
                expected.to_string().cyan(),
                actual.to_string().bright_red()
            )?;
        }
        ChannelComparison::GeneratorFailed {
            script,
            exit_code,
            stderr,
        } => {
            writeln!(
                writer,
                "      {channel} golden generator {} {}: exit code = {}",
                script.to_string_lossy(),
                "FAILED".bright_red(),
                exit_code.to_string().bright_red()
            )?;

            if !stderr.is_empty() {
                writeln!(writer, "{}", indent::indent_all_by(10, stderr))?;
            }
        }
    }

    Ok(())
}

fn write_captured_output<W: Write>(writer: &mut W, run: &RunResult) -> Result<()> {
    writeln!(
        writer,
        "    exit code: {} (ran in {:?})",
        run.exit_code, run.duration
    )?;

    writeln!(
        writer,
        "    {}",
        "------ STDOUT ---------------------------------------------------".cyan()
    )?;
    writeln!(
        writer,
        "{}",
        indent::indent_all_by(8, display_output(&run.stdout))
    )?;

    writeln!(
        writer,
        "    {}",
        "------ STDERR ---------------------------------------------------".cyan()
    )?;
    writeln!(
        writer,
        "{}",
        indent::indent_all_by(8, display_output(&run.stderr))
    )?;

    Ok(())
}

/// Results from running the discovered test cases.
#[derive(Debug)]
pub struct TestSuiteResults {
    /// Name of the suite.
    pub name: String,
    /// Number of successful tests.
    pub success_count: u32,
    /// Number of tests excluded by filters.
    pub skip_count: u32,
    /// Number of failed tests.
    pub fail_count: u32,
    /// Individual test case results.
    pub test_case_results: Vec<TestCaseResult>,
    /// Total duration of successful tests.
    pub success_duration: std::time::Duration,
}

impl TestSuiteResults {
    /// Tallies the given results into a suite.
    pub fn new(
        name: impl Into<String>,
        test_case_results: Vec<TestCaseResult>,
        skip_count: u32,
    ) -> Self {
        let mut success_count = 0;
        let mut fail_count = 0;
        let mut success_duration = std::time::Duration::default();

        for result in &test_case_results {
            if result.success() {
                success_count += 1;
                success_duration += result.duration;
            } else {
                fail_count += 1;
            }
        }

        Self {
            name: name.into(),
            success_count,
            skip_count,
            fail_count,
            test_case_results,
            success_duration,
        }
    }

    /// Reports these results in pretty format.
    pub fn report_pretty(&self, options: &TestOptions) -> Result<()> {
        for test_case_result in &self.test_case_results {
            test_case_result.report_pretty(options)?;
        }

        if options.verbose {
            eprintln!("    successful cases ran in {:?}", self.success_duration);
        }

        Ok(())
    }

    /// Writes the closing summary line for pretty output.
    pub fn write_summary<W: Write>(&self, mut writer: W) -> Result<()> {
        let formatted_fail_count = if self.fail_count > 0 {
            self.fail_count.to_string().red()
        } else {
            self.fail_count.to_string().green()
        };

        let formatted_skip_count = if self.skip_count > 0 {
            self.skip_count.to_string().cyan()
        } else {
            self.skip_count.to_string().green()
        };

        writeln!(
            writer,
            "================================================================================"
        )?;
        writeln!(
            writer,
            "{} test case(s) ran: {} succeeded, {} failed, {} skipped.",
            self.success_count + self.fail_count,
            self.success_count.to_string().green(),
            formatted_fail_count,
            formatted_skip_count,
        )?;
        writeln!(
            writer,
            "duration of successful tests: {:?}",
            self.success_duration
        )?;
        writeln!(
            writer,
            "================================================================================"
        )?;

        Ok(())
    }
}

/// Reports test results based on the configured output format.
pub fn report_results(results: &TestSuiteResults, options: &TestOptions) -> Result<()> {
    match options.format {
        OutputFormat::Pretty => {
            results.report_pretty(options)?;
            results.write_summary(std::io::stderr())
        }
        OutputFormat::Junit => report_results_junit(results, options),
        OutputFormat::Terse => Ok(()),
    }
}

fn report_results_junit(results: &TestSuiteResults, options: &TestOptions) -> Result<()> {
    let mut report = junit_report::Report::new();
    let mut suite = junit_report::TestSuite::new(results.name.as_str());

    // Always include captured output in the report.
    let options = TestOptions {
        show_output: true,
        ..options.clone()
    };

    for r in &results.test_case_results {
        let mut test_case: junit_report::TestCase = match &r.outcome {
            Ok(_) if r.success() => {
                junit_report::TestCase::success(r.name.as_str(), r.duration.try_into()?)
            }
            Ok(_) => junit_report::TestCase::failure(
                r.name.as_str(),
                r.duration.try_into()?,
                "golden mismatch",
                "failed",
            ),
            Err(err) => junit_report::TestCase::error(
                r.name.as_str(),
                r.duration.try_into()?,
                "harness error",
                err.to_string().as_str(),
            ),
        };

        let mut output_buf: Vec<u8> = vec![];
        r.write_details(&mut output_buf, &options)?;

        let output_as_string = String::from_utf8(output_buf)?;
        test_case.set_system_out(strip_ansi_escapes::strip_str(output_as_string).as_str());

        suite.add_testcase(test_case);
    }

    report.add_testsuite(suite);

    report.write_xml(std::io::stdout())?;
    writeln!(std::io::stdout())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::PathBuf;

    fn options(args: &[&str]) -> TestOptions {
        TestOptions::try_parse_from(std::iter::once("kcl-grammar-test").chain(args.iter().copied()))
            .unwrap()
    }

    fn run_result(stdout: &[u8], stderr: &[u8], exit_code: i32) -> RunResult {
        RunResult {
            exit_code,
            stdout: stdout.to_vec(),
            stderr: stderr.to_vec(),
            duration: std::time::Duration::from_millis(5),
        }
    }

    fn render(result: &TestCaseResult, args: &[&str]) -> String {
        colored::control::set_override(false);
        let mut buf = vec![];
        result.write_details(&mut buf, &options(args)).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_passing_case_is_quiet_by_default() {
        let result = TestCaseResult {
            name: String::from("ok_case"),
            run: Some(run_result(b"hello\n", b"", 0)),
            outcome: Ok(TestComparison {
                stdout: ChannelComparison::Compared {
                    golden: PathBuf::from("ok_case/stdout.golden"),
                    result: LineComparison::Matches,
                },
                stderr: ChannelComparison::Skipped,
            }),
            duration: std::time::Duration::from_millis(5),
        };

        assert!(result.success());
        assert!(render(&result, &[]).is_empty());
        assert!(render(&result, &["--show-output"]).contains("hello"));
    }

    #[test]
    fn test_failing_case_shows_diff_and_output() {
        let result = TestCaseResult {
            name: String::from("bad_case"),
            run: Some(run_result(b"a = 1\n", b"warning\n", 0)),
            outcome: Ok(TestComparison {
                stdout: ChannelComparison::Compared {
                    golden: PathBuf::from("bad_case/stdout.golden"),
                    result: LineComparison::Differs {
                        expected: vec![String::from("a = 2"), String::new()],
                        actual: vec![String::from("a = 1"), String::new()],
                    },
                },
                stderr: ChannelComparison::Skipped,
            }),
            duration: std::time::Duration::from_millis(5),
        };

        let text = render(&result, &[]);
        assert!(text.contains("bad_case"));
        assert!(text.contains("- a = 2"));
        assert!(text.contains("+ a = 1"));
        assert!(text.contains("warning"));
        assert!(text.contains("FAILED."));
    }

    #[test]
    fn test_missing_newline_is_described() {
        let result = TestCaseResult {
            name: String::from("no_newline"),
            run: Some(run_result(b"hello", b"", 0)),
            outcome: Ok(TestComparison {
                stdout: ChannelComparison::Compared {
                    golden: PathBuf::from("no_newline/stdout.golden"),
                    result: LineComparison::MissingTrailingNewline {
                        actual: vec![String::from("hello")],
                    },
                },
                stderr: ChannelComparison::Skipped,
            }),
            duration: std::time::Duration::default(),
        };

        assert!(render(&result, &[]).contains("does not end with a newline"));
    }

    #[test]
    fn test_invalid_utf8_is_described() {
        let result = TestCaseResult {
            name: String::from("bad_bytes"),
            run: Some(run_result(b"x\xff\n", b"", 0)),
            outcome: Ok(TestComparison {
                stdout: ChannelComparison::Compared {
                    golden: PathBuf::from("bad_bytes/stdout.golden"),
                    result: LineComparison::InvalidUtf8 { valid_up_to: 1 },
                },
                stderr: ChannelComparison::Skipped,
            }),
            duration: std::time::Duration::default(),
        };

        let text = render(&result, &[]);
        assert!(text.contains("not valid UTF-8 (at byte 1)"));
        assert!(text.contains("x\u{FFFD}"));
    }

    #[test]
    fn test_suite_tallies() {
        let passing = TestCaseResult {
            name: String::from("p"),
            run: None,
            outcome: Ok(TestComparison {
                stdout: ChannelComparison::Skipped,
                stderr: ChannelComparison::Skipped,
            }),
            duration: std::time::Duration::from_millis(3),
        };
        let failing = TestCaseResult {
            name: String::from("f"),
            run: None,
            outcome: Err(HarnessError::Join(String::from("boom"))),
            duration: std::time::Duration::from_millis(7),
        };

        let suite = TestSuiteResults::new("grammar", vec![passing, failing], 2);
        assert_eq!(suite.success_count, 1);
        assert_eq!(suite.fail_count, 1);
        assert_eq!(suite.skip_count, 2);
        assert_eq!(suite.success_duration, std::time::Duration::from_millis(3));
    }
}
