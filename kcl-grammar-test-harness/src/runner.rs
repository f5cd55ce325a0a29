//! Test runner implementation.

use crate::comparison::{
    ChannelComparison, LineComparison, TestComparison, compare_results,
    compare_results_with_lines,
};
use crate::config::{OutputFormat, RunnerConfig, TestOptions};
use crate::discovery::find_test_dirs;
use crate::error::HarnessError;
use crate::execution::{GeneratedGolden, RunResult, generate_golden, run_command};
use crate::reporting::{TestCaseResult, TestSuiteResults};
use crate::testcase::{Channel, TestCase, load_settings};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Banner printed at the start of a pretty-formatted run.
const BANNER: &str = "##### K Language Grammar Test Suite #####";

/// The main test runner.
pub struct TestRunner {
    config: RunnerConfig,
    options: TestOptions,
}

impl TestRunner {
    /// Creates a new test runner with the given configuration and options.
    pub const fn new(config: RunnerConfig, options: TestOptions) -> Self {
        Self { config, options }
    }

    /// Discovers the test cases to run, in name order.
    ///
    /// Returns the selected cases along with the number excluded by filters.
    pub fn discover(&self) -> (Vec<TestCase>, u32) {
        self.discover_in(&self.config)
    }

    fn discover_in(&self, config: &RunnerConfig) -> (Vec<TestCase>, u32) {
        let mut test_cases: Vec<_> = find_test_dirs(&config.test_cases_dir, &config.category)
            .map(|dir| TestCase::new(&config.test_cases_dir, dir))
            .collect();
        test_cases.sort_by(|a, b| a.name.cmp(&b.name));

        let total = test_cases.len();
        test_cases.retain(|test_case| self.options.should_run_test(&test_case.name));

        let skip_count = u32::try_from(total - test_cases.len()).unwrap_or(u32::MAX);
        (test_cases, skip_count)
    }

    /// Runs all tests and returns success/failure.
    pub async fn run(&self) -> Result<bool> {
        if matches!(self.options.format, OutputFormat::Pretty) && !self.options.list_tests_only {
            eprintln!("{BANNER}");
        }

        if self.options.list_tests_only {
            let (test_cases, _) = self.discover();
            for test_case in &test_cases {
                println!("{}: test", test_case.name);
            }
            return Ok(true);
        }

        let config = resolve_config(&self.config)?;
        let (test_cases, skip_count) = self.discover_in(&config);

        // Each test case blocks on its child processes, so give each its own thread.
        let mut join_handles = vec![];
        for test_case in test_cases {
            let config = config.clone();
            let name = test_case.name.clone();
            let handle = tokio::task::spawn_blocking(move || run_test_case(&test_case, &config));
            join_handles.push((name, handle));
        }

        // Await all results.
        let mut results = vec![];
        for (name, join_handle) in join_handles {
            let result = match join_handle.await {
                Ok(result) => result,
                Err(err) => TestCaseResult {
                    name,
                    run: None,
                    outcome: Err(HarnessError::Join(err.to_string())),
                    duration: std::time::Duration::default(),
                },
            };
            results.push(result);
        }

        let suite_name = if self.config.category.is_empty() {
            String::from("grammar")
        } else {
            self.config.category.clone()
        };

        let suite = TestSuiteResults::new(suite_name, results, skip_count);
        crate::reporting::report_results(&suite, &self.options)?;

        Ok(suite.fail_count == 0)
    }
}

/// Anchors relative program paths (like `./bin/kcl`) to the current directory, since
/// test cases run with their own working directory. Bare names are left for `PATH`
/// lookup.
fn resolve_program(program: &Path) -> Result<PathBuf> {
    if program.is_relative() && program.components().count() > 1 {
        Ok(std::env::current_dir()?.join(program))
    } else {
        Ok(program.to_path_buf())
    }
}

fn resolve_config(config: &RunnerConfig) -> Result<RunnerConfig> {
    Ok(RunnerConfig {
        kcl_path: resolve_program(&config.kcl_path)?,
        kclvm_path: resolve_program(&config.kclvm_path)?,
        test_cases_dir: std::path::absolute(&config.test_cases_dir)?,
        category: config.category.clone(),
    })
}

/// Runs a single test case: loads its settings, runs the program under test in the
/// case directory, and checks each output channel.
pub fn run_test_case(test_case: &TestCase, config: &RunnerConfig) -> TestCaseResult {
    tracing::debug!(target: "execution", "testing {}", test_case.dir.display());

    let start_time = std::time::Instant::now();
    let mut run = None;
    let outcome = run_and_compare(test_case, config, &mut run);

    TestCaseResult {
        name: test_case.name.clone(),
        run,
        outcome,
        duration: start_time.elapsed(),
    }
}

fn run_and_compare(
    test_case: &TestCase,
    config: &RunnerConfig,
    run: &mut Option<RunResult>,
) -> Result<TestComparison, HarnessError> {
    let settings = load_settings(&test_case.settings_path())?;
    let args = TestCase::command_args(settings.as_ref());

    let result = run.insert(run_command(&config.kcl_path, &args, &test_case.dir)?);

    // Captured output must decode cleanly, whether or not any golden checks it.
    for channel in Channel::ALL {
        std::str::from_utf8(result.output(channel))
            .map_err(|source| HarnessError::InvalidOutput { channel, source })?;
    }

    Ok(TestComparison {
        stdout: check_channel(test_case, config, result, Channel::Stdout)?,
        stderr: check_channel(test_case, config, result, Channel::Stderr)?,
    })
}

/// Checks one output channel, preferring generated golden output over the static
/// golden file.
fn check_channel(
    test_case: &TestCase,
    config: &RunnerConfig,
    result: &RunResult,
    channel: Channel,
) -> Result<ChannelComparison, HarnessError> {
    let actual = result.output(channel);

    let script = test_case.golden_script_path(channel);
    match generate_golden(&config.kclvm_path, &script)? {
        Some(GeneratedGolden::Failed { exit_code, stderr }) => {
            return Ok(ChannelComparison::GeneratorFailed {
                script,
                exit_code,
                stderr: String::from_utf8_lossy(&stderr).to_string(),
            });
        }
        // Empty generated output counts as nothing generated.
        Some(GeneratedGolden::Output(generated)) if !generated.is_empty() => {
            return Ok(ChannelComparison::Compared {
                golden: script,
                result: compare_results(actual, &generated),
            });
        }
        _ => (),
    }

    let golden = test_case.golden_path(channel);
    let golden_text = match std::fs::read_to_string(&golden) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(target: "golden", "no golden for {channel} in {}", test_case.name);
            return Ok(ChannelComparison::Skipped);
        }
        Err(err) => return Err(HarnessError::GoldenRead(golden, err)),
    };

    let comparison = compare_results_with_lines(actual, &golden_text);
    if comparison.is_failure() {
        return Ok(ChannelComparison::Compared {
            golden,
            result: comparison,
        });
    }

    if let Some(expected) = channel.expected_exit_code() {
        if result.exit_code != expected {
            return Ok(ChannelComparison::ExitCodeMismatch {
                golden,
                expected,
                actual: result.exit_code,
            });
        }
    }

    Ok(ChannelComparison::Compared {
        golden,
        result: LineComparison::Matches,
    })
}
