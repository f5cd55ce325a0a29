//! Test harness library for the KCL grammar conformance suite.
//!
//! Each test case is a directory containing a `main.k` source file along with
//! optional golden files describing the expected output of running the KCL
//! compiler against it. For each case, the harness:
//!
//! 1. Loads the optional per-case `settings.yaml`.
//! 2. Runs `kcl main.k [options...]` in the case directory, capturing output.
//! 3. Compares stdout and stderr, each independently, against either the output
//!    of a golden generator script (`<stream>.golden.py`) or, failing that, a
//!    static golden file (`<stream>.golden`). A stream with neither is skipped.
//!
//! The stderr stream additionally requires an exit code of 1 whenever it is
//! checked against a static golden file.

#![cfg(any(unix, windows))]

mod comparison;
mod config;
mod discovery;
mod error;
mod execution;
mod reporting;
mod runner;
mod testcase;
pub mod util;

pub use comparison::{
    ChannelComparison, LineComparison, TestComparison, compare_results,
    compare_results_with_lines,
};
pub use config::{
    DEFAULT_KCL_PATH, DEFAULT_KCLVM_PATH, OutputFormat, RunnerConfig, TestOptions, TraceEvent,
};
pub use discovery::{TestDirs, find_test_dirs};
pub use error::{HarnessError, SettingsError};
pub use execution::{GeneratedGolden, RunResult, generate_golden, run_command};
pub use reporting::{TestCaseResult, TestSuiteResults, report_results};
pub use runner::{TestRunner, run_test_case};
pub use testcase::{Channel, SETTINGS_FILE, Settings, TEST_FILE, TestCase, load_settings};
