//! Configuration types for the test harness.

use clap::Parser;
use std::path::PathBuf;

/// Default program under test.
pub const DEFAULT_KCL_PATH: &str = "kcl";

/// Default interpreter used to run golden generator scripts.
pub const DEFAULT_KCLVM_PATH: &str = "kclvm";

/// Configuration for the test runner.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Program under test.
    pub kcl_path: PathBuf,
    /// Interpreter for golden generator scripts.
    pub kclvm_path: PathBuf,
    /// Root directory to scan for test cases.
    pub test_cases_dir: PathBuf,
    /// Subdirectory of the root to restrict scanning to; empty scans everything.
    pub category: String,
}

impl RunnerConfig {
    /// Creates a new runner config with default values.
    pub fn new(test_cases_dir: PathBuf) -> Self {
        Self {
            kcl_path: PathBuf::from(DEFAULT_KCL_PATH),
            kclvm_path: PathBuf::from(DEFAULT_KCLVM_PATH),
            test_cases_dir,
            category: String::new(),
        }
    }

    /// Sets the program under test.
    #[must_use]
    pub fn with_kcl_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.kcl_path = path.into();
        self
    }

    /// Sets the interpreter for golden generator scripts.
    #[must_use]
    pub fn with_kclvm_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.kclvm_path = path.into();
        self
    }

    /// Restricts scanning to the given subdirectory of the test cases root.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

/// Type of event to trace.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, clap::ValueEnum)]
pub enum TraceEvent {
    /// Traces discovery of test case directories.
    #[clap(name = "discovery")]
    Discovery,
    /// Traces loading of per-case settings.
    #[clap(name = "settings")]
    Settings,
    /// Traces execution of the program under test.
    #[clap(name = "execution")]
    Execution,
    /// Traces golden output generation.
    #[clap(name = "golden")]
    Golden,
}

impl TraceEvent {
    /// The tracing target that events of this type are logged under.
    pub const fn target(self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Settings => "settings",
            Self::Execution => "execution",
            Self::Golden => "golden",
        }
    }
}

/// Output format for test results.
#[derive(Clone, Copy, Default, clap::ValueEnum, Debug)]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// `JUnit` XML format.
    Junit,
    /// Minimal output.
    Terse,
}

/// Command-line options for the test harness.
#[derive(Clone, Parser, Debug)]
#[clap(version, about, disable_help_flag = true, disable_version_flag = true)]
pub struct TestOptions {
    /// Display usage information.
    #[clap(long = "help", action = clap::ArgAction::HelpLong)]
    pub help: Option<bool>,

    /// Output format for test results.
    #[clap(long = "format", default_value = "pretty")]
    pub format: OutputFormat,

    /// Display details regarding successful test cases.
    #[clap(short = 'v', long = "verbose", env = "KCL_GRAMMAR_VERBOSE")]
    pub verbose: bool,

    /// Show captured output from every test case, not just failing ones.
    #[clap(long = "show-output", alias = "nocapture")]
    pub show_output: bool,

    /// List available tests without running them.
    #[clap(long = "list")]
    pub list_tests_only: bool,

    /// Exactly match filters (not just substring match).
    #[clap(long = "exact")]
    pub exact_match: bool,

    /// Path to the kcl program under test.
    #[clap(long = "kcl-path", default_value = DEFAULT_KCL_PATH, env = "KCL_PATH")]
    pub kcl_path: PathBuf,

    /// Path to the interpreter used to run golden generator scripts.
    #[clap(long = "kclvm-path", default_value = DEFAULT_KCLVM_PATH, env = "KCLVM_PATH")]
    pub kclvm_path: PathBuf,

    /// Root directory of the test cases.
    #[clap(long = "test-cases-path", default_value = ".", env = "KCL_GRAMMAR_TEST_CASES")]
    pub test_cases_path: PathBuf,

    /// Only run test cases under this subdirectory of the test cases root.
    #[clap(long = "category", default_value = "")]
    pub category: String,

    /// Colorize output?
    #[clap(long = "color", default_value_t = clap::ColorChoice::Auto)]
    pub color: clap::ColorChoice,

    /// Enable debug tracing for the given events.
    #[clap(long = "trace", value_delimiter = ',')]
    pub trace_events: Vec<TraceEvent>,

    /// Patterns for tests to be excluded.
    #[clap(long = "skip")]
    pub exclude_filters: Vec<String>,

    /// Patterns for tests to be included.
    pub include_filters: Vec<String>,
}

impl TestOptions {
    /// Builds the runner configuration described by these options.
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::new(self.test_cases_path.clone())
            .with_kcl_path(self.kcl_path.clone())
            .with_kclvm_path(self.kclvm_path.clone())
            .with_category(self.category.clone())
    }

    /// Returns whether a test should run based on include/exclude filters.
    pub fn should_run_test(&self, name: &str) -> bool {
        if self.include_filters.is_empty() && self.exclude_filters.is_empty() {
            return true;
        }

        // If any include filters were given, then we are in opt-in mode.
        if !self.include_filters.is_empty() && !self.test_matches_filters(name, &self.include_filters)
        {
            return false;
        }

        // In all cases, exclude filters may be used to exclude tests.
        if !self.exclude_filters.is_empty() && self.test_matches_filters(name, &self.exclude_filters)
        {
            return false;
        }

        true
    }

    fn test_matches_filters(&self, name: &str, filters: &[String]) -> bool {
        if self.exact_match {
            filters.iter().any(|f| f == name)
        } else {
            filters.iter().any(|filter| name.contains(filter))
        }
    }
}
