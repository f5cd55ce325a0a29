//! Error types for the test harness.

use std::path::PathBuf;

/// Errors that can occur when loading a test case's settings file.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    /// The settings file exists but is not a valid settings document.
    #[error("failed to parse settings file {0}: {1}")]
    Parse(PathBuf, #[source] serde_yaml::Error),
}

/// Errors that abort a single test case.
#[derive(thiserror::Error, Debug)]
pub enum HarnessError {
    /// The test case's settings could not be loaded.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The program under test could not be started.
    #[error("failed to run {program} in {}: {source}", .working_dir.display())]
    Spawn {
        /// The program that was to be run.
        program: String,
        /// The directory it was to be run in.
        working_dir: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A golden generator script could not be started.
    #[error("failed to run golden generator {}: {source}", .script.display())]
    GeneratorSpawn {
        /// Path to the generator script.
        script: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The program under test wrote output that is not valid UTF-8.
    #[error("{channel} of the program under test is not valid UTF-8: {source}")]
    InvalidOutput {
        /// The channel with invalid output.
        channel: crate::testcase::Channel,
        /// The decoding error.
        #[source]
        source: std::str::Utf8Error,
    },

    /// A golden file exists but could not be read.
    #[error("failed to read golden file {0}: {1}")]
    GoldenRead(PathBuf, #[source] std::io::Error),

    /// The blocking task running the test case did not complete.
    #[error("test case task failed: {0}")]
    Join(String),
}
