//! Test case definitions and the per-case settings schema.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the source file that identifies a test case directory.
pub const TEST_FILE: &str = "main.k";

/// Name of the optional per-case settings file.
pub const SETTINGS_FILE: &str = "settings.yaml";

/// One of the captured output streams of the program under test.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl Channel {
    /// All channels, in the order they are checked.
    pub const ALL: [Self; 2] = [Self::Stdout, Self::Stderr];

    /// Short name of the channel.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }

    /// Name of the static golden file for this channel.
    pub const fn golden_file_name(self) -> &'static str {
        match self {
            Self::Stdout => "stdout.golden",
            Self::Stderr => "stderr.golden",
        }
    }

    /// Name of the golden generator script for this channel.
    pub const fn golden_script_name(self) -> &'static str {
        match self {
            Self::Stdout => "stdout.golden.py",
            Self::Stderr => "stderr.golden.py",
        }
    }

    /// Exit code required when this channel is checked against a static golden file.
    pub const fn expected_exit_code(self) -> Option<i32> {
        match self {
            Self::Stdout => None,
            Self::Stderr => Some(1),
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings loaded from a test case's `settings.yaml`.
///
/// Unknown keys are ignored.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Whitespace-separated command-line options appended after the source file.
    pub kcl_options: Option<String>,
}

impl Settings {
    /// Returns the extra command-line arguments requested by these settings.
    pub fn extra_args(&self) -> Vec<String> {
        self.kcl_options
            .as_deref()
            .map(|opts| opts.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }
}

/// Loads the settings file at the given path.
///
/// Returns `Ok(None)` if the file does not exist or holds an empty document. A file
/// that exists but can't be read or parsed is an error.
pub fn load_settings(path: &Path) -> Result<Option<Settings>, SettingsError> {
    if !path.is_file() {
        tracing::debug!(target: "settings", "no settings file at {}", path.display());
        return Ok(None);
    }

    let content =
        std::fs::read_to_string(path).map_err(|e| SettingsError::Io(path.to_path_buf(), e))?;

    if content.trim().is_empty() {
        return Ok(None);
    }

    let value: serde_yaml::Value = serde_yaml::from_str(&content)
        .map_err(|e| SettingsError::Parse(path.to_path_buf(), e))?;

    if value.is_null() {
        return Ok(None);
    }

    let settings: Settings = serde_yaml::from_value(value)
        .map_err(|e| SettingsError::Parse(path.to_path_buf(), e))?;

    tracing::debug!(target: "settings", "loaded {}: {settings:?}", path.display());

    Ok(Some(settings))
}

/// A single test case, identified by its directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestCase {
    /// Display name of the test case (its path relative to the scan root).
    pub name: String,
    /// Directory containing the test case's files.
    pub dir: PathBuf,
}

impl TestCase {
    /// Creates a test case for the given directory, naming it relative to `root`.
    pub fn new(root: &Path, dir: PathBuf) -> Self {
        let relative = dir.strip_prefix(root).unwrap_or(dir.as_path());
        let name = if relative.as_os_str().is_empty() {
            dir.file_name().map_or_else(
                || dir.to_string_lossy().to_string(),
                |n| n.to_string_lossy().to_string(),
            )
        } else {
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        };

        Self { name, dir }
    }

    /// Path to this test case's settings file.
    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    /// Path to the static golden file for the given channel.
    pub fn golden_path(&self, channel: Channel) -> PathBuf {
        self.dir.join(channel.golden_file_name())
    }

    /// Path to the golden generator script for the given channel.
    pub fn golden_script_path(&self, channel: Channel) -> PathBuf {
        self.dir.join(channel.golden_script_name())
    }

    /// Builds the arguments passed to the program under test.
    pub fn command_args(settings: Option<&Settings>) -> Vec<String> {
        let mut args = vec![String::from(TEST_FILE)];
        if let Some(settings) = settings {
            args.extend(settings.extra_args());
        }
        args
    }
}
