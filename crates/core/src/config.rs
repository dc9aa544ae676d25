//! Configuration for script-runner.
//!
//! This module resolves the configuration file path (expanding `~`), loads the
//! optional YAML configuration and exposes the defaults used when it is absent.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// Default path for the runner configuration file
const DEFAULT_CONFIG_PATH: &str = "~/.script-runner/config.yml";

/// Default capacity of the channel carrying output lines to the sink
pub const DEFAULT_LINE_BUFFER: usize = 256;

/// Extension given to materialized scripts on this platform
#[cfg(windows)]
pub const DEFAULT_SCRIPT_EXTENSION: &str = ".bat";
#[cfg(not(windows))]
pub const DEFAULT_SCRIPT_EXTENSION: &str = ".sh";

const DEFAULT_PROJECT_MARKERS: [&str; 7] = [
    "*.csproj",
    "*.vbproj",
    "*.fsproj",
    "*.vcxproj",
    "Cargo.toml",
    "package.json",
    "pyproject.toml",
];

const DEFAULT_SOLUTION_MARKERS: [&str; 1] = ["*.sln"];

/// Settings read from the configuration YAML. Every field is optional.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Program used to run the materialized script. When absent the script is executed directly.
    pub interpreter: Option<String>,
    /// Arguments placed between the interpreter and the script path.
    pub interpreter_args: Vec<String>,
    /// Extension of the materialized script, including the dot.
    pub script_extension: Option<String>,
    /// Directory the materialized script is written to. Defaults to the platform temp directory.
    pub temp_directory: Option<String>,
    /// File name globs identifying the project file that owns a selected file.
    pub project_markers: Vec<String>,
    /// File name globs identifying the solution file that owns a selected file.
    pub solution_markers: Vec<String>,
    /// Extra environment variables for the script process.
    pub environment: HashMap<String, String>,
    /// Number of output lines that may be queued for the sink.
    pub line_buffer: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter: None,
            interpreter_args: Vec::new(),
            script_extension: None,
            temp_directory: None,
            project_markers: DEFAULT_PROJECT_MARKERS.map(String::from).to_vec(),
            solution_markers: DEFAULT_SOLUTION_MARKERS.map(String::from).to_vec(),
            environment: HashMap::new(),
            line_buffer: DEFAULT_LINE_BUFFER,
        }
    }
}

impl RunnerConfig {
    pub fn script_extension(&self) -> &str {
        self.script_extension
            .as_deref()
            .unwrap_or(DEFAULT_SCRIPT_EXTENSION)
    }

    /// The temp directory with `~` expanded, if one is configured.
    pub fn temp_directory(&self) -> Option<PathBuf> {
        self.temp_directory
            .as_ref()
            .map(|directory| PathBuf::from(shellexpand::tilde(directory).as_ref()))
    }

    /// A zero-sized buffer would make `tokio::sync::mpsc::channel` panic.
    pub fn line_buffer(&self) -> usize {
        self.line_buffer.max(1)
    }
}

/// Resolves the configuration file path.
///
/// If a custom path is provided, uses that path. Otherwise, uses the default
/// configuration path. Shell expansions like `~` are resolved.
///
/// # Examples
///
/// ```
/// use script_runner_core::config::get_config_path;
///
/// // Use default path
/// let default_path = get_config_path(&None);
///
/// // Use custom path
/// let custom_path = get_config_path(&Some("/path/to/config.yml".to_string()));
/// ```
pub fn get_config_path(config_path_arg: &Option<String>) -> String {
    let config_path = match config_path_arg {
        Some(config_path) => config_path.as_str(),
        None => DEFAULT_CONFIG_PATH,
    };

    shellexpand::tilde(config_path).to_string()
}

/// Loads the runner configuration.
///
/// A missing file is not an error: the defaults are returned instead.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is not valid YAML.
pub fn load_config(config_path: &str) -> Result<RunnerConfig> {
    if !Path::exists(Path::new(config_path)) {
        log::debug!("No config at `{config_path}`, using defaults");
        return Ok(RunnerConfig::default());
    }

    let content = fs::read_to_string(config_path)
        .map_err(|e| Error::io_error("config".to_string(), config_path.to_string(), e))?;

    if content.trim().is_empty() {
        return Ok(RunnerConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|e| {
        Error::yaml_error(
            "reading".to_string(),
            "config".to_string(),
            config_path.to_string(),
            e,
        )
    })
}
