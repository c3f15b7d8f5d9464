//! Configuration loading from proctime.toml
//!
//! Defaults can be set in a `proctime.toml` file. The file is discovered by
//! walking up from the current directory; command-line flags win over it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cmdline::DEFAULT_MAX_COMMAND_LINE;

/// Name of the configuration file looked up during discovery
pub const CONFIG_FILE_NAME: &str = "proctime.toml";

/// proctime configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ProctimeConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// How the child is run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerConfig {
    /// Let the child write to the console (same as `--show-output`)
    #[serde(default)]
    pub show_output: bool,
    /// Maximum length of the rendered command line, in bytes
    #[serde(default = "default_max_command_line")]
    pub max_command_line: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            show_output: false,
            max_command_line: default_max_command_line(),
        }
    }
}

fn default_max_command_line() -> usize {
    DEFAULT_MAX_COMMAND_LINE
}

/// Stream the report is written to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportStream {
    /// Standard output (default)
    #[default]
    Stdout,
    /// Standard error
    Stderr,
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Report format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Where the report goes
    #[serde(default)]
    pub stream: ReportStream,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            stream: ReportStream::default(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl ProctimeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Find `proctime.toml` in `start` or any of its ancestors
    pub fn find_from(start: impl Into<PathBuf>) -> Option<PathBuf> {
        let mut dir = start.into();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return Some(config_path);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// Discover and load configuration starting at the current directory.
    ///
    /// Returns `Ok(None)` when no file exists; a file that exists but does
    /// not parse is an error.
    pub fn discover() -> anyhow::Result<Option<Self>> {
        let cwd = std::env::current_dir()?;
        match Self::find_from(cwd) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading configuration");
                let config = Self::load(&path)
                    .map_err(|e| anyhow::anyhow!("invalid {}: {}", path.display(), e))?;
                Ok(Some(config))
            }
            None => Ok(None),
        }
    }

    /// Write [`default_toml`](Self::default_toml) to `dir/proctime.toml`.
    /// An existing file is never overwritten.
    pub fn write_default(dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if path.exists() {
            anyhow::bail!("{} already exists", path.display());
        }
        std::fs::write(&path, Self::default_toml())?;
        Ok(path)
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# proctime configuration

[runner]
# Let the timed command print to the console (same as --show-output)
show_output = false
# Longest accepted command line, in bytes
max_command_line = 32767

[output]
# Report format: human or json
format = "human"
# Report stream: stdout or stderr
stream = "stdout"
"#
        .to_string()
    }
}
