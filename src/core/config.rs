//! # Configuration Module / 配置模块
//!
//! Settings for one run come from three layers, highest precedence first:
//! command-line flags, an optional TOML config file, built-in defaults.
//! The merged [`RunConfig`] is passed explicitly to every stage.
//!
//! 单次运行的设置来自三层（优先级从高到低）：命令行参数、可选的 TOML 配置文件、内置默认值。
//! 合并后的 [`RunConfig`] 被显式传递给每个阶段。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{LocalTestError, Result};

/// Default output root, where `tests/`, `results/` and `bin/` live.
pub const DEFAULT_OUTPUT: &str = "/result";
/// Default test definitions repository.
pub const DEFAULT_REPO: &str = "https://git.linaro.org/qa/test-definitions.git";
/// Default directory holding `lava-test-runner` and its helper scripts.
pub const DEFAULT_SHELL_DIR: &str = "lava_test_shell";
/// Config file looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "lava-local-test.toml";
/// Upper bound on how long one supervisor read may block.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// The on-disk config file. Every field is optional.
///
/// 磁盘上的配置文件。每个字段都是可选的。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Language for console messages (e.g. "en", "zh-CN").
    /// 控制台消息的语言。
    #[serde(default)]
    pub language: Option<String>,
    /// Output root directory.
    #[serde(default)]
    pub output: Option<String>,
    /// Test definitions repository: remote URL or local path.
    #[serde(default)]
    pub repo: Option<String>,
    /// Wall-clock limit for the runner, in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Skip generating `install.sh`.
    #[serde(default)]
    pub skip_install: Option<bool>,
    /// Directory copied into `<output>/bin`.
    #[serde(default)]
    pub shell_dir: Option<String>,
    /// Replaces the default `<output>/bin/lava-test-runner <output>` command.
    #[serde(default)]
    pub runner: Option<String>,
    /// Supervisor read polling interval in milliseconds.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
}

/// Values given on the command line. `None`/`false` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output: Option<String>,
    pub repo: Option<String>,
    pub test_def: PathBuf,
    pub timeout_secs: Option<u64>,
    pub skip_install: bool,
    pub shell_dir: Option<String>,
    pub runner: Option<String>,
    pub poll_interval_ms: Option<u64>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub output: PathBuf,
    pub repo: String,
    /// Path of the definition file relative to the repository root.
    pub test_def: PathBuf,
    pub timeout: Option<Duration>,
    pub skip_install: bool,
    pub shell_dir: PathBuf,
    pub runner: Option<String>,
    pub poll_interval: Duration,
}

impl RunConfig {
    /// Merges CLI flags over the file config over defaults. `~` and
    /// environment variables in paths are expanded.
    pub fn resolve(file: FileConfig, cli: CliOverrides) -> Result<Self> {
        let output = cli
            .output
            .or(file.output)
            .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
        let output = expand_path(&output)?;
        // Trailing separators would leak into every derived path.
        let output = PathBuf::from(output.to_string_lossy().trim_end_matches('/'));
        let output = if output.as_os_str().is_empty() {
            PathBuf::from("/")
        } else {
            output
        };

        let repo = cli
            .repo
            .or(file.repo)
            .unwrap_or_else(|| DEFAULT_REPO.to_string());
        let repo = shellexpand::full(&repo)
            .map_err(|e| config_error(Path::new(&repo), e.to_string()))?
            .into_owned();

        let shell_dir = cli
            .shell_dir
            .or(file.shell_dir)
            .unwrap_or_else(|| DEFAULT_SHELL_DIR.to_string());

        let poll_ms = cli
            .poll_interval_ms
            .or(file.poll_interval_ms)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
            .max(1);

        Ok(Self {
            output,
            repo,
            test_def: cli.test_def,
            timeout: cli
                .timeout_secs
                .or(file.timeout_secs)
                .map(Duration::from_secs),
            skip_install: cli.skip_install || file.skip_install.unwrap_or(false),
            shell_dir: expand_path(&shell_dir)?,
            runner: cli.runner.or(file.runner),
            poll_interval: Duration::from_millis(poll_ms),
        })
    }
}

fn expand_path(raw: &str) -> Result<PathBuf> {
    shellexpand::full(raw)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| config_error(Path::new(raw), e.to_string()))
}

fn config_error(path: &Path, reason: String) -> LocalTestError {
    LocalTestError::Config {
        path: path.to_path_buf(),
        reason,
    }
}

/// Parses config file text.
pub fn parse_config(content: &str, path: &Path) -> Result<FileConfig> {
    toml::from_str(content).map_err(|e| config_error(path, e.to_string()))
}

/// Loads a config file.
///
/// With `required == false` a missing file yields the empty config, which
/// is how the default `lava-local-test.toml` lookup behaves.
pub fn load_config(path: &Path, required: bool) -> Result<FileConfig> {
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content, path),
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            Ok(FileConfig::default())
        }
        Err(e) => Err(LocalTestError::io(path, e)),
    }
}

/// The text written by `lava-local-test init`.
pub fn default_config_toml() -> String {
    format!(
        r#"# lava-local-test configuration
# Command-line flags override every value here.

# Language for console messages ("en" or "zh-CN")
language = "en"

# Output root: tests/, results/ and bin/ are created below it
output = "{DEFAULT_OUTPUT}"

# Test definitions repository, remote URL or local path
repo = "{DEFAULT_REPO}"

# Directory holding lava-test-runner and helpers, copied into <output>/bin
shell_dir = "{DEFAULT_SHELL_DIR}"

# Kill the runner after this many seconds
# timeout_secs = 3600

# Do not generate install.sh
skip_install = false

# Custom runner command, run from the output root
# runner = "/opt/lava/bin/lava-test-runner /result"

# How long one read from the runner may block, in milliseconds
poll_interval_ms = {DEFAULT_POLL_INTERVAL_MS}
"#
    )
}
