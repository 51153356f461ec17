//! # LAVA Local Test Library / LAVA 本地测试库
//!
//! This library runs a LAVA test definition on the local machine. It turns
//! the YAML definition into the `install.sh`/`run.sh` scripts that
//! `lava-test-runner` executes, supervises the runner with an optional
//! timeout, and collects the test case signals from its log into
//! `results.json` and `results.csv`.
//!
//! 此库在本地机器上运行 LAVA 测试定义。它将 YAML 定义转换为 `lava-test-runner`
//! 执行的 `install.sh`/`run.sh` 脚本，在可选超时下监控运行器，
//! 并将其日志中的测试用例信号收集到 `results.json` 和 `results.csv`。
//!
//! ## Modules / 模块
//!
//! - `core` - Definition model, script generation, supervision and result extraction
//! - `infra` - Command execution, file system setup and distro detection
//! - `reporting` - Result files and console summary
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 定义模型、脚本生成、运行监控和结果提取
//! - `infra` - 命令执行、文件系统准备和发行版检测
//! - `reporting` - 结果文件和控制台摘要
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod error;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::definition;
pub use crate::core::models;
pub use error::{LocalTestError, Result};

/// Selects the language for console messages.
///
/// Tries the full locale first (e.g. "zh-CN"), then just the language code
/// (e.g. "en" from "en-US"), and finally falls back to "en". With `None`
/// the system locale is used.
pub fn init(language: Option<&str>) -> String {
    let locale = language
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string());
    let available_locales = rust_i18n::available_locales!();

    let lang = if available_locales.contains(&locale.as_str()) {
        locale.as_str()
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
    lang.to_string()
}

/// Initializes the tracing subscriber for diagnostic logging on stderr.
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lava_local_test=warn"));

    // A second initialization (e.g. from tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
