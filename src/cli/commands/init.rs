//! # Init Command Module / 初始化命令模块
//!
//! This module implements the `init` command, which writes a commented
//! `lava-local-test.toml` holding the built-in defaults.
//!
//! 此模块实现了 `init` 命令，用于写出带注释、包含内置默认值的
//! `lava-local-test.toml`。

use anyhow::{Context, Result};
use colored::*;
use std::{fs, path::Path};

use crate::core::config::default_config_toml;
use crate::infra::t;

/// Executes the init command.
///
/// # Arguments
/// * `output` - Path for the new configuration file
/// * `force` - Whether to overwrite an existing file
/// * `locale` - Language for console messages
pub fn execute(output: &Path, force: bool, locale: &str) -> Result<()> {
    if output.exists() && !force {
        println!(
            "{}",
            t!("init.file_exists", locale = locale, path = output.display()).red()
        );
        println!("{}", t!("init.use_force", locale = locale).yellow());
        return Ok(());
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).with_context(|| {
                t!(
                    "init.create_parent_dir_failed",
                    locale = locale,
                    path = parent.display()
                )
                .to_string()
            })?;
        }
    }

    fs::write(output, default_config_toml()).with_context(|| {
        t!("init.write_failed", locale = locale, path = output.display()).to_string()
    })?;

    println!(
        "{}",
        t!("init.success", locale = locale, path = output.display()).green()
    );
    println!("{}", t!("init.next_steps", locale = locale));

    Ok(())
}
