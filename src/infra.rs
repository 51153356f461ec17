//! # Infrastructure Module / 基础设施模块
//!
//! This module provides the services around the pipeline: auxiliary
//! command execution, file system setup of the output root, and distro
//! detection.
//!
//! 此模块提供管道周边的服务：辅助命令执行、输出根目录的文件系统准备以及发行版检测。

pub mod command;
pub mod distro;
pub mod fs;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
