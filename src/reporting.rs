//! # Reporting Module / 报告模块
//!
//! This module writes result documents to disk (`results.json`,
//! `results.csv`) and prints the run summary to the console.
//!
//! 此模块将结果文档写入磁盘（`results.json`、`results.csv`），并在控制台打印运行摘要。

pub mod console;
pub mod csv;
pub mod json;

// Re-export common reporting functions
pub use console::{print_summary, print_supervision};
