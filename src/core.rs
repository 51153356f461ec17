//! # Core Module / 核心模块
//!
//! This module contains the pipeline of a local test run: the definition
//! model, run planning, script generation, supervised execution of the
//! runner, and result extraction.
//!
//! 此模块包含本地测试运行的管道：定义模型、运行计划、脚本生成、
//! 运行器的受监控执行以及结果提取。

pub mod config;
pub mod definition;
pub mod execution;
pub mod extractor;
pub mod generator;
pub mod models;
pub mod planner;

// Re-exports
pub use config::RunConfig;
pub use definition::Definition;
pub use execution::{Supervisor, SupervisorState};
pub use extractor::ResultExtractor;
pub use generator::ScriptGenerator;
pub use models::{MetricRecord, ResultDocument, RunIdentity};
