//! # Data Models Module / 数据模型模块
//!
//! This module defines the data structures shared by the pipeline stages:
//! the run identity that names one execution, the metric records extracted
//! from the runner log, and the result document written at the end.
//!
//! 此模块定义了管道各阶段共享的数据结构：
//! 命名一次执行的运行标识、从运行器日志中提取的指标记录，以及最终写出的结果文档。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{LocalTestError, Result};

/// Names one execution of a definition: `<short-name>_<token>`.
///
/// The short name is the definition's file stem; the token is a random
/// UUID. The run id keys the test working directory and the result directory.
///
/// 命名一次定义执行：`<short-name>_<token>`。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunIdentity {
    short_name: String,
    token: String,
}

impl RunIdentity {
    /// Creates a fresh identity with a random token.
    pub fn generate(short_name: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            token: Uuid::new_v4().to_string(),
        }
    }

    /// Creates a fresh identity named after a definition file
    /// (`ubuntu/smoke-tests-basic.yaml` becomes `smoke-tests-basic`).
    pub fn for_definition(definition_path: &Path) -> Self {
        let short_name = definition_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "test".to_string());
        Self::generate(short_name)
    }

    /// Builds an identity from known parts.
    pub fn new(short_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            short_name: short_name.into(),
            token: token.into(),
        }
    }

    /// Splits a run id on its last `_`. Tokens never contain `_`, short
    /// names may.
    pub fn parse(run_id: &str) -> Result<Self> {
        match run_id.rsplit_once('_') {
            Some((short_name, token)) if !short_name.is_empty() && !token.is_empty() => {
                Ok(Self::new(short_name, token))
            }
            _ => Err(LocalTestError::MalformedRunId {
                run_id: run_id.to_string(),
            }),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// The `<short-name>_<token>` form used for directory names.
    pub fn run_id(&self) -> String {
        format!("{}_{}", self.short_name, self.token)
    }
}

impl fmt::Display for RunIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.short_name, self.token)
    }
}

impl FromStr for RunIdentity {
    type Err = LocalTestError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One result entry extracted from the runner log.
///
/// The four known keys always exist (empty when the log line or pattern did
/// not provide them). Any other key is kept in `extra`; it appears in
/// `results.json` but not in `results.csv`.
///
/// 从运行器日志中提取的一条结果记录。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(default)]
    pub test_case_id: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub measurement: String,
    #[serde(default)]
    pub units: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl MetricRecord {
    /// Sets a field by (lower-case) key, routing unknown keys to `extra`.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match key {
            "test_case_id" => self.test_case_id = value,
            "result" => self.result = value,
            "measurement" => self.measurement = value,
            "units" => self.units = value,
            _ => {
                self.extra.insert(key.to_string(), value);
            }
        }
    }

    /// Looks up any field, known or extra.
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "test_case_id" => Some(&self.test_case_id),
            "result" => Some(&self.result),
            "measurement" => Some(&self.measurement),
            "units" => Some(&self.units),
            _ => self.extra.get(key).map(String::as_str),
        }
    }

    /// Classifies the `result` field for summaries.
    pub fn outcome(&self) -> MetricOutcome {
        match self.result.as_str() {
            "pass" => MetricOutcome::Pass,
            "fail" => MetricOutcome::Fail,
            "skip" => MetricOutcome::Skip,
            _ => MetricOutcome::Unknown,
        }
    }
}

/// Coarse classification of a metric's `result` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricOutcome {
    Pass,
    Fail,
    Skip,
    Unknown,
}

/// The aggregate written to `results.json` and `results.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDocument {
    pub test: String,
    pub id: String,
    pub metrics: Vec<MetricRecord>,
}

impl ResultDocument {
    pub fn new(identity: &RunIdentity, metrics: Vec<MetricRecord>) -> Self {
        Self {
            test: identity.short_name().to_string(),
            id: identity.token().to_string(),
            metrics,
        }
    }

    pub fn count(&self, outcome: MetricOutcome) -> usize {
        self.metrics.iter().filter(|m| m.outcome() == outcome).count()
    }
}
