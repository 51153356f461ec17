//! # Result Extractor Module / 结果提取模块
//!
//! This module turns the runner's `stdout.log` into a [`ResultDocument`].
//! Two line matchers contribute records independently: the fixed
//! `<LAVA_SIGNAL_TESTCASE ...>` grammar, and the definition's optional
//! `parse.pattern`. Signal records come first, pattern records after them.
//!
//! 此模块将运行器的 `stdout.log` 转换为 [`ResultDocument`]。
//! 两个行匹配器独立地产生记录：固定的 `<LAVA_SIGNAL_TESTCASE ...>` 语法，
//! 以及定义中可选的 `parse.pattern`。信号记录在前，模式记录在后。

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::definition::Definition;
use crate::core::models::{MetricRecord, ResultDocument, RunIdentity};
use crate::core::planner::{RESULTS_CSV, RESULTS_JSON, STDOUT_LOG};
use crate::error::{LocalTestError, Result};
use crate::infra::fs::resolve_result_dir;
use crate::reporting::{csv, json};

/// Every test case signal line starts with this.
pub const TESTCASE_SIGNAL_PREFIX: &str = "<LAVA_SIGNAL_TESTCASE TEST_CASE_ID=";

/// Recognizes one kind of result line.
pub trait LineMatcher {
    /// Builds a record from `line`, or `None` if the line is not a result.
    fn match_line(&self, line: &str) -> Option<MetricRecord>;
}

/// Matches `<LAVA_SIGNAL_TESTCASE KEY=VALUE ...>` lines.
///
/// Keys are case-insensitive and stored lower-case. Tokens that are not a
/// single `KEY=VALUE` pair are ignored, so values cannot contain spaces or `=`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalMatcher;

impl LineMatcher for SignalMatcher {
    fn match_line(&self, line: &str) -> Option<MetricRecord> {
        if !line.starts_with(TESTCASE_SIGNAL_PREFIX) {
            return None;
        }

        let body = line.trim_end().trim_matches(['<', '>']);
        let mut record = MetricRecord::default();
        for token in body.split(' ') {
            let mut parts = token.split('=');
            if let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) {
                if !key.is_empty() {
                    record.set(&key.to_lowercase(), value);
                }
            }
        }
        Some(record)
    }
}

/// Matches a user-supplied regular expression anywhere in a line and builds
/// a record from its named capture groups.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    regex: Regex,
    names: Vec<String>,
    fixupdict: BTreeMap<String, String>,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|source| LocalTestError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let names = regex.capture_names().flatten().map(str::to_string).collect();
        Ok(Self {
            regex,
            names,
            fixupdict: BTreeMap::new(),
        })
    }

    /// Maps captured `result` values (e.g. `PASS` to `pass`).
    pub fn with_fixupdict(mut self, fixupdict: BTreeMap<String, String>) -> Self {
        self.fixupdict = fixupdict;
        self
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl LineMatcher for PatternMatcher {
    fn match_line(&self, line: &str) -> Option<MetricRecord> {
        let captures = self.regex.captures(line)?;
        let mut record = MetricRecord::default();
        for name in &self.names {
            let value = captures.name(name).map_or("", |m| m.as_str());
            record.set(name, value);
        }
        if let Some(canonical) = self.fixupdict.get(&record.result) {
            record.result = canonical.clone();
        }
        Some(record)
    }
}

/// Runs each matcher over the whole log in turn, appending its records.
pub fn extract_metrics(log: &str, matchers: &[&dyn LineMatcher]) -> Vec<MetricRecord> {
    let mut metrics = Vec::new();
    for matcher in matchers {
        metrics.extend(log.lines().filter_map(|line| matcher.match_line(line)));
    }
    metrics
}

/// The written result files and the document they hold.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub result_dir: PathBuf,
    pub document: ResultDocument,
}

/// Collects results for one run.
///
/// 为一次运行收集结果。
#[derive(Debug, Clone)]
pub struct ResultExtractor {
    result_path: PathBuf,
    pattern: Option<PatternMatcher>,
}

impl ResultExtractor {
    /// `result_path` is the nominal `results/<run-id>` path; the runner
    /// creates the real directory with a `-<timestamp>` suffix.
    pub fn new(result_path: impl Into<PathBuf>) -> Self {
        Self {
            result_path: result_path.into(),
            pattern: None,
        }
    }

    pub fn with_pattern(mut self, pattern: PatternMatcher) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Uses the definition's `parse.pattern` and `parse.fixupdict`, if any.
    pub fn for_definition(result_path: impl Into<PathBuf>, definition: &Definition) -> Result<Self> {
        let extractor = Self::new(result_path);
        match definition.parse_pattern() {
            Some(pattern) => {
                let matcher = PatternMatcher::new(pattern)?
                    .with_fixupdict(definition.fixupdict().cloned().unwrap_or_default());
                Ok(extractor.with_pattern(matcher))
            }
            None => Ok(extractor),
        }
    }

    pub fn pattern(&self) -> Option<&PatternMatcher> {
        self.pattern.as_ref()
    }

    /// Extracts records from log text with the signal matcher and, when
    /// configured, the pattern matcher.
    pub fn extract(&self, log: &str) -> Vec<MetricRecord> {
        let signal: &dyn LineMatcher = &SignalMatcher;
        match &self.pattern {
            Some(pattern) => extract_metrics(log, &[signal, pattern as &dyn LineMatcher]),
            None => extract_metrics(log, &[signal]),
        }
    }

    /// Resolves the result directory, parses its log and writes
    /// `results.json` and `results.csv` next to it.
    pub fn run(&self) -> Result<Extraction> {
        let identity = identity_from_result_path(&self.result_path)?;
        let result_dir = resolve_result_dir(&self.result_path)?;
        debug!(dir = %result_dir.display(), "resolved result directory");

        let log = read_log(&result_dir.join(STDOUT_LOG))?;
        let document = ResultDocument::new(&identity, self.extract(&log));

        json::write_results(&result_dir.join(RESULTS_JSON), &document)?;
        csv::write_results(&result_dir.join(RESULTS_CSV), &document)?;
        info!(
            dir = %result_dir.display(),
            metrics = document.metrics.len(),
            "wrote result files"
        );

        Ok(Extraction {
            result_dir,
            document,
        })
    }
}

fn identity_from_result_path(result_path: &Path) -> Result<RunIdentity> {
    let run_id = result_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| LocalTestError::MalformedRunId {
            run_id: result_path.display().to_string(),
        })?;
    RunIdentity::parse(&run_id)
}

fn read_log(path: &Path) -> Result<String> {
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(LocalTestError::LogNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(LocalTestError::io(path, e)),
    }
}
