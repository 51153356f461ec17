//! # Error Types / 错误类型
//!
//! Structured errors for every phase of a local test run. Definition and
//! resolution errors abort before anything is written; extraction errors abort
//! the result phase only. A runner timeout is not an error here, it is a
//! supervision state (see [`crate::core::execution::SupervisorState`]).
//!
//! 本地测试运行各阶段的结构化错误。

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `lava-local-test` operations.
#[derive(Error, Debug)]
pub enum LocalTestError {
    // === Definition Errors ===
    /// The definition document is not valid YAML or does not fit the schema.
    #[error("Failed to parse test definition '{path}': {source}")]
    DefinitionParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required field is missing or empty.
    #[error("Test definition is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// The document parsed, but a section has the wrong shape.
    #[error("Invalid test definition: {reason}")]
    InvalidDefinition { reason: String },

    /// `parse.pattern` does not compile.
    #[error("Invalid parse pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    // === Resolution Errors ===
    /// Neither a local directory nor a cloneable remote.
    #[error("Test definition repository not found: {location}")]
    RepositoryNotFound { location: String },

    /// `git clone` exited unsuccessfully.
    #[error("Failed to clone '{url}':\n{output}")]
    CloneFailed { url: String, output: String },

    /// The definition file does not exist inside the repository.
    #[error("Test definition not found: {path}")]
    DefinitionNotFound { path: PathBuf },

    // === Execution Errors ===
    /// The runner process could not be started.
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A custom runner command could not be expanded or split.
    #[error("Invalid runner command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },

    // === Extraction Errors ===
    /// `stdout.log` is missing from the result directory.
    #[error("Test log not found: {path}")]
    LogNotFound { path: PathBuf },

    /// No timestamped result directory matched the nominal result path.
    #[error("No result directory matches '{pattern}'")]
    ResultDirNotFound { pattern: String },

    /// A run-id without the `_` separator between short name and token.
    #[error("Malformed run id '{run_id}': expected '<name>_<token>'")]
    MalformedRunId { run_id: String },

    // === Plumbing ===
    /// Config file read or parse failure.
    #[error("Invalid config file '{path}': {reason}")]
    Config { path: PathBuf, reason: String },

    /// File system error with the offending path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LocalTestError {
    /// Wraps an `io::Error` together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors raised before any side effect on the output root.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            Self::RepositoryNotFound { .. }
                | Self::CloneFailed { .. }
                | Self::DefinitionNotFound { .. }
        )
    }

    /// True for errors raised while parsing or validating a definition.
    pub fn is_definition(&self) -> bool {
        matches!(
            self,
            Self::DefinitionParse { .. }
                | Self::MissingField { .. }
                | Self::InvalidDefinition { .. }
                | Self::InvalidPattern { .. }
        )
    }
}

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, LocalTestError>;
