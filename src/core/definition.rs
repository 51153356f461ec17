//! # Test Definition Module / 测试定义模块
//!
//! This module parses a LAVA test definition (YAML) into a validated,
//! immutable [`Definition`]. Optional sections keep their presence state:
//! an absent `params` block and an empty one are different values, and the
//! script generator treats them differently.
//!
//! 此模块将 LAVA 测试定义（YAML）解析为经过验证的不可变 [`Definition`]。
//! 可选部分保留其存在状态：缺失的 `params` 块与空块是不同的值。

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{LocalTestError, Result};

/// Branch value that makes the install script clone `"$BRANCH"` from the
/// environment instead of a literal branch.
pub const BRANCH_SENTINEL: &str = "BRANCH";

/// Parameter keys that are bookkeeping, never script variables.
const IGNORED_PARAMETER_KEYS: &[&str] = &["yaml_line"];

/// A `name='value'` pair from the `params`/`parameters` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

/// One entry of `install.git-repos`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepo {
    pub url: String,
    pub branch: Option<String>,
}

impl GitRepo {
    /// Whether the branch should come from `$BRANCH` at install time.
    pub fn uses_branch_env(&self) -> bool {
        self.branch.as_deref() == Some(BRANCH_SENTINEL)
    }
}

/// The `install` section. Each sub-section is `None` when the key is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Install {
    pub deps: Option<Vec<String>>,
    pub git_repos: Option<Vec<GitRepo>>,
    pub steps: Option<Vec<String>>,
}

/// `git-repos` entries are either a bare URL or a mapping with `url`/`branch`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GitRepoEntry {
    Url(String),
    Detailed {
        url: Option<String>,
        branch: Option<String>,
    },
}

/// A parsed and validated test definition.
///
/// The full source document is kept alongside the interpreted fields so that
/// [`Definition::to_yaml`] dumps every key, including ones this tool does not
/// interpret.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    name: String,
    metadata: Mapping,
    parameters: Option<Vec<Parameter>>,
    install: Option<Install>,
    run: Vec<String>,
    parse_pattern: Option<String>,
    fixupdict: Option<BTreeMap<String, String>>,
    document: Value,
}

impl Definition {
    /// Reads and parses a definition file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| LocalTestError::io(path, e))?;
        Self::parse(&text, path)
    }

    /// Parses a definition from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::parse(text, Path::new("<string>"))
    }

    fn parse(text: &str, origin: &Path) -> Result<Self> {
        let document: Value =
            serde_yaml::from_str(text).map_err(|source| LocalTestError::DefinitionParse {
                path: origin.to_path_buf(),
                source,
            })?;
        let root = document.as_mapping().ok_or_else(|| invalid("document root must be a mapping"))?;

        let metadata = match root.get("metadata") {
            Some(Value::Mapping(m)) => m.clone(),
            Some(_) => return Err(invalid("'metadata' must be a mapping")),
            None => return Err(LocalTestError::MissingField { field: "metadata" }),
        };
        let name = metadata
            .get("name")
            .and_then(scalar_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(LocalTestError::MissingField {
                field: "metadata.name",
            })?;

        // `params` takes precedence over `parameters` when both exist.
        let parameters = match root.get("params").or_else(|| root.get("parameters")) {
            Some(block) => Some(parse_parameters(block)?),
            None => None,
        };

        let install = match root.get("install") {
            Some(section) => Some(parse_install(section)?),
            None => None,
        };

        let run = match root.get("run") {
            Some(Value::Mapping(run)) => match run.get("steps") {
                Some(steps) => string_list(steps, "run.steps")?,
                None => Vec::new(),
            },
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(invalid("'run' must be a mapping")),
        };

        let (parse_pattern, fixupdict) = match root.get("parse") {
            Some(Value::Mapping(parse)) => parse_parse_section(parse)?,
            Some(Value::Null) | None => (None, None),
            Some(_) => return Err(invalid("'parse' must be a mapping")),
        };

        Ok(Self {
            name,
            metadata,
            parameters,
            install,
            run,
            parse_pattern,
            fixupdict,
            document,
        })
    }

    /// `metadata.name`, exported as `TESTRUN_ID` by the run script.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &Mapping {
        &self.metadata
    }

    /// `None` when the document has neither `params` nor `parameters`.
    pub fn parameters(&self) -> Option<&[Parameter]> {
        self.parameters.as_deref()
    }

    pub fn install(&self) -> Option<&Install> {
        self.install.as_ref()
    }

    pub fn run_steps(&self) -> &[String] {
        &self.run
    }

    pub fn parse_pattern(&self) -> Option<&str> {
        self.parse_pattern.as_deref()
    }

    pub fn fixupdict(&self) -> Option<&BTreeMap<String, String>> {
        self.fixupdict.as_ref()
    }

    /// Full-document dump, written as `testdef.yaml`.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.document)?)
    }

    /// Metadata-only dump, written as `testdef_metadata`.
    pub fn metadata_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.metadata)?)
    }
}

fn invalid(reason: impl Into<String>) -> LocalTestError {
    LocalTestError::InvalidDefinition {
        reason: reason.into(),
    }
}

/// Renders a YAML scalar the way it would be written in the document.
/// Null becomes the empty string; sequences and mappings are not scalars.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        Value::Tagged(tagged) => scalar_text(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Parameter values keep the capitalised boolean spelling older LAVA tooling
/// emits into `run.sh`, so `SKIP_INSTALL: true` becomes `SKIP_INSTALL='True'`.
fn parameter_text(value: &Value) -> Option<String> {
    match value {
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Tagged(tagged) => parameter_text(&tagged.value),
        other => scalar_text(other),
    }
}

fn string_list(value: &Value, section: &str) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                scalar_text(item)
                    .ok_or_else(|| invalid(format!("'{section}' entries must be scalars")))
            })
            .collect(),
        _ => Err(invalid(format!("'{section}' must be a list"))),
    }
}

fn parse_parameters(block: &Value) -> Result<Vec<Parameter>> {
    let mapping = match block {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(m) => m,
        _ => return Err(invalid("parameters must be a mapping")),
    };

    let mut parameters = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let name = scalar_text(key)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| invalid("parameter names must be non-empty scalars"))?;
        if IGNORED_PARAMETER_KEYS.contains(&name.as_str()) {
            continue;
        }
        let value = parameter_text(value)
            .ok_or_else(|| invalid(format!("parameter '{name}' must have a scalar value")))?;
        parameters.push(Parameter { name, value });
    }
    Ok(parameters)
}

fn parse_install(section: &Value) -> Result<Install> {
    let mapping = match section {
        Value::Null => return Ok(Install::default()),
        Value::Mapping(m) => m,
        _ => return Err(invalid("'install' must be a mapping")),
    };

    let deps = mapping
        .get("deps")
        .map(|v| string_list(v, "install.deps"))
        .transpose()?;
    let steps = mapping
        .get("steps")
        .map(|v| string_list(v, "install.steps"))
        .transpose()?;
    let git_repos = match mapping.get("git-repos") {
        Some(Value::Null) => Some(Vec::new()),
        Some(value) => {
            let entries: Vec<GitRepoEntry> = serde_yaml::from_value(value.clone())
                .map_err(|e| invalid(format!("'install.git-repos': {e}")))?;
            Some(
                entries
                    .into_iter()
                    .filter_map(|entry| match entry {
                        GitRepoEntry::Url(url) => Some(GitRepo { url, branch: None }),
                        // Entries without a url have nothing to clone.
                        GitRepoEntry::Detailed { url, branch } => {
                            url.map(|url| GitRepo { url, branch })
                        }
                    })
                    .collect(),
            )
        }
        None => None,
    };

    Ok(Install {
        deps,
        git_repos,
        steps,
    })
}

type ParseSection = (Option<String>, Option<BTreeMap<String, String>>);

fn parse_parse_section(parse: &Mapping) -> Result<ParseSection> {
    let pattern = match parse.get("pattern") {
        Some(Value::String(p)) => {
            regex::Regex::new(p).map_err(|source| LocalTestError::InvalidPattern {
                pattern: p.clone(),
                source,
            })?;
            Some(p.clone())
        }
        Some(Value::Null) | None => None,
        Some(_) => return Err(invalid("'parse.pattern' must be a string")),
    };

    let fixupdict = match parse.get("fixupdict") {
        Some(Value::Mapping(m)) => {
            let mut fixups = BTreeMap::new();
            for (raw, canonical) in m {
                match (scalar_text(raw), scalar_text(canonical)) {
                    (Some(raw), Some(canonical)) => {
                        fixups.insert(raw, canonical);
                    }
                    _ => return Err(invalid("'parse.fixupdict' must map scalars to scalars")),
                }
            }
            Some(fixups)
        }
        Some(Value::Null) | None => None,
        Some(_) => return Err(invalid("'parse.fixupdict' must be a mapping")),
    };

    Ok((pattern, fixupdict))
}
