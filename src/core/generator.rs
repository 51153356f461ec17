//! # Script Generator Module / 脚本生成模块
//!
//! This module turns a [`Definition`] into the files `lava-test-runner`
//! expects in the test directory: `install.sh`, `run.sh`, and two YAML
//! dumps of the definition. Generation is pure; [`GeneratedScripts::write_to`]
//! does the I/O.
//!
//! `run.sh` is opened in append mode because the copied repository may
//! already contain scaffolding in that file. Writing the same scripts twice
//! therefore appends a second run section, while every other file is
//! rewritten byte-for-byte.
//!
//! 此模块将 [`Definition`] 转换为 `lava-test-runner` 在测试目录中所需的文件：
//! `install.sh`、`run.sh` 以及定义的两个 YAML 副本。生成过程是纯函数；
//! [`GeneratedScripts::write_to`] 负责 I/O。`run.sh` 以追加模式写入。

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::Path;
use tracing::debug;

use crate::core::definition::{Definition, GitRepo, Parameter};
use crate::core::planner::{INSTALL_SCRIPT, RUN_SCRIPT, TESTDEF_FILE, TESTDEF_METADATA_FILE, UUID_FILE};
use crate::error::{LocalTestError, Result};

const PARAMETERS_HEADER: &str = "###default parameters from test definition###";
const PARAMETERS_FOOTER: &str = "######";
const INSTALL_HEADER: &str = "###install deps/steps/git-repos defined in test definition###";
const INSTALL_PACKAGES_COMMAND: &str = "lava-install-packages";

/// Run steps containing one of these tokens pass a command string on to
/// another shell, so their positional parameters must survive until then.
const NESTED_SHELL_MARKERS: &[&str] = &["--cmd", "--shell"];

static POSITIONAL_PARAMETER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\d+)\b").expect("positional parameter regex is valid"));

/// Everything generated for one test directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedScripts {
    /// `testdef.yaml`
    pub definition_yaml: String,
    /// `testdef_metadata`
    pub metadata_yaml: String,
    /// `install.sh`; `None` when there is no install section or it is skipped.
    pub install: Option<String>,
    /// `run.sh` section, appended to any existing content.
    pub run: String,
}

impl GeneratedScripts {
    /// Writes the artifacts into `test_path`, which must already exist.
    pub fn write_to(&self, test_path: &Path) -> Result<()> {
        write_file(&test_path.join(TESTDEF_FILE), &self.definition_yaml)?;
        write_file(&test_path.join(TESTDEF_METADATA_FILE), &self.metadata_yaml)?;

        if let Some(install) = &self.install {
            write_file(&test_path.join(INSTALL_SCRIPT), install)?;
        }

        let run_path = test_path.join(RUN_SCRIPT);
        let mut run_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&run_path)
            .map_err(|e| LocalTestError::io(&run_path, e))?;
        run_file
            .write_all(self.run.as_bytes())
            .map_err(|e| LocalTestError::io(&run_path, e))?;
        debug!(path = %run_path.display(), bytes = self.run.len(), "appended run script");

        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| LocalTestError::io(path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "wrote test artifact");
    Ok(())
}

/// Generates scripts for one definition and one test directory.
///
/// 为一个定义和一个测试目录生成脚本。
#[derive(Debug, Clone, Copy)]
pub struct ScriptGenerator<'a> {
    definition: &'a Definition,
    test_path: &'a Path,
    skip_install: bool,
}

impl<'a> ScriptGenerator<'a> {
    pub fn new(definition: &'a Definition, test_path: &'a Path, skip_install: bool) -> Self {
        Self {
            definition,
            test_path,
            skip_install,
        }
    }

    /// Produces all four artifacts.
    pub fn generate(&self) -> Result<GeneratedScripts> {
        Ok(GeneratedScripts {
            definition_yaml: self.definition.to_yaml()?,
            metadata_yaml: self.definition.metadata_yaml()?,
            install: self.install_script(),
            run: self.run_script(),
        })
    }

    /// The install script, if the definition has an install section and
    /// installation is not skipped.
    ///
    /// Sub-sections are emitted in a fixed order (git repositories, package
    /// dependencies, literal steps) regardless of their order in the document.
    pub fn install_script(&self) -> Option<String> {
        if self.skip_install {
            return None;
        }
        let install = self.definition.install()?;

        let mut script = self.prologue();
        script.push_str(INSTALL_HEADER);
        script.push('\n');

        if let Some(repos) = &install.git_repos {
            for repo in repos {
                script.push_str(&clone_command(repo));
                script.push('\n');
            }
        }

        if let Some(deps) = install.deps.as_ref().filter(|d| !d.is_empty()) {
            let _ = writeln!(script, "{INSTALL_PACKAGES_COMMAND} {}", deps.join(" "));
        }

        if let Some(steps) = &install.steps {
            for step in steps {
                script.push_str(step);
                script.push('\n');
            }
        }

        Some(script)
    }

    /// The run script section, bracketed by start/end signal lines.
    pub fn run_script(&self) -> String {
        let mut script = self.prologue();
        let _ = writeln!(script, "export TESTRUN_ID={}", shell_word(self.definition.name()));
        let _ = writeln!(script, "UUID=`cat {UUID_FILE}`");
        script.push_str("echo \"<LAVA_SIGNAL_STARTRUN $TESTRUN_ID $UUID>\"\n");
        for step in self.definition.run_steps() {
            script.push_str(&escape_run_step(step));
            script.push('\n');
        }
        script.push_str("echo \"<LAVA_SIGNAL_ENDRUN $TESTRUN_ID $UUID>\"\n");
        script
    }

    /// Preamble, `set -e` and the directory change shared by both scripts.
    fn prologue(&self) -> String {
        let mut prologue = parameter_preamble(self.definition.parameters()).unwrap_or_default();
        prologue.push_str("set -e\n");
        let _ = writeln!(
            prologue,
            "cd {}",
            shell_word(&self.test_path.to_string_lossy())
        );
        prologue
    }
}

/// Renders the parameter block. `None` when the definition has no
/// parameter block at all; an empty block still yields header and footer.
pub fn parameter_preamble(parameters: Option<&[Parameter]>) -> Option<String> {
    let parameters = parameters?;
    let mut preamble = String::new();
    preamble.push_str(PARAMETERS_HEADER);
    preamble.push('\n');
    for Parameter { name, value } in parameters {
        let _ = writeln!(preamble, "{name}='{}'", value.replace('\'', r"'\''"));
    }
    preamble.push_str(PARAMETERS_FOOTER);
    preamble.push('\n');
    Some(preamble)
}

/// One `git clone` line. The `BRANCH` sentinel defers the branch to the
/// `$BRANCH` environment variable at install time.
pub fn clone_command(repo: &GitRepo) -> String {
    let url = shell_word(&repo.url);
    match repo.branch.as_deref() {
        _ if repo.uses_branch_env() => format!("git clone -b \"$BRANCH\" {url}"),
        Some(branch) => format!("git clone -b {} {url}", shell_word(branch)),
        None => format!("git clone {url}"),
    }
}

/// Rewrites `$1`, `$2`, ... to `\$1`, `\$2`, ... in steps that hand a
/// command string to a nested shell. Other steps are returned unchanged.
pub fn escape_run_step(step: &str) -> Cow<'_, str> {
    if NESTED_SHELL_MARKERS.iter().any(|marker| step.contains(marker)) {
        POSITIONAL_PARAMETER.replace_all(step, r"\$$${1}")
    } else {
        Cow::Borrowed(step)
    }
}

/// Quotes a word for the shell only when it needs quoting.
fn shell_word(raw: &str) -> Cow<'_, str> {
    shlex::try_quote(raw).unwrap_or(Cow::Borrowed(raw))
}
