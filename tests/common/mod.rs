// Shared test helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// A definition that exercises params, install and run sections.
pub const SMOKE_DEFINITION: &str = r#"metadata:
    format: Lava-Test Test Definition 1.0
    name: smoke-tests-basic
    description: "Basic system test command for Linaro Ubuntu images"
    os:
        - ubuntu
params:
    SKIP_INSTALL: "false"
install:
    deps:
        - lsb-release
run:
    steps:
        - echo "<LAVA_SIGNAL_TESTCASE TEST_CASE_ID=linux-linaro-ubuntu-pwd RESULT=pass>"
        - echo "<LAVA_SIGNAL_TESTCASE TEST_CASE_ID=linux-linaro-ubuntu-uname RESULT=fail>"
        - echo "boot-time 3.2 s PASS"
parse:
    pattern: "(?P<test_case_id>boot-time) (?P<measurement>[0-9.]+) (?P<units>\\w+) (?P<result>PASS|FAIL)"
    fixupdict:
        PASS: pass
        FAIL: fail
"#;

/// Stand-in for `lava-test-runner`: reads the conf file, runs `run.sh`
/// and tees its output into `results/<run-id>-<timestamp>/stdout.log`.
pub const FAKE_RUNNER: &str = r#"#!/bin/sh
OUTPUT="$1"
TEST_DIR=$(cat "$OUTPUT/lava-test-runner.conf")
RUN_ID=$(basename "$TEST_DIR")
RESULT_DIR="$OUTPUT/results/$RUN_ID-$(date +%s)"
mkdir -p "$RESULT_DIR"
sh "$TEST_DIR/run.sh" > "$RESULT_DIR/stdout.log" 2>&1
cat "$RESULT_DIR/stdout.log"
"#;

/// Creates a local definitions repository holding `defs/<file_name>`.
pub fn create_repo(root: &Path, file_name: &str, definition: &str) -> PathBuf {
    let repo = root.join("test-definitions");
    let defs = repo.join("defs");
    fs::create_dir_all(&defs).expect("Failed to create definitions directory");
    fs::write(defs.join(file_name), definition).expect("Failed to write definition");
    repo
}

/// Creates a runner helper directory whose `lava-test-runner` is `script`.
pub fn create_shell_dir(root: &Path, script: &str) -> PathBuf {
    let shell_dir = root.join("lava_test_shell");
    fs::create_dir_all(&shell_dir).expect("Failed to create shell directory");
    let runner = shell_dir.join("lava-test-runner");
    fs::write(&runner, script).expect("Failed to write runner");
    make_executable(&runner);
    shell_dir
}

#[cfg(unix)]
pub fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path).expect("Failed to stat file").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions).expect("Failed to chmod file");
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) {}

/// A workspace with a repository, a fake runner and an output root.
pub struct Workspace {
    pub dir: TempDir,
    pub repo: PathBuf,
    pub shell_dir: PathBuf,
    pub output: PathBuf,
}

pub fn setup_workspace(definition: &str) -> Workspace {
    let dir = tempdir().expect("Failed to create temporary directory");
    let repo = create_repo(dir.path(), "smoke-tests-basic.yaml", definition);
    let shell_dir = create_shell_dir(dir.path(), FAKE_RUNNER);
    let output = dir.path().join("result");
    Workspace {
        dir,
        repo,
        shell_dir,
        output,
    }
}

/// Creates `results/<run_id>-<suffix>/stdout.log` under `output` and
/// returns the nominal `results/<run_id>` path.
pub fn create_result_dir(output: &Path, run_id: &str, suffix: &str, log: &str) -> PathBuf {
    let results = output.join("results");
    let dir = results.join(format!("{run_id}-{suffix}"));
    fs::create_dir_all(&dir).expect("Failed to create result directory");
    fs::write(dir.join("stdout.log"), log).expect("Failed to write log");
    results.join(run_id)
}

/// The single directory directly below `path`.
pub fn only_subdir(path: &Path) -> PathBuf {
    let dirs: Vec<PathBuf> = fs::read_dir(path)
        .expect("Failed to read directory")
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    assert_eq!(dirs.len(), 1, "expected exactly one directory in {}", path.display());
    dirs.into_iter().next().unwrap()
}
