use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;

mod common;

fn lava_local_test() -> Command {
    let mut cmd = Command::cargo_bin("lava-local-test").unwrap();
    cmd.env("NO_COLOR", "1").arg("--lang").arg("en");
    cmd
}

/// Running without a subcommand prints usage and fails.
///
/// 不带子命令运行时打印用法并失败。
#[test]
fn test_no_subcommand_prints_help() {
    let mut cmd = Command::cargo_bin("lava-local-test").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

/// `--test` is required for `run`.
#[test]
fn test_run_requires_test_definition() {
    lava_local_test()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--test"));
}

/// A definition path that does not exist in the repository fails before
/// anything is written to the output root.
///
/// 仓库中不存在的定义路径会在写入输出根目录之前失败。
#[test]
fn test_missing_definition_fails_without_side_effects() {
    let ws = common::setup_workspace(common::SMOKE_DEFINITION);

    lava_local_test()
        .current_dir(ws.dir.path())
        .arg("run")
        .arg("-r")
        .arg(&ws.repo)
        .arg("-d")
        .arg("defs/missing.yaml")
        .arg("-o")
        .arg(&ws.output)
        .arg("--shell-dir")
        .arg(&ws.shell_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Test definition not found"));

    assert!(!ws.output.exists());
}

/// A definition without `metadata.name` is rejected before setup.
#[test]
fn test_invalid_definition_fails_without_side_effects() {
    let ws = common::setup_workspace("metadata:\n  format: x\nrun:\n  steps:\n    - true\n");

    lava_local_test()
        .current_dir(ws.dir.path())
        .arg("run")
        .arg("-r")
        .arg(&ws.repo)
        .arg("-d")
        .arg("defs/smoke-tests-basic.yaml")
        .arg("-o")
        .arg(&ws.output)
        .arg("--shell-dir")
        .arg(&ws.shell_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("metadata.name"));

    assert!(!ws.output.exists());
}

/// An explicit config file that does not exist is an error.
#[test]
fn test_explicit_missing_config_fails() {
    let ws = common::setup_workspace(common::SMOKE_DEFINITION);

    lava_local_test()
        .current_dir(ws.dir.path())
        .arg("run")
        .arg("-d")
        .arg("defs/smoke-tests-basic.yaml")
        .arg("-c")
        .arg("missing.toml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}

/// `init` writes a config file, refuses to overwrite it, and overwrites it
/// with `--force`.
///
/// `init` 写入配置文件，拒绝覆盖已有文件，使用 `--force` 时覆盖。
#[test]
fn test_init_writes_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conf/lava-local-test.toml");

    lava_local_test()
        .arg("init")
        .arg("--output")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration written to"));
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("poll_interval_ms = 1000"));

    fs::write(&path, "custom").unwrap();
    lava_local_test()
        .arg("init")
        .arg("--output")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "custom");

    lava_local_test()
        .arg("init")
        .arg("--output")
        .arg(&path)
        .arg("--force")
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&path).unwrap(), content);
}

/// Help text follows `--lang`.
#[test]
fn test_chinese_help() {
    let mut cmd = Command::cargo_bin("lava-local-test").unwrap();
    cmd.arg("--lang")
        .arg("zh-CN")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("在本地机器上运行 LAVA 测试定义"));
}
