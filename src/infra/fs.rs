//! # File System Operations Module / 文件系统操作模块
//!
//! This module prepares the output root before the runner starts: it
//! resolves the definitions repository, copies it into the test directory,
//! writes the `uuid` and runner config files, and installs the runner
//! helpers into `bin/`. It also locates the timestamped result directory
//! the runner creates.
//!
//! 此模块在运行器启动前准备输出根目录：解析定义仓库、将其复制到测试目录、
//! 写入 `uuid` 和运行器配置文件，并将运行器辅助脚本安装到 `bin/`。
//! 它还负责定位运行器创建的带时间戳的结果目录。

use fs_extra::dir::{CopyOptions, copy};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::planner::{RunPlan, UUID_FILE};
use crate::error::{LocalTestError, Result};
use crate::infra::command::git_clone;

/// Directory name a remote repository is cloned into:
/// `https://host/qa/test-definitions.git` becomes `test-definitions`.
pub fn repository_dir_name(location: &str) -> Option<String> {
    let last = location.trim_end_matches('/').rsplit(['/', ':']).next()?;
    Path::new(last)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Whether `location` names a remote repository rather than a local path.
pub fn is_remote(location: &str) -> bool {
    location.contains("://") || (location.contains('@') && location.contains(':'))
}

/// Resolves the definitions repository to a local directory.
///
/// An existing local directory is used as is. Anything else is treated as a
/// remote URL and cloned into `workdir`, unless a clone from an earlier run
/// is already there.
pub async fn resolve_repository(location: &str, workdir: &Path) -> Result<PathBuf> {
    let local = Path::new(location);
    if local.is_dir() {
        debug!(path = %local.display(), "using local test definitions");
        return Ok(local.to_path_buf());
    }
    if !is_remote(location) {
        return Err(LocalTestError::RepositoryNotFound {
            location: location.to_string(),
        });
    }

    let name = repository_dir_name(location).ok_or_else(|| LocalTestError::RepositoryNotFound {
        location: location.to_string(),
    })?;
    let dest = workdir.join(name);
    if dest.is_dir() {
        debug!(path = %dest.display(), "reusing cloned test definitions");
        return Ok(dest);
    }

    info!(url = location, dest = %dest.display(), "cloning test definitions");
    git_clone(location, &dest, workdir).await?;
    Ok(dest)
}

/// Joins the definition path onto the repository and checks it is a file.
pub fn resolve_definition(repo_dir: &Path, test_def: &Path) -> Result<PathBuf> {
    let path = repo_dir.join(test_def);
    if path.is_file() {
        Ok(path)
    } else {
        Err(LocalTestError::DefinitionNotFound { path })
    }
}

/// Creates the output root if needed and returns its absolute path.
pub fn prepare_output_root(output: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output).map_err(|e| LocalTestError::io(output, e))?;
    absolute_path(output)
}

/// Gets the absolute path from a potentially relative path.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| LocalTestError::io(path, e))
}

/// Copies the entire content of a source directory into a destination
/// directory, creating it and overwriting files that already exist.
pub fn copy_dir_all(from: &Path, to: &Path) -> Result<()> {
    fs::create_dir_all(to).map_err(|e| LocalTestError::io(to, e))?;
    let mut options = CopyOptions::new();
    options.overwrite = true;
    options.content_only = true;
    copy(from, to, &options)
        .map_err(|e| LocalTestError::io(from, std::io::Error::other(e.to_string())))?;
    Ok(())
}

fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LocalTestError::io(path, e)),
    }
}

/// Replaces the test directory with a fresh copy of the repository.
pub fn copy_test_repo(repo_dir: &Path, test_path: &Path) -> Result<()> {
    remove_dir_if_exists(test_path)?;
    copy_dir_all(repo_dir, test_path)?;
    debug!(from = %repo_dir.display(), to = %test_path.display(), "copied test repository");
    Ok(())
}

/// Writes the single-line file telling the runner where the test lives.
pub fn write_runner_conf(conf_path: &Path, test_path: &Path) -> Result<()> {
    fs::write(conf_path, test_path.to_string_lossy().as_bytes())
        .map_err(|e| LocalTestError::io(conf_path, e))
}

/// Replaces `bin_path` with the contents of `shell_dir`. When a distro is
/// given and `<shell_dir>/distro/<id>/` exists, its files override the
/// generic helpers.
pub fn copy_bin_files(shell_dir: &Path, bin_path: &Path, distro: Option<&str>) -> Result<()> {
    if !shell_dir.is_dir() {
        return Err(LocalTestError::io(
            shell_dir,
            std::io::Error::new(ErrorKind::NotFound, "runner helper directory not found"),
        ));
    }
    remove_dir_if_exists(bin_path)?;
    copy_dir_all(shell_dir, bin_path)?;

    if let Some(distro) = distro {
        let overlay = shell_dir.join("distro").join(distro);
        if overlay.is_dir() {
            copy_dir_all(&overlay, bin_path)?;
            debug!(distro, "installed distro-specific runner helpers");
        }
    }
    Ok(())
}

/// Writes the run token into `<test_path>/uuid`, where `run.sh` reads it.
pub fn write_uuid_file(test_path: &Path, token: &str) -> Result<()> {
    let path = test_path.join(UUID_FILE);
    fs::write(&path, token).map_err(|e| LocalTestError::io(&path, e))
}

/// Performs every setup step for `plan`, in the order the runner needs.
pub fn setup_run(
    plan: &RunPlan,
    repo_dir: &Path,
    shell_dir: &Path,
    distro: Option<&str>,
) -> Result<()> {
    copy_test_repo(repo_dir, &plan.test_path)?;
    write_runner_conf(&plan.runner_conf, &plan.test_path)?;
    copy_bin_files(shell_dir, &plan.bin_path, distro)?;
    write_uuid_file(&plan.test_path, plan.identity.token())?;
    Ok(())
}

/// Finds the directory the runner created for `nominal`
/// (`results/<run-id>-<timestamp>`). The first match in sorted order wins.
pub fn resolve_result_dir(nominal: &Path) -> Result<PathBuf> {
    let pattern = format!(
        "{}-[0-9]*",
        glob::Pattern::escape(&nominal.to_string_lossy())
    );
    let not_found = || LocalTestError::ResultDirNotFound {
        pattern: pattern.clone(),
    };

    let mut matches: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|_| not_found())?
        .filter_map(std::result::Result::ok)
        .filter(|path| path.is_dir())
        .collect();
    matches.sort();
    matches.into_iter().next().ok_or_else(not_found)
}
