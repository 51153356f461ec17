//! # Run Planner Module / 运行计划模块
//!
//! This module lays out one run on disk. Every path the pipeline touches is
//! derived here from the output root and the run identity, so the other
//! stages never build paths themselves.
//!
//! 此模块规划一次运行在磁盘上的布局。管道涉及的每个路径都在这里
//! 根据输出根目录和运行标识派生。

use std::path::{Path, PathBuf};

use crate::core::models::RunIdentity;

/// Name of the single-line file that tells the runner where the test lives.
pub const RUNNER_CONF_FILE: &str = "lava-test-runner.conf";
/// Runner executable inside the bin directory.
pub const RUNNER_BINARY: &str = "lava-test-runner";
/// Token file written into the test directory and read by `run.sh`.
pub const UUID_FILE: &str = "uuid";
/// Log file the runner writes into the result directory.
pub const STDOUT_LOG: &str = "stdout.log";

/// Test directory artifacts.
pub const TESTDEF_FILE: &str = "testdef.yaml";
pub const TESTDEF_METADATA_FILE: &str = "testdef_metadata";
pub const INSTALL_SCRIPT: &str = "install.sh";
pub const RUN_SCRIPT: &str = "run.sh";

/// Result directory artifacts.
pub const RESULTS_JSON: &str = "results.json";
pub const RESULTS_CSV: &str = "results.csv";

/// All paths of a single run.
///
/// 单次运行的所有路径。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub identity: RunIdentity,
    /// Output root; also the runner's working directory and argument.
    pub output_root: PathBuf,
    /// `<output>/bin`
    pub bin_path: PathBuf,
    /// `<output>/tests/<run-id>`
    pub test_path: PathBuf,
    /// `<output>/results/<run-id>`; the runner appends `-<timestamp>`.
    pub result_path: PathBuf,
    /// `<output>/lava-test-runner.conf`
    pub runner_conf: PathBuf,
}

impl RunPlan {
    /// The default runner executable, `<output>/bin/lava-test-runner`.
    pub fn runner_binary(&self) -> PathBuf {
        self.bin_path.join(RUNNER_BINARY)
    }

    pub fn uuid_file(&self) -> PathBuf {
        self.test_path.join(UUID_FILE)
    }
}

/// Creates the plan for running `identity` under `output_root`.
pub fn plan_run(output_root: &Path, identity: RunIdentity) -> RunPlan {
    let run_id = identity.run_id();
    RunPlan {
        output_root: output_root.to_path_buf(),
        bin_path: output_root.join("bin"),
        test_path: output_root.join("tests").join(&run_id),
        result_path: output_root.join("results").join(&run_id),
        runner_conf: output_root.join(RUNNER_CONF_FILE),
        identity,
    }
}
