//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command: resolve the definition, lay
//! out the output root, generate the scripts, supervise the runner and
//! collect its results.
//!
//! 此模块实现了 `run` 命令：解析测试定义、准备输出根目录、生成脚本、
//! 监控运行器并收集其结果。

use anyhow::{Context, Result};
use colored::*;
use std::{
    env,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::{
    core::{
        config::{self, CliOverrides, FileConfig, RunConfig, DEFAULT_CONFIG_FILE},
        definition::Definition,
        execution::{self, Supervisor},
        extractor::ResultExtractor,
        generator::ScriptGenerator,
        models::RunIdentity,
        planner::{self, RunPlan},
    },
    infra::{distro, fs, t},
    reporting::console::{print_summary, print_supervision},
};

/// Executes the run command.
///
/// # Arguments
/// * `overrides` - Values given on the command line
/// * `config` - Explicit config file; the default one is optional
/// * `explicit_language` - Whether `--lang` was given, which beats the file
/// * `locale` - Language selected so far
pub async fn execute(
    overrides: CliOverrides,
    config: Option<PathBuf>,
    explicit_language: bool,
    locale: String,
) -> Result<()> {
    let file_config = load_file_config(config, &locale)?;
    let locale = match (&file_config.language, explicit_language) {
        (Some(language), false) => crate::init(Some(language)),
        _ => locale,
    };

    let run_config = RunConfig::resolve(file_config, overrides)
        .with_context(|| t!("run.config_invalid", locale = &locale).to_string())?;
    debug!(?run_config, "resolved run configuration");

    // Everything that can reject the definition happens before the output
    // root is touched.
    let cwd = env::current_dir().context("failed to read the current directory")?;
    let repo_dir = fs::resolve_repository(&run_config.repo, &cwd)
        .await
        .with_context(|| t!("run.repo_failed", locale = &locale, repo = &run_config.repo).to_string())?;
    let definition_path = fs::resolve_definition(&repo_dir, &run_config.test_def)?;
    let definition = Definition::load(&definition_path).with_context(|| {
        t!(
            "run.definition_failed",
            locale = &locale,
            path = definition_path.display()
        )
        .to_string()
    })?;
    println!(
        "{}",
        t!(
            "run.definition_loaded",
            locale = &locale,
            name = definition.name().yellow(),
            path = definition_path.display()
        )
    );

    let plan = prepare_run(&run_config, &repo_dir, &locale)?;
    let run_id = plan.identity.run_id();

    let scripts = ScriptGenerator::new(&definition, &plan.test_path, run_config.skip_install)
        .generate()?;
    scripts.write_to(&plan.test_path)?;
    if run_config.skip_install {
        println!("{}", t!("run.skip_install", locale = &locale).yellow());
    }
    println!(
        "{}",
        t!(
            "run.scripts_written",
            locale = &locale,
            path = plan.test_path.display()
        )
    );

    let supervisor = Supervisor::from_config(&run_config);
    println!(
        "\n{}",
        t!("run.about_to_run", locale = &locale, run_id = &run_id).bold()
    );
    if let Some(timeout) = supervisor.timeout() {
        println!(
            "{}",
            t!("run.test_timeout", locale = &locale, timeout = timeout.as_secs()).cyan()
        );
    }

    let cmd = execution::runner_command(&plan, run_config.runner.as_deref())?;
    let report = supervisor
        .supervise(cmd, |line| println!("{line}"))
        .await
        .with_context(|| t!("run.runner_failed", locale = &locale).to_string())?;
    print_supervision(&report, &run_id, &locale);

    // A timed-out run still gets whatever results it produced.
    let extractor = ResultExtractor::for_definition(&plan.result_path, &definition)?;
    if let Some(pattern) = extractor.pattern() {
        println!(
            "{}",
            t!("run.parse_pattern", locale = &locale, pattern = pattern.as_str())
        );
    }
    let extraction = extractor
        .run()
        .with_context(|| t!("run.extract_failed", locale = &locale, run_id = &run_id).to_string())?;

    print_summary(&extraction.document, &locale);
    println!(
        "\n{}",
        t!(
            "run.results_saved",
            locale = &locale,
            path = extraction.result_dir.display()
        )
        .green()
    );

    if report.timed_out() {
        anyhow::bail!(t!("run.incomplete", locale = &locale, run_id = &run_id).to_string());
    }
    Ok(())
}

/// Loads `--config` when given, else the default file if it exists.
fn load_file_config(config: Option<PathBuf>, locale: &str) -> Result<FileConfig> {
    let (path, required) = match config {
        Some(path) => (path, true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    let file_config = config::load_config(&path, required).with_context(|| {
        t!("run.config_read_failed", locale = locale, path = path.display()).to_string()
    })?;
    if path.is_file() {
        println!(
            "{}",
            t!("run.loaded_config", locale = locale, path = path.display())
        );
    }
    Ok(file_config)
}

/// Creates the output root and populates it for a new run.
fn prepare_run(run_config: &RunConfig, repo_dir: &Path, locale: &str) -> Result<RunPlan> {
    let output_root = fs::prepare_output_root(&run_config.output).with_context(|| {
        t!(
            "run.output_failed",
            locale = locale,
            path = run_config.output.display()
        )
        .to_string()
    })?;
    let identity = RunIdentity::for_definition(&run_config.test_def);
    let plan = planner::plan_run(&output_root, identity);

    let distro = distro::detect_distro();
    fs::setup_run(&plan, repo_dir, &run_config.shell_dir, distro.as_deref())
        .with_context(|| t!("run.setup_failed", locale = locale).to_string())?;
    println!(
        "{}",
        t!(
            "run.setup_done",
            locale = locale,
            path = plan.output_root.display()
        )
    );
    Ok(plan)
}
