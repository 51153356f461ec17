// src/cli.rs
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::config::{CliOverrides, DEFAULT_CONFIG_FILE};
use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        return args.get(pos + 1).cloned();
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang="))
        .map(str::to_string)
}

fn build_cli(locale: &str) -> Command {
    Command::new("lava-local-test")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd.run_about", locale = locale).to_string())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("arg.output", locale = locale).to_string())
                        .value_name("DIR")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("repo")
                        .short('r')
                        .long("repo")
                        .help(t!("arg.repo", locale = locale).to_string())
                        .value_name("REPO")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("test")
                        .short('d')
                        .long("test")
                        .help(t!("arg.test", locale = locale).to_string())
                        .value_name("TEST")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("timeout")
                        .short('t')
                        .long("timeout")
                        .help(t!("arg.timeout", locale = locale).to_string())
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("skip-install")
                        .short('s')
                        .long("skip-install")
                        .alias("skip_install")
                        .help(t!("arg.skip_install", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("shell-dir")
                        .long("shell-dir")
                        .help(t!("arg.shell_dir", locale = locale).to_string())
                        .value_name("DIR")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("runner")
                        .long("runner")
                        .help(t!("arg.runner", locale = locale).to_string())
                        .value_name("COMMAND")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("poll-interval-ms")
                        .long("poll-interval-ms")
                        .help(t!("arg.poll_interval", locale = locale).to_string())
                        .value_name("MILLISECONDS")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("arg.config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cmd.init_about", locale = locale).to_string())
                .arg(
                    Arg::new("output")
                        .long("output")
                        .help(t!("arg.init_output", locale = locale).to_string())
                        .value_name("PATH")
                        .default_value(DEFAULT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("arg.force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn run_overrides(matches: &ArgMatches) -> Result<CliOverrides> {
    let test_def = matches
        .get_one::<PathBuf>("test")
        .cloned()
        .context("--test is required")?;

    Ok(CliOverrides {
        output: matches.get_one::<String>("output").cloned(),
        repo: matches.get_one::<String>("repo").cloned(),
        test_def,
        timeout_secs: matches.get_one::<u64>("timeout").copied(),
        skip_install: matches.get_flag("skip-install"),
        shell_dir: matches.get_one::<String>("shell-dir").cloned(),
        runner: matches.get_one::<String>("runner").cloned(),
        poll_interval_ms: matches.get_one::<u64>("poll-interval-ms").copied(),
    })
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let explicit_language = pre_parse_language();
    let language = crate::init(explicit_language.as_deref());

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let overrides = run_overrides(run_matches)?;
            let config = run_matches.get_one::<PathBuf>("config").cloned();
            commands::run::execute(overrides, config, explicit_language.is_some(), language)
                .await?;
        }
        Some(("init", init_matches)) => {
            let output = init_matches
                .get_one::<PathBuf>("output")
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            let force = init_matches.get_flag("force");
            commands::init::execute(&output, force, &language)?;
        }
        _ => {
            // `subcommand_required` makes clap print help and exit first.
        }
    }
    Ok(())
}
