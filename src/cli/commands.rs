//! Subcommands of the `lava-local-test` CLI.
//!
//! `lava-local-test` 命令行的子命令。

pub mod init;
pub mod run;
