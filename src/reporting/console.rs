//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the result summary of a run: one colored row per
//! metric followed by pass/fail/skip totals.
//!
//! 此模块打印一次运行的结果摘要：每个指标一行彩色输出，随后是通过/失败/跳过的总数。

use colored::*;

use crate::core::execution::{SupervisionReport, SupervisorState};
use crate::core::models::{MetricOutcome, ResultDocument};
use crate::infra::t;

/// Prints a formatted summary of the extracted metrics.
///
/// # Output Format / 输出格式
/// ```text
/// --- Test Summary: smoke-tests-basic (3f2c...) ---
///   - pass     | linux-linaro-ubuntu-pwd                  |
///   - fail     | linux-linaro-ubuntu-lsb_release          |
///   - pass     | boot-time                                | 3.2 s
/// ```
pub fn print_summary(document: &ResultDocument, locale: &str) {
    println!(
        "\n{}",
        t!("summary.banner", locale = locale, test = &document.test, id = &document.id).bold()
    );

    if document.metrics.is_empty() {
        println!("  {}", t!("summary.no_metrics", locale = locale).dimmed());
        return;
    }

    for metric in &document.metrics {
        let result = match metric.outcome() {
            MetricOutcome::Pass => metric.result.green(),
            MetricOutcome::Fail => metric.result.red(),
            MetricOutcome::Skip => metric.result.yellow(),
            MetricOutcome::Unknown => metric.result.dimmed(),
        };
        let measurement = format!("{} {}", metric.measurement, metric.units);
        println!(
            "  - {:<8} | {:<40} | {}",
            result,
            metric.test_case_id,
            measurement.trim()
        );
    }

    println!(
        "\n{}",
        t!(
            "summary.totals",
            locale = locale,
            pass = document.count(MetricOutcome::Pass),
            fail = document.count(MetricOutcome::Fail),
            skip = document.count(MetricOutcome::Skip),
            total = document.metrics.len()
        )
    );
}

/// Prints how the runner process ended.
pub fn print_supervision(report: &SupervisionReport, run_id: &str, locale: &str) {
    match report.state {
        SupervisorState::Completed => {
            let status = report
                .exit_status
                .and_then(|s| s.code())
                .map_or_else(|| "-".to_string(), |code| code.to_string());
            println!(
                "{}",
                t!(
                    "run.finished",
                    locale = locale,
                    run_id = run_id,
                    duration = format!("{:.2?}", report.elapsed),
                    status = status
                )
                .green()
            );
        }
        SupervisorState::TimedOut => {
            println!(
                "{}",
                t!(
                    "run.timed_out",
                    locale = locale,
                    run_id = run_id,
                    duration = format!("{:.2?}", report.elapsed)
                )
                .red()
            );
        }
        SupervisorState::Running => {}
    }
}
