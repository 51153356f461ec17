//! # Extractor Module Unit Tests / Extractor 模块单元测试
//!
//! Result extraction from runner logs: the test case signal grammar, parse
//! patterns with fixups, and the files written into the result directory.
//!
//! 从运行器日志中提取结果：测试用例信号语法、带修正字典的解析模式，以及写入结果目录的文件。

use lava_local_test::LocalTestError;
use lava_local_test::core::extractor::{
    LineMatcher, PatternMatcher, ResultExtractor, SignalMatcher, extract_metrics,
};
use lava_local_test::definition::Definition;
use lava_local_test::models::ResultDocument;
use std::collections::BTreeMap;
use std::fs;

mod common;

#[test]
fn test_signal_line_is_parsed() {
    let record = SignalMatcher
        .match_line("<LAVA_SIGNAL_TESTCASE TEST_CASE_ID=boot RESULT=pass MEASUREMENT=1.5 UNITS=s>")
        .unwrap();
    assert_eq!(record.test_case_id, "boot");
    assert_eq!(record.result, "pass");
    assert_eq!(record.measurement, "1.5");
    assert_eq!(record.units, "s");
    assert!(record.extra.is_empty());
}

#[test]
fn test_signal_keys_are_lowercased_and_extras_kept() {
    let record = SignalMatcher
        .match_line("<LAVA_SIGNAL_TESTCASE TEST_CASE_ID=a RESULT=fail Reference=http://x>")
        .unwrap();
    assert_eq!(record.get("reference"), Some("http://x"));
}

#[test]
fn test_signal_tokens_with_extra_equals_are_ignored() {
    let record = SignalMatcher
        .match_line("<LAVA_SIGNAL_TESTCASE TEST_CASE_ID=a RESULT=pass ARGS=a=b>")
        .unwrap();
    assert_eq!(record.result, "pass");
    assert_eq!(record.get("args"), None);
}

#[test]
fn test_non_signal_lines_are_ignored() {
    assert!(SignalMatcher.match_line("some output").is_none());
    assert!(
        SignalMatcher
            .match_line("prefix <LAVA_SIGNAL_TESTCASE TEST_CASE_ID=a RESULT=pass>")
            .is_none()
    );
    assert!(
        SignalMatcher
            .match_line("<LAVA_SIGNAL_STARTRUN smoke 1234>")
            .is_none()
    );
}

#[test]
fn test_pattern_fills_missing_groups_and_applies_fixups() {
    let mut fixups = BTreeMap::new();
    fixups.insert("PASS".to_string(), "pass".to_string());
    let matcher = PatternMatcher::new(r"(?P<test_case_id>\w+): (?P<result>PASS|FAIL)( (?P<measurement>\d+))?")
        .unwrap()
        .with_fixupdict(fixups);

    let record = matcher.match_line("log: cpu: PASS").unwrap();
    assert_eq!(record.test_case_id, "cpu");
    assert_eq!(record.result, "pass");
    assert_eq!(record.measurement, "");
    assert_eq!(record.units, "");

    let record = matcher.match_line("mem: FAIL 12").unwrap();
    assert_eq!(record.result, "FAIL");
    assert_eq!(record.measurement, "12");
}

#[test]
fn test_invalid_pattern_is_rejected() {
    let err = PatternMatcher::new("(?P<result>").unwrap_err();
    assert!(matches!(err, LocalTestError::InvalidPattern { .. }));
}

#[test]
fn test_signal_records_come_before_pattern_records() {
    let log = "cpu: PASS\n<LAVA_SIGNAL_TESTCASE TEST_CASE_ID=boot RESULT=pass>\n";
    let pattern = PatternMatcher::new(r"(?P<test_case_id>\w+): (?P<result>PASS)").unwrap();
    let signal: &dyn LineMatcher = &SignalMatcher;
    let metrics = extract_metrics(log, &[signal, &pattern as &dyn LineMatcher]);
    let ids: Vec<&str> = metrics.iter().map(|m| m.test_case_id.as_str()).collect();
    assert_eq!(ids, vec!["boot", "cpu"]);
}

#[test]
fn test_run_writes_json_and_csv() {
    let dir = tempfile::tempdir().unwrap();
    let log = "<LAVA_SIGNAL_STARTRUN boot 8a1f>\n\
               <LAVA_SIGNAL_TESTCASE TEST_CASE_ID=boot RESULT=pass>\n\
               <LAVA_SIGNAL_ENDRUN boot 8a1f>\n";
    let nominal = common::create_result_dir(dir.path(), "boot-1_8a1f", "1700000000", log);

    let extraction = ResultExtractor::new(&nominal).run().unwrap();
    assert_eq!(extraction.result_dir, dir.path().join("results/boot-1_8a1f-1700000000"));
    assert_eq!(extraction.document.test, "boot-1");
    assert_eq!(extraction.document.id, "8a1f");

    let json = fs::read_to_string(extraction.result_dir.join("results.json")).unwrap();
    let document: ResultDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(document, extraction.document);
    assert!(json.contains("\n    \"test\": \"boot-1\""));

    let csv = fs::read_to_string(extraction.result_dir.join("results.csv")).unwrap();
    assert_eq!(
        csv,
        "test_case_id,result,measurement,units\r\nboot,pass,,\r\n"
    );
}

#[test]
fn test_empty_log_yields_header_only_csv() {
    let dir = tempfile::tempdir().unwrap();
    let nominal = common::create_result_dir(dir.path(), "smoke_abc", "1", "");

    let extraction = ResultExtractor::new(&nominal).run().unwrap();
    assert!(extraction.document.metrics.is_empty());
    let csv = fs::read_to_string(extraction.result_dir.join("results.csv")).unwrap();
    assert_eq!(csv, "test_case_id,result,measurement,units\r\n");
}

#[test]
fn test_for_definition_uses_parse_section() {
    let def = Definition::from_yaml_str(common::SMOKE_DEFINITION).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let log = "<LAVA_SIGNAL_TESTCASE TEST_CASE_ID=linux-linaro-ubuntu-pwd RESULT=pass>\n\
               boot-time 3.2 s PASS\n";
    let nominal = common::create_result_dir(dir.path(), "smoke-tests-basic_42", "99", log);

    let extractor = ResultExtractor::for_definition(&nominal, &def).unwrap();
    assert!(extractor.pattern().is_some());
    let metrics = extractor.run().unwrap().document.metrics;
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[1].test_case_id, "boot-time");
    assert_eq!(metrics[1].result, "pass");
    assert_eq!(metrics[1].measurement, "3.2");
    assert_eq!(metrics[1].units, "s");
}

#[test]
fn test_first_sorted_result_dir_wins() {
    let dir = tempfile::tempdir().unwrap();
    common::create_result_dir(dir.path(), "t_1", "200", "");
    let nominal = common::create_result_dir(
        dir.path(),
        "t_1",
        "100",
        "<LAVA_SIGNAL_TESTCASE TEST_CASE_ID=x RESULT=pass>\n",
    );

    let extraction = ResultExtractor::new(&nominal).run().unwrap();
    assert!(extraction.result_dir.ends_with("t_1-100"));
    assert_eq!(extraction.document.metrics.len(), 1);
}

#[test]
fn test_malformed_run_id_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let nominal = common::create_result_dir(dir.path(), "noseparator", "1", "");
    let err = ResultExtractor::new(&nominal).run().unwrap_err();
    assert!(matches!(err, LocalTestError::MalformedRunId { .. }));
}

#[test]
fn test_missing_result_dir_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = ResultExtractor::new(dir.path().join("results/t_1"))
        .run()
        .unwrap_err();
    assert!(matches!(err, LocalTestError::ResultDirNotFound { .. }));
}

#[test]
fn test_missing_log_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("results/t_1-5")).unwrap();
    let err = ResultExtractor::new(dir.path().join("results/t_1"))
        .run()
        .unwrap_err();
    assert!(matches!(err, LocalTestError::LogNotFound { .. }));
}
