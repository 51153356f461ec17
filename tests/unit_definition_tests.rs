//! # Definition Module Unit Tests / Definition 模块单元测试
//!
//! Parsing of LAVA test definitions: required fields, optional section
//! presence, parameter rendering and parse-section validation.
//!
//! 测试定义解析：必需字段、可选部分的存在状态、参数渲染以及 parse 部分的验证。

use lava_local_test::definition::{Definition, GitRepo};
use lava_local_test::LocalTestError;

mod common;

#[test]
fn test_parse_full_definition() {
    let def = Definition::from_yaml_str(common::SMOKE_DEFINITION).unwrap();

    assert_eq!(def.name(), "smoke-tests-basic");
    assert_eq!(def.run_steps().len(), 3);
    let params = def.parameters().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name, "SKIP_INSTALL");
    assert_eq!(params[0].value, "false");
    let install = def.install().unwrap();
    assert_eq!(install.deps.as_deref(), Some(&["lsb-release".to_string()][..]));
    assert!(install.git_repos.is_none());
    assert!(install.steps.is_none());
    assert!(def.parse_pattern().unwrap().contains("boot-time"));
    assert_eq!(def.fixupdict().unwrap().get("PASS").map(String::as_str), Some("pass"));
}

#[test]
fn test_missing_metadata_is_rejected() {
    let err = Definition::from_yaml_str("run:\n  steps:\n    - echo hi\n").unwrap_err();
    assert!(matches!(err, LocalTestError::MissingField { field: "metadata" }));
    assert!(err.is_definition());
}

#[test]
fn test_missing_or_empty_name_is_rejected() {
    let err = Definition::from_yaml_str("metadata:\n  format: x\n").unwrap_err();
    assert!(matches!(err, LocalTestError::MissingField { field: "metadata.name" }));

    let err = Definition::from_yaml_str("metadata:\n  name: \"  \"\n").unwrap_err();
    assert!(matches!(err, LocalTestError::MissingField { field: "metadata.name" }));
}

#[test]
fn test_invalid_yaml_is_rejected() {
    let err = Definition::from_yaml_str("metadata: [unclosed\n").unwrap_err();
    assert!(matches!(err, LocalTestError::DefinitionParse { .. }));
}

#[test]
fn test_params_take_precedence_over_parameters() {
    let yaml = r#"
metadata:
  name: t
params:
  A: "1"
parameters:
  B: "2"
"#;
    let def = Definition::from_yaml_str(yaml).unwrap();
    let params = def.parameters().unwrap();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].name, "A");
}

#[test]
fn test_parameters_block_is_used_without_params() {
    let yaml = "metadata:\n  name: t\nparameters:\n  B: \"2\"\n";
    let def = Definition::from_yaml_str(yaml).unwrap();
    assert_eq!(def.parameters().unwrap()[0].name, "B");
}

#[test]
fn test_absent_and_empty_parameter_blocks_differ() {
    let absent = Definition::from_yaml_str("metadata:\n  name: t\n").unwrap();
    assert!(absent.parameters().is_none());

    let empty = Definition::from_yaml_str("metadata:\n  name: t\nparams: {}\n").unwrap();
    assert_eq!(empty.parameters(), Some(&[][..]));
}

#[test]
fn test_non_string_parameter_values_render_as_text() {
    let yaml = r#"
metadata:
  name: t
params:
  COUNT: 3
  ENABLED: true
  DISABLED: false
  QUOTED: "true"
  EMPTY: ~
  yaml_line: 12
"#;
    let def = Definition::from_yaml_str(yaml).unwrap();
    let params = def.parameters().unwrap();
    let values: Vec<(&str, &str)> = params
        .iter()
        .map(|p| (p.name.as_str(), p.value.as_str()))
        .collect();
    assert_eq!(values, vec![
            ("COUNT", "3"),
            ("ENABLED", "True"),
            ("DISABLED", "False"),
            ("QUOTED", "true"),
            ("EMPTY", ""),
        ]);
}

#[test]
fn test_git_repos_accept_urls_and_mappings() {
    let yaml = r#"
metadata:
  name: t
install:
  git-repos:
    - https://example.com/a.git
    - url: https://example.com/b.git
      branch: BRANCH
    - url: https://example.com/c.git
      branch: stable
"#;
    let def = Definition::from_yaml_str(yaml).unwrap();
    let repos = def.install().unwrap().git_repos.clone().unwrap();
    assert_eq!(
        repos,
        vec![
            GitRepo {
                url: "https://example.com/a.git".to_string(),
                branch: None
            },
            GitRepo {
                url: "https://example.com/b.git".to_string(),
                branch: Some("BRANCH".to_string())
            },
            GitRepo {
                url: "https://example.com/c.git".to_string(),
                branch: Some("stable".to_string())
            },
        ]
    );
    assert!(repos[1].uses_branch_env());
    assert!(!repos[2].uses_branch_env());
}

#[test]
fn test_empty_install_section_is_present() {
    let def = Definition::from_yaml_str("metadata:\n  name: t\ninstall:\n").unwrap();
    let install = def.install().unwrap();
    assert!(install.deps.is_none());
    assert!(install.git_repos.is_none());
    assert!(install.steps.is_none());
}

#[test]
fn test_invalid_parse_pattern_is_rejected() {
    let yaml = "metadata:\n  name: t\nparse:\n  pattern: \"(?P<result>unclosed\"\n";
    let err = Definition::from_yaml_str(yaml).unwrap_err();
    assert!(matches!(err, LocalTestError::InvalidPattern { .. }));
    assert!(err.is_definition());
}

#[test]
fn test_run_steps_must_be_a_list() {
    let yaml = "metadata:\n  name: t\nrun:\n  steps: echo hi\n";
    let err = Definition::from_yaml_str(yaml).unwrap_err();
    assert!(matches!(err, LocalTestError::InvalidDefinition { .. }));
}

#[test]
fn test_to_yaml_keeps_unknown_keys() {
    let yaml = "metadata:\n  name: t\n  maintainer:\n    - someone@example.com\nextra_key: kept\n";
    let def = Definition::from_yaml_str(yaml).unwrap();
    let dumped = def.to_yaml().unwrap();
    assert!(dumped.contains("extra_key: kept"));

    let metadata = def.metadata_yaml().unwrap();
    assert!(metadata.contains("name: t"));
    assert!(!metadata.contains("extra_key"));

    let reparsed = Definition::from_yaml_str(&dumped).unwrap();
    assert_eq!(reparsed, def);
}

#[test]
fn test_load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Definition::load(&dir.path().join("missing.yaml")).unwrap_err();
    assert!(matches!(err, LocalTestError::Io { .. }));
}

#[test]
fn test_boolean_steps_are_not_capitalised() {
    let def = Definition::from_yaml_str("metadata:\n  name: t\nrun:\n  steps:\n    - true\n").unwrap();
    assert_eq!(def.run_steps(), &["true".to_string()][..]);
}
