//! Integration tests for the typeroute CLI, run against a copy of the demo
//! project.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use tr_cli::commands::build::{build_command, BuildArgs};
use tr_cli::config::ToolConfig;
use tr_core::ErrorKind;

fn demo_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/fastify-server")
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

fn demo_copy() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    copy_dir(&demo_dir(), dir.path());
    dir
}

fn typeroute(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("typeroute").unwrap();
    cmd.arg("-C").arg(dir).arg("--log").arg("warn");
    cmd
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("typeroute").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("schema"));
}

#[test]
fn check_lists_the_typed_route() {
    let dir = demo_copy();
    typeroute(dir.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("GET /ping/:bar Query Params Body Headers"))
        .stdout(predicate::str::contains("1 route(s) checked"));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn build_writes_javascript_with_schemas() {
    let dir = demo_copy();
    typeroute(dir.path())
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("Injected schemas into 1 route(s)"));

    let server = fs::read_to_string(dir.path().join("dist/server.js")).unwrap();
    assert!(server.contains("\"schema\""));
    assert!(server.contains("\"query\""));
    assert!(server.contains("\"additionalProperties\""));
    assert!(server.contains("'/ping/:bar'"));
    assert!(!server.contains("interface Query"));
    assert!(!server.contains("<Query, Params, Body, Headers>"));
}

#[test]
fn schema_prints_definitions_as_json() {
    let dir = demo_copy();
    let output = typeroute(dir.path())
        .args(["schema", "Query"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let definitions: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        definitions["Query"]["properties"]["foo"]["type"],
        serde_json::json!("number")
    );
}

#[test]
fn unknown_type_fails_without_writing() {
    let dir = demo_copy();
    let server = dir.path().join("server.ts");
    let source = fs::read_to_string(&server).unwrap();
    fs::write(&server, source.replace("Body, Headers>", "Body, Missing>")).unwrap();

    typeroute(dir.path())
        .arg("build")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("typeroute::schema"));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn union_type_argument_is_rejected() {
    let dir = demo_copy();
    let server = dir.path().join("server.ts");
    let source = fs::read_to_string(&server).unwrap();
    fs::write(&server, source.replace("<Query, Params,", "<Query | Params, Params,")).unwrap();

    typeroute(dir.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("typeroute::type_argument"));
}

#[test]
fn build_command_honours_out_dir() {
    let dir = demo_copy();
    let out = dir.path().join("out");
    let args = BuildArgs {
        entry: Some(dir.path().join("server.ts")),
        tsconfig: Some(dir.path().join("tsconfig.json")),
        out_dir: Some(out.clone()),
        target: None,
    };
    build_command(args, &ToolConfig::default()).unwrap();
    assert!(out.join("server.js").is_file());
}

#[test]
fn missing_entry_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let args = BuildArgs {
        entry: None,
        tsconfig: Some(dir.path().join("tsconfig.json")),
        out_dir: None,
        target: None,
    };
    let err = build_command(args, &ToolConfig::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}
