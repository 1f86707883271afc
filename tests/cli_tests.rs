//! Exit codes and output of the `appshell-bundle` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"
[package]
name = "webgpu-demo"
product_name = "WebGPU Demo"
version = "1.0.0"
authors = ["Armchair Software"]

[packager]
arch = "x64"

[main]
script = "src/main.js"

[[renderer.entry_points]]
name = "main_window"
js = "src/renderer.js"
assets = [{ from = "client/client.wasm", to = "client.wasm" }]

[[makers]]
kind = "zip"
"#;

fn project(config: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let write = |relative: &str, contents: &[u8]| {
        let path = dir.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    };
    write("src/main.js", b"module.exports = {};\n");
    write("src/renderer.js", b"console.log('renderer');\n");
    write("client/client.wasm", b"\0asm\x01\0\0\0");
    write("AppShell.toml", config.as_bytes());
    dir
}

#[allow(deprecated)]
fn bundle(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("appshell-bundle").unwrap();
    cmd.current_dir(dir).env_remove("APPSHELL_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    bundle(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("make").and(predicate::str::contains("fuses")));
}

#[test]
fn unknown_platform_is_an_argument_error() {
    let dir = project(CONFIG);
    bundle(dir.path())
        .args(["make", "--platform", "beos"])
        .assert()
        .code(2);
}

#[test]
fn verbose_and_quiet_together_are_rejected() {
    let dir = project(CONFIG);
    bundle(dir.path())
        .args(["check", "--verbose", "--quiet"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--verbose and --quiet"));
}

#[test]
fn check_accepts_a_valid_project() {
    let dir = project(CONFIG);
    bundle(dir.path())
        .args(["check", "--platform", "linux"])
        .assert()
        .success()
        .stdout(predicate::str::contains("configuration is valid"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn missing_config_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    bundle(dir.path())
        .arg("check")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("AppShell.toml"));
}

#[test]
fn entry_without_script_exits_before_building() {
    let dir = project(&CONFIG.replace("js = \"src/renderer.js\"\n", ""));
    bundle(dir.path())
        .args(["make", "--platform", "linux"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("main_window"));
    assert!(!dir.path().join("out").exists());
}

#[test]
fn make_writes_distributables_and_report() {
    let dir = project(CONFIG);
    bundle(dir.path())
        .args(["make", "--platform", "linux", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert!(dir
        .path()
        .join("out/make/zip/linux/x64/WebGPU Demo-linux-x64-1.0.0.zip")
        .is_file());
    assert!(dir.path().join("out/make/report.json").is_file());
}

#[test]
fn out_dir_override_is_relative_to_working_directory() {
    let dir = project(CONFIG);
    bundle(dir.path())
        .args(["package", "--platform", "win32", "--out-dir", "build"])
        .assert()
        .success();

    assert!(dir.path().join("build/webgpu-demo-win32-x64/resources/app.asar").is_file());
    assert!(!dir.path().join("out").exists());
}

#[test]
fn fuses_rejects_a_non_runtime_binary() {
    let dir = project(CONFIG);
    std::fs::write(dir.path().join("not-a-runtime"), b"plain bytes").unwrap();
    bundle(dir.path())
        .args(["fuses", "not-a-runtime"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("sentinel"));
}

#[test]
fn transform_failure_exits_with_one() {
    let dir = project(CONFIG);
    std::fs::write(
        dir.path().join("src/renderer.js"),
        "const missing = require('./missing');\n",
    )
    .unwrap();
    bundle(dir.path())
        .args(["make", "--platform", "linux"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("./missing"));
    assert!(!dir.path().join("out/make/report.json").exists());
}

#[test]
fn partial_generator_success_exits_with_zero() {
    // deb needs a maintainer, zip does not
    let config = CONFIG.replace("authors = [\"Armchair Software\"]\n", "")
        + "\n[[makers]]\nkind = \"deb\"\n";
    let dir = project(&config);
    bundle(dir.path())
        .args(["make", "--platform", "linux"])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 generator run(s) failed"));

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("out/make/report.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["artifacts"].as_array().unwrap().len(), 1);
    assert_eq!(report["failures"][0]["generator"], "deb");
}

#[test]
fn every_generator_failing_still_exits_with_zero() {
    let config = CONFIG
        .replace("authors = [\"Armchair Software\"]\n", "")
        .replace("kind = \"zip\"", "kind = \"deb\"");
    let dir = project(&config);
    bundle(dir.path())
        .args(["make", "--platform", "linux"])
        .assert()
        .success()
        .stderr(predicate::str::contains("no distributables created"));
    assert!(dir.path().join("out/make/report.json").is_file());
}
