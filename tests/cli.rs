use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn genie(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("installer_genie").unwrap();
    cmd.current_dir(dir).env_remove("INSTALLER_GENIE_API_KEY");
    cmd
}

fn initialized() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    genie(dir.path()).arg("init").assert().success();
    dir
}

#[test]
fn init_writes_a_config_once() {
    let dir = tempfile::tempdir().unwrap();

    genie(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("installer_genie.toml"));
    let text = std::fs::read_to_string(dir.path().join("installer_genie.toml")).unwrap();
    assert!(text.contains("app_name"));

    genie(dir.path())
        .arg("init")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));
    genie(dir.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn validate_accepts_the_default_config() {
    let dir = initialized();
    genie(dir.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"));
}

#[test]
fn validate_lists_every_problem_with_exit_code_two() {
    let dir = initialized();
    genie(dir.path())
        .args([
            "validate",
            "--set",
            "download_url=ftp://example.com/a.msi",
            "--set",
            "project_list= , ",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid download URL"))
        .stderr(predicate::str::contains("project_list"));
}

#[test]
fn unknown_field_is_a_configuration_error() {
    let dir = initialized();
    genie(dir.path())
        .args(["generate", "--set", "colour=blue"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown configuration field `colour`"));
}

#[test]
fn missing_config_file_points_at_init() {
    let dir = tempfile::tempdir().unwrap();
    genie(dir.path())
        .arg("validate")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("installer_genie init"));
}

#[test]
fn unreadable_config_location_reports_the_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("plain"), b"").unwrap();

    genie(dir.path())
        .args(["validate", "--config", "plain/installer_genie.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "checking configuration file plain/installer_genie.toml",
        ));
}

#[test]
fn departments_follow_the_override_table() {
    let dir = initialized();
    genie(dir.path())
        .args(["departments", "--project", "卖场"])
        .assert()
        .success()
        .stdout("卖场服务部\n");
    genie(dir.path())
        .arg("departments")
        .assert()
        .success()
        .stdout(predicate::str::contains("峰景: 项目综合部, 客户服务部"));
}

#[test]
fn generate_writes_the_script_with_a_bom() {
    let dir = initialized();
    genie(dir.path())
        .args(["generate", "--output", "out", "--set", "app_name=Drive Helper"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sha256:"));

    let bytes = std::fs::read(dir.path().join("out").join("installer.iss")).unwrap();
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
    let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
    assert!(text.contains("AppName=Drive Helper"));
}

#[test]
fn generate_bundle_writes_the_project() {
    let dir = initialized();
    genie(dir.path())
        .args(["--quiet", "generate", "--strategy", "bundle", "--output", "app"])
        .assert()
        .success()
        .stdout("");
    for name in ["package.json", "main.js", "preload.js", "index.html", ".npmrc"] {
        assert!(dir.path().join("app").join(name).is_file(), "{name} missing");
    }
}

#[test]
fn compile_is_rejected_for_bundles() {
    let dir = initialized();
    genie(dir.path())
        .args(["generate", "--strategy", "bundle", "--compile"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--compile only applies to script artifacts"));
}

#[test]
fn generative_strategy_without_key_fails_cleanly() {
    let dir = initialized();
    genie(dir.path())
        .args(["generate", "--strategy", "generative", "--endpoint", "http://127.0.0.1:9"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("API key is missing"));
}

#[test]
fn run_without_input_names_the_missing_choice() {
    let dir = initialized();
    genie(dir.path())
        .args(["run", "--no-input"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--project"));
}
