use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn write_project(root: &Path, architecture: &str) {
    fs::write(
        root.join("vhdl_analyzer.toml"),
        "[libraries]\nlib.files = ['*.vhd']\n",
    )
    .unwrap();
    fs::write(
        root.join("ent.vhd"),
        format!(
            "\
entity ent is
  port (a : in bit; b : out bit);
end entity;

{architecture}
"
        ),
    )
    .unwrap();
}

fn analyzer(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("vhdl_analyzer").unwrap();
    cmd.current_dir(root)
        .arg("--no-external-config")
        .env_remove("VHDL_ANALYZER_CONFIG");
    cmd
}

#[test]
fn clean_project_succeeds() {
    let tempdir = tempfile::tempdir().unwrap();
    write_project(
        tempdir.path(),
        "architecture rtl of ent is begin b <= a; end;",
    );
    analyzer(tempdir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn errors_fail_the_run() {
    let tempdir = tempfile::tempdir().unwrap();
    write_project(
        tempdir.path(),
        "architecture rtl of ent is begin a <= b; end;",
    );
    analyzer(tempdir.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("error"))
        .stdout(predicate::str::contains("Found 1 diagnostics"));
}

#[test]
fn missing_config_file_is_reported() {
    let tempdir = tempfile::tempdir().unwrap();
    analyzer(tempdir.path())
        .args(["--config", "missing.toml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to read config file"));
}
