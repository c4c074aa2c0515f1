use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_command() {
    Command::new(env!("CARGO_BIN_EXE_openvisa"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("OpenVISA instrument resource manager"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("info"))
        .stdout(predicate::str::contains("shell"));
}

#[test]
fn test_version_command() {
    Command::new(env!("CARGO_BIN_EXE_openvisa"))
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("openvisa"));
}

#[test]
fn test_invalid_command() {
    Command::new(env!("CARGO_BIN_EXE_openvisa"))
        .arg("invalid")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_info_command() {
    Command::new(env!("CARGO_BIN_EXE_openvisa"))
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("OpenVISA Environment"))
        .stdout(predicate::str::contains("sim@default"))
        .stdout(predicate::str::contains("ASRL1::INSTR"));
}

#[test]
fn test_info_json_output() {
    let output = Command::new(env!("CARGO_BIN_EXE_openvisa"))
        .arg("info")
        .arg("--json")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("info --json must emit valid JSON");
    assert_eq!(report["backend"], "sim@default");
    assert!(report["resources"]
        .as_array()
        .expect("resources must be an array")
        .iter()
        .any(|name| name == "ASRL1::INSTR"));
}

#[test]
fn test_info_with_seeded_resources() {
    Command::new(env!("CARGO_BIN_EXE_openvisa"))
        .arg("--backend")
        .arg("sim@seeded")
        .arg("--resources")
        .arg("GPIB::7::INSTR,ASRL3::INSTR")
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("GPIB0::7::0::INSTR"))
        .stdout(predicate::str::contains("ASRL3::INSTR"));
}

#[test]
fn test_info_rejects_bad_resource_name() {
    Command::new(env!("CARGO_BIN_EXE_openvisa"))
        .arg("--resources")
        .arg("RJ45::1::INSTR")
        .arg("info")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse"));
}

#[test]
fn test_shell_banner() {
    Command::new(env!("CARGO_BIN_EXE_openvisa"))
        .arg("shell")
        .write_stdin("exit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome to the VISA shell"));
}

#[test]
fn test_shell_list_open_close() {
    Command::new(env!("CARGO_BIN_EXE_openvisa"))
        .arg("shell")
        .write_stdin("list\nopen ASRL1::INSTR\nattr timeout\nclose\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("ASRL1::INSTR"))
        .stdout(predicate::str::contains("has been opened"))
        .stdout(predicate::str::contains("UInt(2000)"))
        .stdout(predicate::str::contains("The resource has been closed."));
}

#[test]
fn test_shell_open_by_index() {
    Command::new(env!("CARGO_BIN_EXE_openvisa"))
        .arg("--backend")
        .arg("sim@shell-index")
        .arg("--resources")
        .arg("ASRL7::INSTR")
        .arg("shell")
        .write_stdin("list\nopen 0\nclose\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("ASRL7::INSTR (MessageBased) has been opened."));
}

#[test]
fn test_shell_errors_are_not_fatal() {
    Command::new(env!("CARGO_BIN_EXE_openvisa"))
        .arg("shell")
        .write_stdin("open NOPE::1\nfrobnicate\nclose\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Could not parse"))
        .stdout(predicate::str::contains("Unknown command 'frobnicate'"))
        .stdout(predicate::str::contains("There are no resources in use."));
}
