#![cfg(all(unix, feature = "cli"))]

use std::process::{Command, Output, Stdio};

fn nfcbridge(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_nfcbridge"))
        .args(args)
        .stdin(Stdio::null())
        .output()
        .expect("nfcbridge should run")
}

#[test]
fn version_prints_package_version() {
    let output = nfcbridge(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("nfcbridge {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_lists_build_details() {
    let output = nfcbridge(&["version", "--extended"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: nfcbridge"));
    assert!(stdout.contains("features: pcsc=true"));
    assert!(stdout.contains("max_message_size: 1048576"));
}

#[test]
fn unknown_subcommand_exits_with_usage() {
    let output = nfcbridge(&["frobnicate"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn help_exits_successfully() {
    let output = nfcbridge(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("list-readers"));
    assert!(stdout.contains("listen"));
}

#[test]
fn list_readers_reports_outcome_by_exit_code() {
    // 0 with readers attached, 1 with none, 3 without a PC/SC service.
    let output = nfcbridge(&["list-readers", "--format", "json"]);
    match output.status.code() {
        Some(0) => {
            let value: serde_json::Value =
                serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
            assert!(value["count"].as_u64().expect("count should be a number") > 0);
        }
        Some(1) => {
            assert!(String::from_utf8_lossy(&output.stderr).contains("No NFC readers detected"));
        }
        Some(3) => {}
        other => panic!("unexpected exit code {other:?}"),
    }
}
