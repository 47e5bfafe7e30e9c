use serde_json::Value;
use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_dojotool(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dojotool"))
        .args(args)
        .output()
        .expect("dojotool should spawn")
}

#[test]
fn notebook_command_writes_sibling_ipynb() {
    let temp = TempDir::new().expect("tempdir should be created");
    let pseudo_path = temp.path().join("Si.psp8");
    fs::write(&pseudo_path, b"opaque pseudo payload").expect("pseudo file should be written");

    let output = run_dojotool(&["notebook", pseudo_path.to_str().expect("path should be utf-8")]);

    assert!(
        output.status.success(),
        "notebook command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Notebook: "));

    let notebook_path = temp.path().join("Si.ipynb");
    assert!(notebook_path.is_file(), "sibling .ipynb should be written");

    let parsed: Value = serde_json::from_str(
        &fs::read_to_string(&notebook_path).expect("notebook should be readable"),
    )
    .expect("notebook JSON should parse");
    assert_eq!(parsed["nbformat"], Value::from(4));
    let cells = parsed["cells"].as_array().expect("cells should be an array");
    assert_eq!(
        cells[0]["source"],
        Value::from("# PseudoDojo notebook for Si.psp8")
    );
    assert!(
        !cells
            .iter()
            .any(|cell| cell["source"].as_str().unwrap_or_default().contains("plot_gbrv_eos")),
        "EOS cells should be absent without --eos"
    );
}

#[test]
fn notebook_command_eos_and_validation_flags_extend_the_document() {
    let temp = TempDir::new().expect("tempdir should be created");
    let pseudo_path = temp.path().join("Si.psp8");
    fs::write(&pseudo_path, b"opaque pseudo payload").expect("pseudo file should be written");

    let output = run_dojotool(&[
        "notebook",
        pseudo_path.to_str().expect("path should be utf-8"),
        "--validation",
        "--eos",
    ]);

    assert!(
        output.status.success(),
        "notebook command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let notebook_path = temp.path().join("Si.ipynb");
    let parsed: Value = serde_json::from_str(
        &fs::read_to_string(&notebook_path).expect("notebook should be readable"),
    )
    .expect("notebook JSON should parse");
    let sources: Vec<&str> = parsed["cells"]
        .as_array()
        .expect("cells should be an array")
        .iter()
        .map(|cell| cell["source"].as_str().unwrap_or_default())
        .collect();
    assert!(sources.iter().any(|source| *source == "report.ipw_validate()"));
    assert!(
        sources
            .iter()
            .any(|source| source.contains("plot_gbrv_eos(struct_type=\"bcc\""))
    );
}

#[test]
fn notebook_command_tmpfile_mode_reports_the_temporary_path() {
    let temp = TempDir::new().expect("tempdir should be created");
    let pseudo_path = temp.path().join("Si.psp8");
    fs::write(&pseudo_path, b"opaque pseudo payload").expect("pseudo file should be written");

    let output = run_dojotool(&[
        "notebook",
        pseudo_path.to_str().expect("path should be utf-8"),
        "--tmpfile",
    ]);

    assert!(
        output.status.success(),
        "notebook command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let reported = stdout
        .lines()
        .find_map(|line| line.strip_prefix("Notebook: "))
        .expect("stdout should report the notebook path");
    assert!(reported.ends_with(".ipynb"));
    assert!(
        std::path::Path::new(reported).is_file(),
        "reported tempfile notebook should exist"
    );
    fs::remove_file(reported).expect("persisted tempfile should be removable");
    assert!(
        !temp.path().join("Si.ipynb").exists(),
        "tmpfile mode should not write the sibling notebook"
    );
}

#[test]
fn notebook_command_rejects_missing_subcommand_arguments() {
    let output = run_dojotool(&["notebook"]);

    assert_eq!(
        output.status.code(),
        Some(2),
        "usage errors should exit with the input-validation code"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ERROR: [INPUT.CLI_USAGE]"),
        "stderr should carry the usage diagnostic, stderr: {}",
        stderr
    );
}
