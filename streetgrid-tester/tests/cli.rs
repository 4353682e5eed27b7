use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "streetgrid-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_streetgrid-tester");
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .args(["--size", "4", "--seeds", "1,2", "--report", "json", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let value: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    let runs = value.as_array().expect("array of runs");
    assert_eq!(runs.len(), 2);
    for run in runs {
        assert_eq!(run["status"], "solved");
        assert_eq!(run["grid"]["cells"].as_array().map(Vec::len), Some(16));
        assert!(run["sweeps"].as_u64().unwrap_or(0) >= 10);
    }
}

#[test]
fn cli_writes_markdown_report() {
    let exe = env!("CARGO_BIN_EXE_streetgrid-tester");
    let output_path = temp_path("md");
    let status = Command::new(exe)
        .args(["--size", "3", "--report", "markdown", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("# Street Grid Value Iteration"));
    assert!(content.contains("Seed 1337"));
}

#[test]
fn cli_fails_when_sweep_cap_is_hit() {
    let exe = env!("CARGO_BIN_EXE_streetgrid-tester");
    let output_path = temp_path("cap");
    let status = Command::new(exe)
        .args([
            "--size",
            "6",
            "--min-sweeps",
            "1",
            "--max-sweeps",
            "2",
            "--report",
            "csv",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(!status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert_eq!(content.lines().count(), 1);
}

#[test]
fn cli_rejects_bad_discount() {
    let exe = env!("CARGO_BIN_EXE_streetgrid-tester");
    let output = Command::new(exe)
        .args(["--discount", "1.5", "--report", "json"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
}
