use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "delve"])
        .status()
        .expect("failed to invoke cargo check for the delve binary");

    assert!(status.success(), "cargo check --bin delve should succeed");
}

#[test]
fn compete_reports_a_result() {
    let output = Command::new(env!("CARGO_BIN_EXE_delve"))
        .args([
            "compete",
            "--seed",
            "3",
            "--bots",
            "runner,sheep",
            "--copies",
            "1",
            "--max-ticks",
            "40",
            "--json",
        ])
        .output()
        .expect("failed to run the delve binary");

    assert!(output.status.success());
    let outcome: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("outcome is JSON");
    let ticks = outcome["ticks"].as_u64().expect("tick count");
    assert!(ticks <= 40, "match ran {ticks} ticks past its limit");
}

#[test]
fn unknown_bots_are_rejected() {
    let output = Command::new(env!("CARGO_BIN_EXE_delve"))
        .args(["compete", "--bots", "wolf"])
        .output()
        .expect("failed to run the delve binary");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown bot `wolf`"));
}
