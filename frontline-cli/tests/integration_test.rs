//! Integration tests for the FRONTLINE command-line interface
//!
//! Runs the built binary end to end: scenario export, then simulation

use std::path::PathBuf;
use std::process::Command;

use frontline_core::Scenario;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn frontline() -> Command {
    Command::new(env!("CARGO_BIN_EXE_frontline"))
}

fn temp_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("frontline-{}-{}", std::process::id(), name))
}

// ============================================================================
// TESTS
// ============================================================================

#[test]
fn test_scenario_export_round_trips() {
    let path = temp_file("export.json");
    let status = frontline()
        .args(["scenario", "--output"])
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success());

    let loaded = Scenario::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, Scenario::default());
}

#[test]
fn test_simulate_reports_every_game() {
    let path = temp_file("simulate.json");
    Scenario::default().save(&path).unwrap();

    let output = frontline()
        .args(["--seed", "5", "simulate", "--games", "3", "--max-moves", "300"])
        .args(["--json", "--scenario"])
        .arg(&path)
        .output()
        .unwrap();
    std::fs::remove_file(&path).ok();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_games"], 3);
    assert_eq!(report["scenario"], "skirmish");
    let decided = report["allied_wins"].as_u64().unwrap()
        + report["axis_wins"].as_u64().unwrap()
        + report["undecided"].as_u64().unwrap();
    assert_eq!(decided, 3);
}

#[test]
fn test_missing_scenario_fails_cleanly() {
    let output = frontline()
        .args(["simulate", "--scenario", "/nonexistent/frontline.json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("reading scenario"));
}
