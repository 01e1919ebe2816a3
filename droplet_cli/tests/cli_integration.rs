use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Small frames keep the simulated estimator fast
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[serial]
# unused by the sim backend; boot delay runs on simulated time
port = "/dev/ttyACM0"
boot_delay_ms = 2000

[camera]
width = 640
height = 120

[control]
success_threshold_px = 20
settle_margin_ms = 500
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

#[rstest]
#[case(&["--help"], None, 0, "Usage:", "stdout")]
#[case(&["move", "--target", "300"], Some(("200", "62.5")), 0, "Move complete", "stdout")]
#[case(&["move", "--target", "300"], Some(("200", "100")), 3, "overshoot/undershoot", "stderr")]
#[case(&["move", "--target", "300"], Some(("-500", "62.5")), 2, "position undetectable", "stderr")]
#[case(&["move", "--target", "300"], Some(("200", "10000")), 4, "post-move position undetectable", "stderr")]
#[case(&["move"], None, 2, "required", "stderr")]
#[case(&["profile", "--distance", "75"], None, 0, "MOVE RIGHT 1.00 0.40 0.85", "stdout")]
#[case(&["profile", "--distance", "40", "--direction", "left"], None, 0, "MOVE LEFT 0.80 0.30 0.70", "stdout")]
#[case(&["locate"], Some(("200", "62.5")), 0, "Droplet at x = 200 px", "stdout")]
#[case(&["locate"], Some(("-500", "62.5")), 2, "not found", "stderr")]
#[case(&["self-check"], None, 0, "OK (sim)", "stdout")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] sim: Option<(&str, &str)>,
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("droplet_cli").unwrap();

    // Always include a valid config to avoid relying on default path
    cmd.arg("--config").arg(&cfg);

    if let Some((start, speed)) = sim {
        cmd.env("DROPLET_SIM_START_PX", start)
            .env("DROPLET_SIM_PX_PER_S", speed);
    }

    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);

    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn cli_reports_bad_calibration_header() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let bad_csv = dir.path().join("calib.csv");
    let mut f = fs::File::create(&bad_csv).unwrap();
    writeln!(f, "distance,a,c,d").unwrap();
    writeln!(f, "50,0.8,0.3,0.7").unwrap();

    let mut cmd = Command::cargo_bin("droplet_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&bad_csv)
        .arg("self-check");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid headers"));
}

#[rstest]
fn cli_uses_calibration_csv_for_profile() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let csv = dir.path().join("calib.csv");
    fs::write(&csv, "distance,accel,coast,decel\n10,0.1,0.1,0.1\n20,0.3,0.3,0.3\n").unwrap();

    let mut cmd = Command::cargo_bin("droplet_cli").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("--calibration")
        .arg(&csv)
        .args(["profile", "--distance", "15"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("MOVE RIGHT 0.20 0.20 0.20"));
}

#[rstest]
fn cli_missing_config_fails() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("droplet_cli").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("self-check");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration is invalid or missing"));
}

#[rstest]
fn cli_rejects_invalid_config_value() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cfg.toml");
    fs::write(&path, "[estimator]\nblur_kernel = 4\n").unwrap();
    let mut cmd = Command::cargo_bin("droplet_cli").unwrap();
    cmd.arg("--config").arg(&path).arg("self-check");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("blur_kernel must be odd"));
}
