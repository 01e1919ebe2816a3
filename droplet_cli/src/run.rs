//! Config mapping, backend assembly, and command execution.

use std::path::Path;
use std::sync::Arc;

use droplet_config::Config;
use droplet_core::error::Result as CoreResult;
use droplet_core::{
    CalibrationTable, CancelToken, ControlResult, Direction, FailureReason, Plan, Positioner,
    RetryPolicy, Session, move_with_retries,
};
use droplet_traits::Clock;
use eyre::WrapErr;
use serde_json::json;

use crate::error_fmt::{EXIT_OK, EXIT_UNDETECTABLE, exit_code_for_result, explain_failure};

/// Simulated droplet start position (px).
#[cfg(not(feature = "hardware"))]
pub const ENV_SIM_START_PX: &str = "DROPLET_SIM_START_PX";
/// Simulated plant speed (px/s at full coast).
#[cfg(not(feature = "hardware"))]
pub const ENV_SIM_PX_PER_S: &str = "DROPLET_SIM_PX_PER_S";

pub fn load_config(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = droplet_config::load_toml(&text)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("parse config {}", path.display()))?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

/// CSV on the command line, else inline `[[calibration]]`, else the bench seed.
pub fn load_table(cfg: &Config, csv: Option<&Path>) -> eyre::Result<CalibrationTable> {
    let (rows, source) = match csv {
        Some(path) => (droplet_config::load_calibration_csv(path)?, "csv"),
        None if !cfg.calibration.is_empty() => (cfg.calibration.clone(), "config"),
        None => {
            tracing::info!("no calibration configured; using seed table");
            return Ok(CalibrationTable::seed());
        }
    };
    let table = CalibrationTable::try_from(rows.as_slice())
        .map_err(eyre::Report::new)
        .wrap_err("build calibration table")?;
    tracing::info!(entries = table.len(), source, "calibration loaded");
    Ok(table)
}

#[cfg(not(feature = "hardware"))]
fn env_f64(key: &str, default: f64) -> eyre::Result<f64> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<f64>()
            .wrap_err_with(|| format!("{key} must be a number, got {v:?}")),
        Err(_) => Ok(default),
    }
}

/// Simulated bench: deterministic time, camera and plant sharing one droplet.
#[cfg(not(feature = "hardware"))]
pub fn assemble(cfg: &Config, table: CalibrationTable, cancel: CancelToken) -> CoreResult<Positioner> {
    use droplet_hardware::{SimulatedActuator, SimulatedBench, SimulatedCamera};

    let start = env_f64(ENV_SIM_START_PX, 200.0)?;
    let px_per_s = env_f64(ENV_SIM_PX_PER_S, 62.5)?;
    let bench = SimulatedBench::new(start);
    let camera = SimulatedCamera::new(bench.clone(), cfg.camera.width, cfg.camera.height);
    // The channel extends past the camera's view on the right
    let channel_px = (cfg.camera.width * 2) as f64;
    let actuator = SimulatedActuator::new(bench, px_per_s, channel_px);
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(droplet_traits::ManualClock::new());
    tracing::info!(start_px = start, px_per_s, "using simulated bench");

    Positioner::builder()
        .with_camera(camera)
        .with_actuator(actuator)
        .with_calibration(table)
        .with_estimator((&cfg.estimator).into())
        .with_control((&cfg.control).into())
        .with_link_cfg((&cfg.serial).into())
        .with_clock(clock)
        .with_cancel_token(cancel)
        .build()
}

/// Serial actuator and raw GRAY8 frame stream.
#[cfg(feature = "hardware")]
pub fn assemble(cfg: &Config, table: CalibrationTable, cancel: CancelToken) -> CoreResult<Positioner> {
    use droplet_hardware::{RawStreamCamera, SerialActuator};
    use std::time::Duration;

    let source = cfg
        .camera
        .source
        .as_deref()
        .ok_or_else(|| eyre::eyre!("camera.source must be set for hardware runs"))?;
    let camera = RawStreamCamera::open(Path::new(source), cfg.camera.width, cfg.camera.height)
        .wrap_err_with(|| format!("open camera stream {source}"))?
        .with_skip_frames(cfg.camera.skip_frames);
    let actuator = SerialActuator::open(
        &cfg.serial.port,
        cfg.serial.baud,
        Duration::from_millis(cfg.serial.timeout_ms),
    )
    .wrap_err_with(|| format!("open serial port {}", cfg.serial.port))?;

    Positioner::builder()
        .with_camera(camera)
        .with_actuator(actuator)
        .with_calibration(table)
        .with_estimator((&cfg.estimator).into())
        .with_control((&cfg.control).into())
        .with_link_cfg((&cfg.serial).into())
        .with_clock(Arc::new(droplet_traits::MonotonicClock::new()))
        .with_cancel_token(cancel)
        .build()
}

fn backend_name() -> &'static str {
    if cfg!(feature = "hardware") {
        "hardware"
    } else {
        "sim"
    }
}

fn plan_json(plan: &Plan) -> serde_json::Value {
    json!({
        "direction": plan.direction.as_str(),
        "distance_px": plan.distance_px,
        "accelerate_s": plan.profile.accelerate_s(),
        "coast_s": plan.profile.coast_s(),
        "decelerate_s": plan.profile.decelerate_s(),
        "command": plan.command().to_string(),
    })
}

fn result_json(r: &ControlResult, attempts: u32) -> serde_json::Value {
    json!({
        "success": r.success,
        "target_px": r.target_px,
        "start_px": r.start_px,
        "final_px": r.final_px,
        "error_px": r.error_px,
        "reason": r.reason.map(|x| x.as_str()),
        "interrupted": r.interrupted,
        "attempts": attempts,
        "plan": r.plan.as_ref().map(plan_json),
    })
}

pub struct MoveArgs {
    pub target: i32,
    pub success_threshold_px: Option<u32>,
    pub settle_margin_ms: Option<u64>,
    pub retries: u32,
}

/// Run one (or, with retries, several) positioning cycles. Returns the exit code.
pub fn run_move(mut cfg: Config, table: CalibrationTable, args: &MoveArgs, json_out: bool) -> eyre::Result<i32> {
    if let Some(px) = args.success_threshold_px {
        cfg.control.success_threshold_px = px;
    }
    if let Some(ms) = args.settle_margin_ms {
        cfg.control.settle_margin_ms = ms;
    }
    cfg.validate().wrap_err("invalid overrides")?;

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        tracing::warn!(error = %e, "Ctrl-C handler not installed; settle wait cannot be interrupted");
    }

    let mut session = Session::new(assemble(&cfg, table, cancel)?);
    let report = move_with_retries(
        session.controller_mut(),
        args.target,
        RetryPolicy::with_retries(args.retries),
    )?;
    session.close()?;

    let r = &report.result;
    if json_out {
        println!("{}", result_json(r, report.attempts));
    } else if r.success {
        println!(
            "Move complete: final {} px, error {} px (target {} px, {} attempt(s))",
            r.final_px.unwrap_or_default(),
            r.error_px.unwrap_or_default(),
            r.target_px,
            report.attempts
        );
    } else {
        if let Some(plan) = &r.plan {
            println!("Sent: {}", plan.command());
        }
        if let Some(reason) = r.reason {
            eprintln!("{}", explain_failure(reason, r));
        }
    }
    if r.interrupted && r.reason != Some(FailureReason::Cancelled) && !json_out {
        eprintln!("Note: settle wait was interrupted; position was checked early.");
    }
    Ok(exit_code_for_result(r))
}

pub fn run_locate(cfg: &Config, table: CalibrationTable, json_out: bool) -> eyre::Result<i32> {
    let mut session = Session::new(assemble(cfg, table, CancelToken::new())?);
    let sample = session.locate();
    session.close()?;
    if json_out {
        println!("{}", json!({ "valid": sample.valid, "x": sample.position() }));
    } else {
        match sample.position() {
            Some(x) => println!("Droplet at x = {x} px"),
            None => eprintln!("Droplet not found in frame."),
        }
    }
    Ok(if sample.valid { EXIT_OK } else { EXIT_UNDETECTABLE })
}

pub fn run_profile(table: &CalibrationTable, distance: f64, direction: Direction, json_out: bool) -> eyre::Result<i32> {
    if !(distance.is_finite() && distance >= 0.0) {
        eyre::bail!("--distance must be a finite number >= 0");
    }
    let profile = table.resolve(distance);
    let cmd = droplet_core::Command::Move { direction, profile };
    if json_out {
        println!(
            "{}",
            json!({
                "distance_px": distance,
                "direction": direction.as_str(),
                "accelerate_s": profile.accelerate_s(),
                "coast_s": profile.coast_s(),
                "decelerate_s": profile.decelerate_s(),
                "total_s": profile.total_s(),
                "command": cmd.to_string(),
            })
        );
    } else {
        println!("{cmd}");
        println!("total {:.2} s", profile.total_s());
    }
    Ok(EXIT_OK)
}

pub fn run_self_check(cfg: &Config, table: CalibrationTable, json_out: bool) -> eyre::Result<i32> {
    let entries = table.len();
    let mut session = Session::new(assemble(cfg, table, CancelToken::new())?);
    let sample = session.locate();
    session.close()?;
    if json_out {
        println!(
            "{}",
            json!({
                "ok": true,
                "backend": backend_name(),
                "calibration_entries": entries,
                "droplet_x": sample.position(),
            })
        );
    } else {
        println!("OK ({}): {entries} calibration entries", backend_name());
        match sample.position() {
            Some(x) => println!("droplet visible at x = {x} px"),
            None => println!("droplet not visible"),
        }
    }
    Ok(EXIT_OK)
}
