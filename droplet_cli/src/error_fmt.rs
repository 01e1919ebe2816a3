//! Human-readable error descriptions, structured JSON errors, and exit codes.

use droplet_core::{ControlResult, FailureReason};

pub const EXIT_OK: i32 = 0;
pub const EXIT_ERROR: i32 = 1;
pub const EXIT_UNDETECTABLE: i32 = 2;
pub const EXIT_OUT_OF_TOLERANCE: i32 = 3;
pub const EXIT_POST_MOVE_UNDETECTABLE: i32 = 4;
/// Conventional status for a run ended by SIGINT.
pub const EXIT_CANCELLED: i32 = 130;

/// Stable exit code for a finished cycle.
pub fn exit_code_for_result(r: &ControlResult) -> i32 {
    match r.reason {
        None => EXIT_OK,
        Some(FailureReason::PositionUndetectable) => EXIT_UNDETECTABLE,
        Some(FailureReason::OutOfTolerance) => EXIT_OUT_OF_TOLERANCE,
        Some(FailureReason::PostMovePositionUndetectable) => EXIT_POST_MOVE_UNDETECTABLE,
        Some(FailureReason::Cancelled) => EXIT_CANCELLED,
    }
}

/// Errors (as opposed to failed cycles) always exit with 1.
pub fn exit_code_for_error(_err: &eyre::Report) -> i32 {
    EXIT_ERROR
}

/// Explain a failed cycle in the same three-part form as errors.
pub fn explain_failure(reason: FailureReason, r: &ControlResult) -> String {
    match reason {
        FailureReason::PositionUndetectable => "What happened: No droplet was found in the frame before moving (position undetectable).\nLikely causes: Droplet outside the camera view, lighting changed, or estimator.threshold too low for this background.\nHow to fix: Check the camera view with `locate`, then adjust [estimator] threshold or min_area_px.".to_string(),
        FailureReason::PostMovePositionUndetectable => "What happened: The droplet could not be found after the move (post-move position undetectable).\nLikely causes: The move carried it out of view, or it broke up into pieces smaller than estimator.min_area_px.\nHow to fix: Try a shorter move, recalibrate the far end of the table, or widen the camera view.".to_string(),
        FailureReason::Cancelled => "What happened: The move was cancelled (Ctrl-C) before a command was sent.\nLikely causes: Interrupted during actuator boot, sensing, or between retries.\nHow to fix: Re-run the command when ready.".to_string(),
        FailureReason::OutOfTolerance => format!(
            "What happened: Droplet stopped at {} px, {} px from the target {} px (overshoot/undershoot).\nLikely causes: Calibration table no longer matches the apparatus, or the success threshold is tighter than the actuator can reach.\nHow to fix: Re-measure the table around this distance, use --retries, or raise control.success_threshold_px.",
            r.final_px.map_or_else(|| "?".to_string(), |x| x.to_string()),
            r.error_px.unwrap_or_default(),
            r.target_px
        ),
    }
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use droplet_core::error::{BuildError, ControlError, TableError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingCamera => {
                "What happened: No camera was provided to the positioner.\nLikely causes: The frame source failed to open or was not wired into the builder.\nHow to fix: Check camera.source and pass the camera via with_camera(...).".to_string()
            }
            BuildError::MissingActuator => {
                "What happened: No actuator channel was provided to the positioner.\nLikely causes: The serial port failed to open or was not wired into the builder.\nHow to fix: Check serial.port and pass the actuator via with_actuator(...).".to_string()
            }
            BuildError::MissingCalibration => {
                "What happened: No calibration table was provided.\nLikely causes: The builder was not given a table.\nHow to fix: Load a table from --calibration, [[calibration]] rows, or use the seed table.".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/droplet_config.toml for a sample."
            ),
        };
    }

    if let Some(te) = err.downcast_ref::<TableError>() {
        return format!(
            "What happened: Calibration table rejected ({te}).\nLikely causes: Rows out of order, duplicate distances, or negative timings.\nHow to fix: Sort rows by strictly increasing distance and keep every timing >= 0."
        );
    }

    if let Some(ce) = err.downcast_ref::<ControlError>() {
        return match ce {
            ControlError::Timeout => "What happened: Talking to the actuator timed out.\nLikely causes: Wrong serial port, board not powered, or baud rate mismatch.\nHow to fix: Check [serial] port and baud, then re-plug the board.".to_string(),
            ControlError::Closed => "What happened: The actuator channel was already closed.\nLikely causes: A command was sent after the session ended.\nHow to fix: Re-run the command; report a bug if it repeats.".to_string(),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    if err.downcast_ref::<toml::de::Error>().is_some() {
        return format!(
            "What happened: The config file is not valid TOML for this tool.\nLikely causes: A typo, a wrong value type, or an unknown enum value.\nHow to fix: Compare with etc/droplet_config.toml. Parser said: {}",
            err.root_cause()
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("calibration csv must have headers") {
        return "Invalid headers in calibration CSV. Expected 'distance,accel,coast,decel'.".to_string();
    }

    if lower.contains("open serial port") {
        return format!(
            "What happened: Failed to open the actuator serial port.\nLikely causes: Wrong serial.port, board unplugged, or missing permission (dialout group).\nHow to fix: Fix [serial] port in the config and check device permissions. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains("read config") {
        return format!(
            "What happened: Configuration is invalid or missing.\nLikely causes: Wrong --config path or an out-of-range value.\nHow to fix: Edit the TOML config and try again. Original: {msg}"
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use droplet_core::error::{BuildError, ControlError, TableError};
    use serde_json::json;

    let kind = if err.downcast_ref::<BuildError>().is_some() {
        "BuildError"
    } else if err.downcast_ref::<TableError>().is_some() {
        "CalibrationError"
    } else if err.downcast_ref::<ControlError>().is_some() {
        "HardwareError"
    } else {
        "Error"
    };
    json!({ "reason": kind, "message": humanize(err) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_failure_reason() {
        let mut r = ControlResult {
            success: true,
            error_px: Some(0),
            reason: None,
            target_px: 10,
            start_px: Some(10),
            final_px: Some(10),
            plan: None,
            interrupted: false,
        };
        assert_eq!(exit_code_for_result(&r), 0);
        r.reason = Some(FailureReason::PositionUndetectable);
        assert_eq!(exit_code_for_result(&r), 2);
        r.reason = Some(FailureReason::OutOfTolerance);
        assert_eq!(exit_code_for_result(&r), 3);
        r.reason = Some(FailureReason::PostMovePositionUndetectable);
        assert_eq!(exit_code_for_result(&r), 4);
        r.reason = Some(FailureReason::Cancelled);
        assert_eq!(exit_code_for_result(&r), 130);
    }

    #[test]
    fn build_errors_are_explained() {
        let err = eyre::Report::new(droplet_core::error::BuildError::MissingCamera);
        assert!(humanize(&err).starts_with("What happened: No camera"));
        assert!(format_error_json(&err).contains("\"BuildError\""));
    }
}
