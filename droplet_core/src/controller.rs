//! One positioning cycle: sense, compute, actuate, settle, verify.

use std::fmt;
use std::sync::Arc;

use droplet_traits::{Camera, Clock};
use tracing::{debug, info, warn};

use crate::calibration::CalibrationTable;
use crate::command::Command;
use crate::config::ControlCfg;
use crate::error::Result;
use crate::estimator::{Estimator, PositionSample};
use crate::hw_error::map_hw_error;
use crate::link::CommandLink;
use crate::profile::{Direction, MotionProfile};
use crate::settle::{CancelToken, SettleTimer, WaitOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Sensing,
    Computing,
    Actuating,
    Settling,
    Verifying,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// No droplet in the frame before moving.
    PositionUndetectable,
    /// No droplet in the frame after the settle wait.
    PostMovePositionUndetectable,
    /// Droplet found but not within the success threshold.
    OutOfTolerance,
    /// Cancellation was requested before the move command went out.
    Cancelled,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureReason::PositionUndetectable => "position undetectable",
            FailureReason::PostMovePositionUndetectable => "post-move position undetectable",
            FailureReason::OutOfTolerance => "overshoot/undershoot",
            FailureReason::Cancelled => "cancelled before actuation",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction, distance and resolved profile for one move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plan {
    pub direction: Direction,
    pub distance_px: u32,
    pub profile: MotionProfile,
}

impl Plan {
    pub fn command(&self) -> Command {
        Command::Move {
            direction: self.direction,
            profile: self.profile,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlResult {
    pub success: bool,
    /// `|final - target|`; absent when no final position was measured.
    pub error_px: Option<u32>,
    pub reason: Option<FailureReason>,
    pub target_px: i32,
    pub start_px: Option<i32>,
    pub final_px: Option<i32>,
    pub plan: Option<Plan>,
    /// The settle wait was cut short by cancellation.
    pub interrupted: bool,
}

impl ControlResult {
    fn undetectable(target_px: i32) -> Self {
        Self {
            success: false,
            error_px: None,
            reason: Some(FailureReason::PositionUndetectable),
            target_px,
            start_px: None,
            final_px: None,
            plan: None,
            interrupted: false,
        }
    }

    fn cancelled(target_px: i32, start_px: Option<i32>) -> Self {
        Self {
            success: false,
            error_px: None,
            reason: Some(FailureReason::Cancelled),
            target_px,
            start_px,
            final_px: None,
            plan: None,
            interrupted: true,
        }
    }
}

/// Direction and profile for moving from `current` to `target`.
///
/// `RIGHT` when the target lies to the right, otherwise `LEFT` (including a
/// zero-distance move, which resolves to the smallest entry's profile).
pub fn plan(current: i32, target: i32, table: &CalibrationTable) -> Plan {
    let distance_px = target.abs_diff(current);
    let direction = if target > current {
        Direction::Right
    } else {
        Direction::Left
    };
    Plan {
        direction,
        distance_px,
        profile: table.resolve(f64::from(distance_px)),
    }
}

/// `(success, error_px)` for a measured final position.
pub fn judge(final_px: i32, target: i32, success_threshold_px: u32) -> (bool, u32) {
    let error = final_px.abs_diff(target);
    (error < success_threshold_px, error)
}

pub struct Controller<C, L> {
    camera: C,
    link: L,
    estimator: Estimator,
    table: Arc<CalibrationTable>,
    cfg: ControlCfg,
    settle: SettleTimer,
    phase: Phase,
}

impl<C: Camera, L: CommandLink> Controller<C, L> {
    pub fn new(
        camera: C,
        link: L,
        estimator: Estimator,
        table: Arc<CalibrationTable>,
        cfg: ControlCfg,
        clock: Arc<dyn Clock + Send + Sync>,
        cancel: CancelToken,
    ) -> Self {
        let settle = SettleTimer::new(clock, cfg.settle_poll, cancel);
        Self {
            camera,
            link,
            estimator,
            table,
            cfg,
            settle,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn table(&self) -> &Arc<CalibrationTable> {
        &self.table
    }

    /// Install a new calibration version for subsequent cycles.
    pub fn replace_table(&mut self, table: Arc<CalibrationTable>) {
        info!(entries = table.len(), "calibration table replaced");
        self.table = table;
    }

    pub fn control_cfg(&self) -> &ControlCfg {
        &self.cfg
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.settle.cancel_token().clone()
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    fn enter(&mut self, next: Phase) {
        debug!(from = ?self.phase, to = ?next, "phase");
        self.phase = next;
    }

    /// Acquire one frame and estimate the droplet position.
    ///
    /// Acquisition failures read as "not found".
    pub fn locate(&mut self) -> PositionSample {
        match self.camera.acquire_frame() {
            Ok(frame) => self.estimator.estimate(&frame),
            Err(e) => {
                let mapped = map_hw_error(&*e);
                warn!(error = %mapped, "frame acquisition failed");
                PositionSample::not_found()
            }
        }
    }

    fn cancel_requested(&self) -> bool {
        self.settle.cancel_token().is_cancelled()
    }

    /// Run one positioning cycle towards `target` (pixels).
    ///
    /// Detection and tolerance failures come back as `Ok` with
    /// `success == false`; only a failed command send is an `Err`.
    ///
    /// A set cancel token stays set: the cycle sends nothing and returns a
    /// `Cancelled` result until the caller resets the token.
    pub fn move_to(&mut self, target: i32) -> Result<ControlResult> {
        self.phase = Phase::Idle;
        if self.cancel_requested() {
            self.enter(Phase::Failed);
            warn!(target, "move skipped: cancellation pending");
            return Ok(ControlResult::cancelled(target, None));
        }

        self.enter(Phase::Sensing);
        let Some(start) = self.locate().position() else {
            self.enter(Phase::Failed);
            info!(target, "move failed: position undetectable");
            return Ok(ControlResult::undetectable(target));
        };

        self.enter(Phase::Computing);
        let plan = plan(start, target, &self.table);
        debug!(
            start,
            target,
            direction = %plan.direction,
            distance_px = plan.distance_px,
            profile = ?plan.profile,
            "plan"
        );

        if self.cancel_requested() {
            self.enter(Phase::Failed);
            warn!(start, target, "move skipped: cancelled before actuation");
            return Ok(ControlResult::cancelled(target, Some(start)));
        }

        self.enter(Phase::Actuating);
        let cmd = plan.command();
        if let Err(e) = self.link.send(&cmd) {
            self.enter(Phase::Failed);
            return Err(e);
        }
        info!(command = %cmd, "command sent");

        self.enter(Phase::Settling);
        let wait = plan.profile.total().saturating_add(self.cfg.settle_margin);
        let interrupted = self.settle.wait(wait) == WaitOutcome::Cancelled;
        if interrupted {
            warn!("settle wait cancelled; verifying early");
        }

        self.enter(Phase::Verifying);
        let mut result = ControlResult {
            success: false,
            error_px: None,
            reason: None,
            target_px: target,
            start_px: Some(start),
            final_px: None,
            plan: Some(plan),
            interrupted,
        };
        match self.locate().position() {
            None => {
                result.reason = Some(FailureReason::PostMovePositionUndetectable);
            }
            Some(final_px) => {
                let (ok, error) = judge(final_px, target, self.cfg.success_threshold_px);
                result.final_px = Some(final_px);
                result.error_px = Some(error);
                result.success = ok;
                if !ok {
                    result.reason = Some(FailureReason::OutOfTolerance);
                }
            }
        }

        self.enter(if result.success {
            Phase::Succeeded
        } else {
            Phase::Failed
        });
        info!(
            success = result.success,
            error_px = ?result.error_px,
            reason = ?result.reason.map(FailureReason::as_str),
            "move finished"
        );
        Ok(result)
    }

    /// Send the stop sentinel.
    pub fn stop(&mut self) -> Result<()> {
        self.link.send(&Command::Stop)
    }

    /// Release the actuator channel.
    pub fn close_link(&mut self) -> Result<()> {
        self.link.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_right_and_left() {
        let t = CalibrationTable::seed();
        let p = plan(200, 300, &t);
        assert_eq!(p.direction, Direction::Right);
        assert_eq!(p.distance_px, 100);
        let p = plan(300, 260, &t);
        assert_eq!(p.direction, Direction::Left);
        assert_eq!(p.distance_px, 40);
    }

    #[test]
    fn plan_zero_distance_is_left_with_smallest_profile() {
        let t = CalibrationTable::seed();
        let p = plan(120, 120, &t);
        assert_eq!(p.direction, Direction::Left);
        assert_eq!(p.distance_px, 0);
        assert_eq!(p.profile, t.entries()[0].profile);
    }

    #[test]
    fn judge_is_strictly_below_threshold() {
        assert_eq!(judge(310, 300, 20), (true, 10));
        assert_eq!(judge(320, 300, 20), (false, 20));
        assert_eq!(judge(281, 300, 20), (true, 19));
    }
}
