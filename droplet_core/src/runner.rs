//! Caller-level retries around single positioning cycles.
//!
//! The controller itself never retries; this helper re-runs whole cycles
//! while results fail and the attempt budget lasts.

use droplet_traits::Camera;
use tracing::info;

use crate::controller::{ControlResult, Controller};
use crate::error::Result;
use crate::link::CommandLink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total cycles allowed, including the first. Zero behaves like one.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 1 }
    }
}

impl RetryPolicy {
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Outcome of the last cycle run.
    pub result: ControlResult,
    pub attempts: u32,
}

/// Run cycles towards `target` until one succeeds, the budget runs out, or
/// cancellation is requested. Send errors abort immediately.
///
/// The cancel token is checked before every retry; a token set before the
/// first attempt makes that attempt return without sending.
pub fn move_with_retries<C, L>(
    controller: &mut Controller<C, L>,
    target: i32,
    policy: RetryPolicy,
) -> Result<RunReport>
where
    C: Camera,
    L: CommandLink,
{
    let max = policy.max_attempts.max(1);
    let mut attempts = 0;
    loop {
        attempts += 1;
        let mut result = controller.move_to(target)?;
        if result.success || result.interrupted || attempts >= max {
            return Ok(RunReport { result, attempts });
        }
        if controller.cancel_token().is_cancelled() {
            info!(attempt = attempts, "cancelled; not retrying");
            result.interrupted = true;
            return Ok(RunReport { result, attempts });
        }
        info!(
            attempt = attempts,
            max,
            reason = ?result.reason.map(|r| r.as_str()),
            "retrying move"
        );
    }
}
