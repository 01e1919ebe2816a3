//! Scoped ownership of camera and actuator with guaranteed release.

use droplet_traits::Camera;
use tracing::{info, warn};

use crate::controller::{ControlResult, Controller};
use crate::error::Result;
use crate::estimator::PositionSample;
use crate::link::CommandLink;

/// Owns a controller for the length of a session.
///
/// On drop (including unwinding) the actuator gets a `STOP` and its channel
/// is closed; failures there are logged, not raised. Call `close` to see them.
pub struct Session<C: Camera, L: CommandLink> {
    controller: Controller<C, L>,
    released: bool,
}

impl<C: Camera, L: CommandLink> Session<C, L> {
    pub fn new(controller: Controller<C, L>) -> Self {
        info!("session opened");
        Self {
            controller,
            released: false,
        }
    }

    pub fn move_to(&mut self, target: i32) -> Result<ControlResult> {
        self.controller.move_to(target)
    }

    pub fn locate(&mut self) -> PositionSample {
        self.controller.locate()
    }

    pub fn controller(&self) -> &Controller<C, L> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut Controller<C, L> {
        &mut self.controller
    }

    /// Stop and release now, reporting the first failure.
    pub fn close(mut self) -> Result<()> {
        self.released = true;
        let stop = self.controller.stop();
        let close = self.controller.close_link();
        info!("session closed");
        stop.and(close)
    }

    fn release_best_effort(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.controller.stop() {
            warn!(error = %e, "stop on release failed");
        }
        if let Err(e) = self.controller.close_link() {
            warn!(error = %e, "closing actuator on release failed");
        }
        info!("session released");
    }
}

impl<C: Camera, L: CommandLink> Drop for Session<C, L> {
    fn drop(&mut self) {
        self.release_best_effort();
    }
}
