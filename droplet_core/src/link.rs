//! Command delivery to the actuator.
//!
//! `CommandLink` is the controller's only view of the actuator. `LineLink`
//! encodes commands as text lines and writes them to a byte `Actuator`.

use std::sync::Arc;

use droplet_traits::{Actuator, Clock};
use eyre::WrapErr;
use tracing::{debug, info};

use crate::command::Command;
use crate::config::LinkCfg;
use crate::error::Result;
use crate::hw_error::map_hw_error;

pub trait CommandLink {
    /// Deliver one command; fire and forget.
    fn send(&mut self, cmd: &Command) -> Result<()>;
    /// Release the underlying channel. Further sends fail.
    fn close(&mut self) -> Result<()>;
}

impl<L: CommandLink + ?Sized> CommandLink for Box<L> {
    fn send(&mut self, cmd: &Command) -> Result<()> {
        (**self).send(cmd)
    }
    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

pub struct LineLink<A: Actuator> {
    actuator: A,
}

impl<A: Actuator> LineLink<A> {
    /// Wrap an opened actuator channel and wait out the controller boot delay.
    pub fn open(actuator: A, cfg: &LinkCfg, clock: &Arc<dyn Clock + Send + Sync>) -> Self {
        if !cfg.boot_delay.is_zero() {
            info!(delay_ms = cfg.boot_delay.as_millis() as u64, "waiting for actuator boot");
            clock.sleep(cfg.boot_delay);
        }
        Self { actuator }
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }
}

impl<A: Actuator> CommandLink for LineLink<A> {
    fn send(&mut self, cmd: &Command) -> Result<()> {
        let line = cmd.encode();
        debug!(line = line.trim_end(), "actuator send");
        self.actuator
            .send(line.as_bytes())
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err_with(|| format!("sending {:?}", line.trim_end()))
    }

    fn close(&mut self) -> Result<()> {
        self.actuator
            .close()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("closing actuator channel")
    }
}
