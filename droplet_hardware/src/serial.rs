use std::io::Write;
use std::time::Duration;

use droplet_traits::Actuator;
use serialport::SerialPort;
use tracing::{debug, info};

use crate::error::{HwError, Result};

/// Serial link to the actuator microcontroller. Write-only from our side.
pub struct SerialActuator {
    port: Option<Box<dyn SerialPort>>,
}

impl SerialActuator {
    pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<Self> {
        info!("Opening serial port: {path} at {baud} bps");
        let port = serialport::new(path, baud)
            .timeout(timeout)
            .open()
            .map_err(|e| HwError::Serial(format!("open {path}: {e}")))?;
        Ok(Self { port: Some(port) })
    }
}

fn io_to_hw(e: std::io::Error) -> HwError {
    if e.kind() == std::io::ErrorKind::TimedOut {
        HwError::Timeout
    } else {
        HwError::Io(e)
    }
}

impl Actuator for SerialActuator {
    fn send(&mut self, bytes: &[u8]) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let port = self.port.as_mut().ok_or(HwError::Closed)?;
        port.write_all(bytes).map_err(io_to_hw)?;
        port.flush().map_err(io_to_hw)?;
        debug!(bytes = bytes.len(), "serial write");
        Ok(())
    }

    fn close(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.port.take().is_some() {
            info!("serial port closed");
        }
        Ok(())
    }
}
