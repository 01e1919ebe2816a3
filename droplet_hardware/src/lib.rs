pub mod error;
pub mod firmware;
pub mod raw_camera;
#[cfg(feature = "hardware")]
pub mod serial;

use droplet_traits::{Actuator, Camera, Frame};
use ndarray::Array2;
use std::cell::Cell;
use std::rc::Rc;

use crate::error::HwError;
use crate::firmware::FirmwareLine;

pub use raw_camera::RawStreamCamera;
#[cfg(feature = "hardware")]
pub use serial::SerialActuator;

/// Shared physical state of the simulated bench: where the droplet centre is.
///
/// The simulated camera and actuator hold clones of the same bench so a move
/// sent through one is visible through the other.
#[derive(Debug, Clone)]
pub struct SimulatedBench {
    position_px: Rc<Cell<f64>>,
}

impl SimulatedBench {
    pub fn new(start_px: f64) -> Self {
        SimulatedBench {
            position_px: Rc::new(Cell::new(start_px)),
        }
    }

    pub fn position(&self) -> f64 {
        self.position_px.get()
    }

    pub fn set_position(&self, px: f64) {
        self.position_px.set(px);
    }
}

/// Simulated camera rendering a dark rectangular droplet on a light background.
pub struct SimulatedCamera {
    bench: SimulatedBench,
    width: usize,
    height: usize,
    droplet_w: usize,
    droplet_h: usize,
    background: u8,
    droplet: u8,
    // Small dark specks (col, row, size) standing in for bubbles and dust
    specks: Vec<(usize, usize, usize)>,
    dropouts: u32,
}

impl SimulatedCamera {
    pub fn new(bench: SimulatedBench, width: usize, height: usize) -> Self {
        SimulatedCamera {
            bench,
            width,
            height,
            droplet_w: 41,
            droplet_h: 31,
            background: 220,
            droplet: 40,
            specks: Vec::new(),
            dropouts: 0,
        }
    }

    pub fn with_droplet_size(mut self, w: usize, h: usize) -> Self {
        self.droplet_w = w.max(1);
        self.droplet_h = h.max(1);
        self
    }

    pub fn with_speck(mut self, col: usize, row: usize, size: usize) -> Self {
        self.specks.push((col, row, size.max(1)));
        self
    }

    /// Fail the next `n` acquisitions, as a camera losing signal would.
    pub fn drop_next(&mut self, n: u32) {
        self.dropouts = n;
    }

    fn render(&self) -> Array2<u8> {
        let mut px = Array2::from_elem((self.height, self.width), self.background);
        let centre = self.bench.position().round() as i64;
        let half = (self.droplet_w / 2) as i64;
        let left = centre - half;
        let right = left + self.droplet_w as i64; // exclusive
        let top = self.height.saturating_sub(self.droplet_h) / 2;
        let bottom = (top + self.droplet_h).min(self.height);
        let c0 = left.clamp(0, self.width as i64) as usize;
        let c1 = right.clamp(0, self.width as i64) as usize;
        for r in top..bottom {
            for c in c0..c1 {
                px[[r, c]] = self.droplet;
            }
        }
        for &(col, row, size) in &self.specks {
            for r in row..(row + size).min(self.height) {
                for c in col..(col + size).min(self.width) {
                    px[[r, c]] = self.droplet;
                }
            }
        }
        px
    }
}

impl Camera for SimulatedCamera {
    fn acquire_frame(&mut self) -> Result<Frame, Box<dyn std::error::Error + Send + Sync>> {
        if self.dropouts > 0 {
            self.dropouts -= 1;
            return Err(Box::new(HwError::Camera("signal lost (simulated)".into())));
        }
        tracing::trace!(position_px = self.bench.position(), "render simulated frame");
        Ok(Frame::Gray(self.render()))
    }
}

/// Simulated actuator: parses lines the way the firmware does and moves the
/// bench droplet along a trapezoidal velocity profile.
///
/// Travel for `MOVE dir a c d` is `px_per_s * (a/2 + c + d/2)`.
pub struct SimulatedActuator {
    bench: SimulatedBench,
    px_per_s: f64,
    max_px: f64,
    lines: Vec<String>,
    closed: bool,
}

impl SimulatedActuator {
    pub fn new(bench: SimulatedBench, px_per_s: f64, max_px: f64) -> Self {
        SimulatedActuator {
            bench,
            px_per_s,
            max_px,
            lines: Vec::new(),
            closed: false,
        }
    }

    /// Lines received so far, without their terminators.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Actuator for SimulatedActuator {
    fn send(&mut self, bytes: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.closed {
            return Err(Box::new(HwError::Closed));
        }
        let text = String::from_utf8_lossy(bytes);
        for raw in text.lines() {
            let line = FirmwareLine::parse(raw)?;
            self.lines.push(raw.to_string());
            if let FirmwareLine::Move {
                right,
                accel_s,
                coast_s,
                decel_s,
            } = line
            {
                let travel = self.px_per_s * (0.5 * accel_s + coast_s + 0.5 * decel_s);
                let signed = if right { travel } else { -travel };
                let next = (self.bench.position() + signed).clamp(0.0, self.max_px);
                tracing::debug!(travel_px = travel, to_px = next, "simulated move");
                self.bench.set_position(next);
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.closed = true;
        tracing::info!("actuator channel closed (simulated)");
        Ok(())
    }
}
