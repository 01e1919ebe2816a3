//! Test and helper mocks for droplet_core.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use droplet_traits::{Actuator, Camera, Frame};
use ndarray::Array2;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Camera that replays a fixed script of frames and acquisition failures.
///
/// Once the script is exhausted every call fails.
#[derive(Default)]
pub struct ScriptedCamera {
    script: VecDeque<Option<Frame>>,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_frame(mut self, frame: Frame) -> Self {
        self.script.push_back(Some(frame));
        self
    }

    pub fn then_failure(mut self) -> Self {
        self.script.push_back(None);
        self
    }

    /// Light frame with a dark `w`-wide bar whose bounding-box centre is `x`.
    pub fn droplet_at(x: usize, w: usize, frame_w: usize, frame_h: usize) -> Frame {
        let left = x.saturating_sub(w / 2);
        Frame::Gray(Array2::from_shape_fn((frame_h, frame_w), |(r, c)| {
            let in_rows = r >= frame_h / 4 && r < frame_h - frame_h / 4;
            if in_rows && c >= left && c < left + w { 30 } else { 230 }
        }))
    }

    pub fn blank(frame_w: usize, frame_h: usize) -> Frame {
        Frame::Gray(Array2::from_elem((frame_h, frame_w), 230))
    }
}

impl Camera for ScriptedCamera {
    fn acquire_frame(&mut self) -> Result<Frame, BoxError> {
        match self.script.pop_front() {
            Some(Some(frame)) => Ok(frame),
            Some(None) => Err(Box::new(std::io::Error::other("scripted camera failure"))),
            None => Err(Box::new(std::io::Error::other("camera script exhausted"))),
        }
    }
}

/// Shared view of what a `RecordingActuator` received.
#[derive(Debug, Clone, Default)]
pub struct ActuatorLog(Rc<RefCell<LogState>>);

#[derive(Debug, Default)]
struct LogState {
    lines: Vec<String>,
    closed: bool,
}

impl ActuatorLog {
    pub fn lines(&self) -> Vec<String> {
        self.0.borrow().lines.clone()
    }

    pub fn closed(&self) -> bool {
        self.0.borrow().closed
    }
}

/// Actuator that records every write; optionally fails all sends.
#[derive(Default)]
pub struct RecordingActuator {
    log: ActuatorLog,
    fail_sends: bool,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    pub fn log(&self) -> ActuatorLog {
        self.log.clone()
    }
}

impl Actuator for RecordingActuator {
    fn send(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        if self.fail_sends {
            return Err(Box::new(std::io::Error::other("recording actuator: write failed")));
        }
        let mut st = self.log.0.borrow_mut();
        if st.closed {
            return Err(Box::new(std::io::Error::other("recording actuator: closed")));
        }
        st.lines.push(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.log.0.borrow_mut().closed = true;
        Ok(())
    }
}
