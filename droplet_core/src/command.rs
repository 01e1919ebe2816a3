//! Line-oriented actuator commands.
//!
//! `MOVE <LEFT|RIGHT> <accel> <coast> <decel>\n` with two decimals per field,
//! or the literal `STOP\n`. No acknowledgement, no checksum.

use std::fmt;

use crate::profile::{Direction, MotionProfile};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Move {
        direction: Direction,
        profile: MotionProfile,
    },
    Stop,
}

impl Command {
    /// Wire form including the trailing newline.
    pub fn encode(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move { direction, profile } => write!(
                f,
                "MOVE {} {:.2} {:.2} {:.2}",
                direction,
                profile.accelerate_s(),
                profile.coast_s(),
                profile.decelerate_s()
            ),
            Command::Stop => f.write_str("STOP"),
        }
    }
}
