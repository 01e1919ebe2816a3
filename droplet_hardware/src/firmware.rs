//! Line parser matching what the actuator firmware accepts.
//!
//! `MOVE <LEFT|RIGHT> <accel> <coast> <decel>` or `STOP`, one per line.

use crate::error::{HwError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FirmwareLine {
    Move {
        right: bool,
        accel_s: f64,
        coast_s: f64,
        decel_s: f64,
    },
    Stop,
}

impl FirmwareLine {
    pub fn parse(line: &str) -> Result<Self> {
        let reject = || HwError::Rejected(line.to_string());
        let mut parts = line.split_ascii_whitespace();
        match parts.next() {
            Some("STOP") if parts.next().is_none() => Ok(FirmwareLine::Stop),
            Some("MOVE") => {
                let right = match parts.next() {
                    Some("RIGHT") => true,
                    Some("LEFT") => false,
                    _ => return Err(reject()),
                };
                let mut secs = [0.0f64; 3];
                for slot in &mut secs {
                    let v: f64 = parts
                        .next()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(reject)?;
                    if !v.is_finite() || v < 0.0 {
                        return Err(reject());
                    }
                    *slot = v;
                }
                if parts.next().is_some() {
                    return Err(reject());
                }
                Ok(FirmwareLine::Move {
                    right,
                    accel_s: secs[0],
                    coast_s: secs[1],
                    decel_s: secs[2],
                })
            }
            _ => Err(reject()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_move_and_stop() {
        assert_eq!(FirmwareLine::parse("STOP").unwrap(), FirmwareLine::Stop);
        assert_eq!(
            FirmwareLine::parse("MOVE LEFT 1.00 0.40 0.85").unwrap(),
            FirmwareLine::Move {
                right: false,
                accel_s: 1.0,
                coast_s: 0.4,
                decel_s: 0.85
            }
        );
    }

    #[test]
    fn rejects_malformed_lines() {
        for bad in [
            "",
            "MOVE",
            "MOVE UP 1 2 3",
            "MOVE LEFT 1 2",
            "MOVE LEFT 1 2 3 4",
            "MOVE RIGHT -1 0 0",
            "STOP NOW",
            "move left 1 2 3",
        ] {
            assert!(FirmwareLine::parse(bad).is_err(), "accepted {bad:?}");
        }
    }
}
