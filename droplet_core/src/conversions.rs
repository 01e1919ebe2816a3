//! `From` implementations bridging `droplet_config` types to `droplet_core` types.

use std::time::Duration;

use crate::calibration::{CalibrationEntry, CalibrationTable};
use crate::config::{Anchor, ControlCfg, EstimatorCfg, LinkCfg};
use crate::error::TableError;
use crate::profile::MotionProfile;

// ── EstimatorCfg ─────────────────────────────────────────────────────────────

impl From<droplet_config::AnchorCfg> for Anchor {
    fn from(a: droplet_config::AnchorCfg) -> Self {
        match a {
            droplet_config::AnchorCfg::Center => Anchor::Center,
            droplet_config::AnchorCfg::Left => Anchor::Left,
        }
    }
}

impl From<&droplet_config::EstimatorCfg> for EstimatorCfg {
    fn from(c: &droplet_config::EstimatorCfg) -> Self {
        Self {
            threshold: c.threshold,
            blur_kernel: c.blur_kernel,
            anchor: c.anchor.into(),
            min_area_px: c.min_area_px,
        }
    }
}

// ── ControlCfg ───────────────────────────────────────────────────────────────

impl From<&droplet_config::ControlCfg> for ControlCfg {
    fn from(c: &droplet_config::ControlCfg) -> Self {
        Self {
            success_threshold_px: c.success_threshold_px,
            settle_margin: Duration::from_millis(c.settle_margin_ms),
            settle_poll: Duration::from_millis(c.settle_poll_ms),
        }
    }
}

// ── LinkCfg ──────────────────────────────────────────────────────────────────

impl From<&droplet_config::SerialCfg> for LinkCfg {
    fn from(c: &droplet_config::SerialCfg) -> Self {
        Self {
            boot_delay: Duration::from_millis(c.boot_delay_ms),
        }
    }
}

// ── Calibration ──────────────────────────────────────────────────────────────

impl TryFrom<&droplet_config::CalibrationRow> for CalibrationEntry {
    type Error = TableError;
    fn try_from(r: &droplet_config::CalibrationRow) -> Result<Self, Self::Error> {
        Ok(CalibrationEntry::new(
            r.distance,
            MotionProfile::new(r.accel, r.coast, r.decel)?,
        ))
    }
}

impl TryFrom<&[droplet_config::CalibrationRow]> for CalibrationTable {
    type Error = TableError;
    fn try_from(rows: &[droplet_config::CalibrationRow]) -> Result<Self, Self::Error> {
        let entries = rows
            .iter()
            .map(CalibrationEntry::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        CalibrationTable::new(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droplet_config::CalibrationRow;

    #[test]
    fn rows_become_table() {
        let rows = [
            CalibrationRow {
                distance: 50.0,
                accel: 0.8,
                coast: 0.3,
                decel: 0.7,
            },
            CalibrationRow {
                distance: 100.0,
                accel: 1.2,
                coast: 0.5,
                decel: 1.0,
            },
        ];
        let t = CalibrationTable::try_from(&rows[..]).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.resolve(100.0), MotionProfile::new(1.2, 0.5, 1.0).unwrap());
    }

    #[test]
    fn empty_rows_are_refused() {
        let rows: [CalibrationRow; 0] = [];
        assert_eq!(CalibrationTable::try_from(&rows[..]), Err(TableError::Empty));
    }

    #[test]
    fn config_defaults_match_core_defaults() {
        let est = EstimatorCfg::from(&droplet_config::EstimatorCfg::default());
        let core = EstimatorCfg::default();
        assert_eq!(est.threshold, core.threshold);
        assert_eq!(est.blur_kernel, core.blur_kernel);
        assert_eq!(est.anchor, core.anchor);
        let ctl = ControlCfg::from(&droplet_config::ControlCfg::default());
        assert_eq!(ctl.success_threshold_px, 20);
        assert_eq!(ctl.settle_margin, Duration::from_millis(500));
        let link = LinkCfg::from(&droplet_config::SerialCfg::default());
        assert_eq!(link.boot_delay, Duration::from_secs(2));
    }
}
