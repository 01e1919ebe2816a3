//! Runtime configuration types for the positioning engine.
//!
//! Separate from the TOML-deserialized config in `droplet_config`; see
//! `conversions` for the mapping.

use std::time::Duration;

/// Which x-coordinate of the droplet's bounding box is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// `left + width / 2`
    #[default]
    Center,
    /// Left edge of the bounding box.
    Left,
}

#[derive(Debug, Clone)]
pub struct EstimatorCfg {
    /// Pixels at or below this intensity are droplet (foreground).
    pub threshold: u8,
    /// Odd Gaussian kernel size; 0 or 1 disables pre-blur.
    pub blur_kernel: usize,
    pub anchor: Anchor,
    /// Regions smaller than this are ignored.
    pub min_area_px: usize,
}

impl Default for EstimatorCfg {
    fn default() -> Self {
        Self {
            threshold: 127,
            blur_kernel: 5,
            anchor: Anchor::Center,
            min_area_px: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// A move succeeds when `|final - target|` is strictly below this.
    pub success_threshold_px: u32,
    /// Added to the profile's total duration before re-sampling.
    pub settle_margin: Duration,
    /// Slice length of the settle wait.
    pub settle_poll: Duration,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            success_threshold_px: 20,
            settle_margin: Duration::from_millis(500),
            settle_poll: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LinkCfg {
    /// Wait after opening the actuator channel before the first command.
    pub boot_delay: Duration,
}

impl Default for LinkCfg {
    fn default() -> Self {
        Self {
            boot_delay: Duration::from_millis(2000),
        }
    }
}
