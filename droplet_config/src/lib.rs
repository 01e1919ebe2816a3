#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and calibration parsing for the droplet positioner.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Calibration rows come either from inline `[[calibration]]` tables or
//!   from a CSV file with exact headers `distance,accel,coast,decel`.
use serde::Deserialize;

/// One calibration measurement: the timing profile that moved the droplet
/// `distance` pixels.
///
/// CSV example:
/// distance,accel,coast,decel
/// 50,0.8,0.3,0.7
/// 100,1.2,0.5,1.0
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CalibrationRow {
    pub distance: f64,
    pub accel: f64,
    pub coast: f64,
    pub decel: f64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SerialCfg {
    pub port: String,
    pub baud: u32,
    /// Delay after opening before the first command; the board resets on open.
    pub boot_delay_ms: u64,
    /// Write timeout for the serial handle
    pub timeout_ms: u64,
}

impl Default for SerialCfg {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".into(),
            baud: 9600,
            boot_delay_ms: 2000,
            timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CameraCfg {
    pub width: usize,
    pub height: usize,
    /// Raw GRAY8 frame stream (file or FIFO); used by hardware builds only.
    pub source: Option<String>,
    /// Queued frames dropped before each sample from a live stream
    pub skip_frames: usize,
}

impl Default for CameraCfg {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            source: None,
            skip_frames: 2,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnchorCfg {
    #[default]
    Center,
    Left,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EstimatorCfg {
    pub threshold: u8,
    /// Gaussian kernel size; 0 or 1 disables the blur
    pub blur_kernel: usize,
    pub anchor: AnchorCfg,
    pub min_area_px: usize,
}

impl Default for EstimatorCfg {
    fn default() -> Self {
        Self {
            threshold: 127,
            blur_kernel: 5,
            anchor: AnchorCfg::Center,
            min_area_px: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlCfg {
    pub success_threshold_px: u32,
    pub settle_margin_ms: u64,
    /// Slice length for the settle wait; cancellation is noticed between slices
    pub settle_poll_ms: u64,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            success_threshold_px: 20,
            settle_margin_ms: 500,
            settle_poll_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialCfg,
    #[serde(default)]
    pub camera: CameraCfg,
    #[serde(default)]
    pub estimator: EstimatorCfg,
    #[serde(default)]
    pub control: ControlCfg,
    #[serde(default)]
    pub logging: Logging,
    /// Inline calibration rows; a CSV passed on the command line wins.
    #[serde(default)]
    pub calibration: Vec<CalibrationRow>,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Check calibration rows: distance finite and > 0, strictly increasing,
/// every timing finite and >= 0, at least one row.
pub fn validate_calibration(rows: &[CalibrationRow]) -> eyre::Result<()> {
    if rows.is_empty() {
        eyre::bail!("calibration requires at least one row");
    }
    for (i, r) in rows.iter().enumerate() {
        if !(r.distance.is_finite() && r.distance > 0.0) {
            eyre::bail!("calibration row {}: distance must be > 0", i + 1);
        }
        for (name, v) in [("accel", r.accel), ("coast", r.coast), ("decel", r.decel)] {
            if !(v.is_finite() && v >= 0.0) {
                eyre::bail!("calibration row {}: {name} must be >= 0", i + 1);
            }
        }
        if i > 0 && rows[i - 1].distance >= r.distance {
            eyre::bail!(
                "calibration distances must be strictly increasing (row {} = {}, row {} = {})",
                i,
                rows[i - 1].distance,
                i + 1,
                r.distance
            );
        }
    }
    Ok(())
}

pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<Vec<CalibrationRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["distance", "accel", "coast", "decel"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'distance,accel,coast,decel', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    validate_calibration(&rows)?;
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Serial
        if self.serial.port.trim().is_empty() {
            eyre::bail!("serial.port must not be empty");
        }
        if self.serial.baud == 0 {
            eyre::bail!("serial.baud must be > 0");
        }
        if self.serial.boot_delay_ms > 60_000 {
            eyre::bail!("serial.boot_delay_ms is unreasonably large (>60s)");
        }
        if self.serial.timeout_ms == 0 {
            eyre::bail!("serial.timeout_ms must be >= 1");
        }

        // Camera
        if self.camera.width == 0 || self.camera.height == 0 {
            eyre::bail!("camera.width and camera.height must be > 0");
        }
        if self.camera.skip_frames > 30 {
            eyre::bail!("camera.skip_frames must be <= 30");
        }

        // Estimator
        let k = self.estimator.blur_kernel;
        if k > 1 && k % 2 == 0 {
            eyre::bail!("estimator.blur_kernel must be odd (or 0/1 to disable)");
        }
        if k > 31 {
            eyre::bail!("estimator.blur_kernel must be <= 31");
        }
        if self.estimator.min_area_px == 0 {
            eyre::bail!("estimator.min_area_px must be >= 1");
        }

        // Control
        if self.control.success_threshold_px == 0 {
            eyre::bail!("control.success_threshold_px must be >= 1");
        }
        if self.control.settle_margin_ms > 60_000 {
            eyre::bail!("control.settle_margin_ms is unreasonably large (>60s)");
        }
        if self.control.settle_poll_ms == 0 {
            eyre::bail!("control.settle_poll_ms must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Inline calibration is optional; when present it must be well-formed
        if !self.calibration.is_empty() {
            validate_calibration(&self.calibration)?;
        }

        Ok(())
    }
}
