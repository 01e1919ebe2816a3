#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not
    if let Ok(cfg) = toml::from_str::<droplet_config::Config>(data) {
        if cfg.validate().is_ok() && !cfg.calibration.is_empty() {
            let _ = droplet_core::CalibrationTable::try_from(cfg.calibration.as_slice());
        }
    }
});
