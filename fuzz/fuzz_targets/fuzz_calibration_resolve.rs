#![no_main]
use droplet_core::{CalibrationEntry, CalibrationTable, MotionProfile};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (Vec<(f64, f64, f64, f64)>, f64)| {
    let (rows, query) = input;
    let entries: Vec<_> = rows
        .into_iter()
        .filter_map(|(d, a, c, e)| {
            MotionProfile::new(a, c, e)
                .ok()
                .map(|p| CalibrationEntry::new(d, p))
        })
        .collect();
    let Ok(table) = CalibrationTable::new(entries) else {
        return;
    };
    let p = table.resolve(query);
    assert!(p.accelerate_s() >= 0.0);
    assert!(p.coast_s() >= 0.0);
    assert!(p.decelerate_s() >= 0.0);
});
