//! Full cycles against the simulated bench (camera + trapezoid plant).

use std::sync::Arc;
use std::time::Duration;

use droplet_core::{CalibrationTable, CommandLink, FailureReason, LinkCfg, Positioner, Session};
use droplet_hardware::{SimulatedActuator, SimulatedBench, SimulatedCamera};
use droplet_traits::{Camera, ManualClock};
use rstest::rstest;

type BenchSession = Session<Box<dyn Camera>, Box<dyn CommandLink>>;

fn bench_session(start: f64, px_per_s: f64) -> (BenchSession, SimulatedBench) {
    let bench = SimulatedBench::new(start);
    let cam = SimulatedCamera::new(bench.clone(), 1280, 720);
    let act = SimulatedActuator::new(bench.clone(), px_per_s, 1279.0);
    let p = Positioner::builder()
        .with_camera(cam)
        .with_actuator(act)
        .with_calibration(CalibrationTable::seed())
        .with_link_cfg(LinkCfg {
            boot_delay: Duration::ZERO,
        })
        .with_clock(Arc::new(ManualClock::new()))
        .build()
        .unwrap();
    (Session::new(p), bench)
}

#[rstest]
fn calibrated_plant_lands_on_target() {
    let (mut s, bench) = bench_session(200.0, 62.5);
    assert_eq!(s.locate().position(), Some(200));
    let r = s.move_to(300).unwrap();
    assert!(r.success, "{r:?}");
    assert_eq!(r.error_px, Some(0));
    assert!((bench.position() - 300.0).abs() < 1e-9);
}

#[rstest]
fn fast_plant_overshoots() {
    let (mut s, _bench) = bench_session(200.0, 100.0);
    let r = s.move_to(300).unwrap();
    assert!(!r.success);
    assert_eq!(r.final_px, Some(360));
    assert_eq!(r.error_px, Some(60));
    assert_eq!(r.reason, Some(FailureReason::OutOfTolerance));
}

#[rstest]
fn plant_clamps_at_channel_end_and_clipped_droplet_is_found() {
    let (mut s, bench) = bench_session(1200.0, 1000.0);
    let r = s.move_to(1270).unwrap();
    assert_eq!(bench.position(), 1279.0);
    // Only the left half of the droplet remains in frame
    assert_eq!(r.final_px, Some(1269));
    assert!(r.success);
}

#[rstest]
fn droplet_outside_frame_is_undetectable() {
    let (mut s, bench) = bench_session(600.0, 62.5);
    bench.set_position(-500.0);
    let r = s.move_to(300).unwrap();
    assert_eq!(r.reason, Some(FailureReason::PositionUndetectable));
}
