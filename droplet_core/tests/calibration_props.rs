use droplet_core::{CalibrationEntry, CalibrationTable, MotionProfile};
use proptest::prelude::*;
use rstest::rstest;

fn p(a: f64, c: f64, d: f64) -> MotionProfile {
    MotionProfile::new(a, c, d).unwrap()
}

fn close(a: &MotionProfile, b: &MotionProfile) -> bool {
    (a.accelerate_s() - b.accelerate_s()).abs() < 1e-9
        && (a.coast_s() - b.coast_s()).abs() < 1e-9
        && (a.decelerate_s() - b.decelerate_s()).abs() < 1e-9
}

#[rstest]
fn interpolates_halfway_between_two_entries() {
    let t = CalibrationTable::new(vec![
        CalibrationEntry::new(50.0, p(0.8, 0.3, 0.7)),
        CalibrationEntry::new(100.0, p(1.2, 0.5, 1.0)),
    ])
    .unwrap();
    let r = t.resolve(75.0);
    assert!(close(&r, &p(1.0, 0.4, 0.85)), "got {r:?}");
}

#[rstest]
#[case(0.0, 0)]
#[case(10.0, 0)]
#[case(50.0, 0)]
#[case(250.0, 4)]
#[case(900.0, 4)]
#[case(-5.0, 0)]
fn clamps_to_boundary_entries(#[case] d: f64, #[case] idx: usize) {
    let t = CalibrationTable::seed();
    assert_eq!(t.resolve(d), t.entries()[idx].profile);
}

prop_compose! {
    fn table_strategy()(
        keys in prop::collection::btree_set(1u32..5000, 2..10),
    )(
        timings in prop::collection::vec((0.0f64..10.0, 0.0f64..10.0, 0.0f64..10.0), keys.len()),
        keys in Just(keys),
    ) -> CalibrationTable {
        let entries = keys
            .iter()
            .zip(timings)
            .map(|(&k, (a, c, d))| CalibrationEntry::new(f64::from(k), p(a, c, d)))
            .collect();
        CalibrationTable::new(entries).unwrap()
    }
}

proptest! {
    #[test]
    fn resolving_a_key_returns_its_profile(t in table_strategy()) {
        for e in t.entries() {
            prop_assert_eq!(t.resolve(e.distance), e.profile);
        }
    }

    #[test]
    fn interpolated_fields_lie_between_brackets(t in table_strategy(), frac in 0.0f64..1.0) {
        for w in t.entries().windows(2) {
            let (lo, hi) = (&w[0], &w[1]);
            let d = lo.distance + frac * (hi.distance - lo.distance);
            let r = t.resolve(d);
            let within = |v: f64, a: f64, b: f64| v >= a.min(b) - 1e-9 && v <= a.max(b) + 1e-9;
            prop_assert!(within(r.accelerate_s(), lo.profile.accelerate_s(), hi.profile.accelerate_s()));
            prop_assert!(within(r.coast_s(), lo.profile.coast_s(), hi.profile.coast_s()));
            prop_assert!(within(r.decelerate_s(), lo.profile.decelerate_s(), hi.profile.decelerate_s()));
        }
    }

    #[test]
    fn outside_range_returns_boundary(t in table_strategy(), below in 0.0f64..1.0, above in 0.0f64..1e6) {
        let first = t.entries()[0];
        let last = t.entries()[t.len() - 1];
        prop_assert_eq!(t.resolve(first.distance * below), first.profile);
        prop_assert_eq!(t.resolve(last.distance + above), last.profile);
    }

    #[test]
    fn resolve_is_idempotent(t in table_strategy(), d in 0.0f64..6000.0) {
        prop_assert_eq!(t.resolve(d), t.resolve(d));
    }

    #[test]
    fn with_entry_keeps_table_sorted(t in table_strategy(), k in 1u32..6000) {
        let t2 = t.with_entry(CalibrationEntry::new(f64::from(k), p(1.0, 1.0, 1.0))).unwrap();
        prop_assert!(t2.entries().windows(2).all(|w| w[0].distance < w[1].distance));
        prop_assert_eq!(t2.resolve(f64::from(k)), p(1.0, 1.0, 1.0));
    }
}
