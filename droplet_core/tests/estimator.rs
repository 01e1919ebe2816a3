use droplet_core::mocks::ScriptedCamera;
use droplet_core::{Anchor, Estimator, EstimatorCfg, PositionSample};
use droplet_traits::Frame;
use ndarray::{Array2, Array3};
use rstest::rstest;

fn frame_with_rect(w: usize, h: usize, left: usize, top: usize, rw: usize, rh: usize) -> Array2<u8> {
    Array2::from_shape_fn((h, w), |(r, c)| {
        if r >= top && r < top + rh && c >= left && c < left + rw {
            25
        } else {
            235
        }
    })
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(5)]
#[case(9)]
fn dark_rectangle_position_inside_rectangle(#[case] blur_kernel: usize) {
    let est = Estimator::new(EstimatorCfg {
        blur_kernel,
        ..EstimatorCfg::default()
    });
    let frame = Frame::Gray(frame_with_rect(320, 200, 100, 60, 41, 50));
    let s = est.estimate(&frame);
    assert!(s.valid);
    assert!((100..141).contains(&s.x), "x = {}", s.x);
    assert_eq!(s.x, 120);
}

#[rstest]
fn blank_frame_is_not_found() {
    let s = Estimator::default().estimate(&ScriptedCamera::blank(320, 200));
    assert_eq!(s, PositionSample::not_found());
    assert_eq!(s.position(), None);
}

#[rstest]
fn left_anchor_reports_left_edge() {
    let est = Estimator::new(EstimatorCfg {
        anchor: Anchor::Left,
        blur_kernel: 0,
        ..EstimatorCfg::default()
    });
    let s = est.estimate(&Frame::Gray(frame_with_rect(320, 200, 100, 60, 41, 50)));
    assert_eq!(s.position(), Some(100));
}

#[rstest]
fn largest_region_wins_over_specks() {
    let mut px = frame_with_rect(400, 200, 250, 80, 40, 40);
    // Bubble-sized speck to the left, earlier in raster order
    for r in 10..14 {
        for c in 20..24 {
            px[[r, c]] = 10;
        }
    }
    let est = Estimator::new(EstimatorCfg {
        blur_kernel: 0,
        ..EstimatorCfg::default()
    });
    let region = est.largest_region(&Frame::Gray(px)).unwrap();
    assert_eq!(region.left, 250);
    assert_eq!(region.area, 1600);
}

#[rstest]
fn equal_areas_keep_first_in_raster_order() {
    let mut px = frame_with_rect(100, 50, 60, 20, 5, 5);
    for r in 30..35 {
        for c in 10..15 {
            px[[r, c]] = 0;
        }
    }
    let est = Estimator::new(EstimatorCfg {
        blur_kernel: 0,
        ..EstimatorCfg::default()
    });
    // The rect at row 20 starts first in raster order
    assert_eq!(est.largest_region(&Frame::Gray(px)).unwrap().left, 60);
}

#[rstest]
fn min_area_filters_small_regions() {
    let px = frame_with_rect(100, 50, 10, 10, 3, 3);
    let est = Estimator::new(EstimatorCfg {
        blur_kernel: 0,
        min_area_px: 10,
        ..EstimatorCfg::default()
    });
    assert!(!est.estimate(&Frame::Gray(px)).valid);
}

#[rstest]
fn threshold_is_inclusive() {
    let px = Array2::from_shape_fn((10, 10), |(_, c)| if c == 4 { 127 } else { 128 });
    let est = Estimator::new(EstimatorCfg {
        blur_kernel: 0,
        ..EstimatorCfg::default()
    });
    assert_eq!(est.estimate(&Frame::Gray(px)).position(), Some(4));
}

#[rstest]
fn colour_frame_uses_luma() {
    let gray = frame_with_rect(160, 90, 40, 20, 21, 30);
    let bgr = Array3::from_shape_fn((90, 160, 3), |(r, c, _)| gray[[r, c]]);
    let s = Estimator::default().estimate(&Frame::Bgr(bgr));
    assert_eq!(s.position(), Some(50));
}

#[rstest]
fn droplet_clipped_by_frame_edge_is_still_found() {
    let est = Estimator::new(EstimatorCfg {
        blur_kernel: 0,
        ..EstimatorCfg::default()
    });
    let s = est.estimate(&Frame::Gray(frame_with_rect(200, 100, 0, 30, 15, 20)));
    assert_eq!(s.position(), Some(7));
}

#[rstest]
fn empty_frame_is_not_found() {
    let s = Estimator::default().estimate(&Frame::Gray(Array2::zeros((0, 0))));
    assert!(!s.valid);
}

#[rstest]
fn highlight_inside_droplet_counts_towards_area() {
    // Ring droplet (20x20 with a 16x16 highlight) left of a solid 14x14 blob
    let mut px = frame_with_rect(200, 60, 20, 10, 20, 20);
    for r in 12..28 {
        for c in 22..38 {
            px[[r, c]] = 250;
        }
    }
    for r in 10..24 {
        for c in 120..134 {
            px[[r, c]] = 25;
        }
    }
    let est = Estimator::new(EstimatorCfg {
        blur_kernel: 0,
        ..EstimatorCfg::default()
    });
    let region = est.largest_region(&Frame::Gray(px)).unwrap();
    assert_eq!(region.left, 20);
    assert_eq!(region.area, 400);
}
