//! Frame → 1-D droplet position.
//!
//! Pipeline: intensity → optional Gaussian blur → inverted fixed threshold →
//! hole filling → 8-connected components → largest region → bounding-box x
//! anchor. Holes count towards a region's area, so a bright highlight inside
//! the droplet does not shrink it.
//! Stateless between calls.

use std::collections::VecDeque;

use droplet_traits::Frame;
use ndarray::Array2;
use tracing::trace;

use crate::config::{Anchor, EstimatorCfg};

/// One position reading. `x` is meaningless when `valid` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionSample {
    pub x: i32,
    pub valid: bool,
}

impl PositionSample {
    pub fn found(x: i32) -> Self {
        Self { x, valid: true }
    }

    pub fn not_found() -> Self {
        Self { x: 0, valid: false }
    }

    pub fn position(&self) -> Option<i32> {
        self.valid.then_some(self.x)
    }
}

/// Axis-aligned bounding box and pixel count of one connected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
    pub area: usize,
}

impl Region {
    pub fn anchor_x(&self, anchor: Anchor) -> usize {
        match anchor {
            Anchor::Center => self.left + self.width / 2,
            Anchor::Left => self.left,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Estimator {
    cfg: EstimatorCfg,
    kernel: Option<Vec<f32>>,
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new(EstimatorCfg::default())
    }
}

impl Estimator {
    pub fn new(cfg: EstimatorCfg) -> Self {
        let kernel = (cfg.blur_kernel > 1).then(|| gaussian_kernel(cfg.blur_kernel));
        Self { cfg, kernel }
    }

    pub fn cfg(&self) -> &EstimatorCfg {
        &self.cfg
    }

    pub fn estimate(&self, frame: &Frame) -> PositionSample {
        match self.largest_region(frame) {
            Some(r) => {
                let x = r.anchor_x(self.cfg.anchor);
                trace!(?r, x, "droplet region");
                i32::try_from(x).map_or_else(|_| PositionSample::not_found(), PositionSample::found)
            }
            None => PositionSample::not_found(),
        }
    }

    /// Largest foreground region; ties keep the first in raster order.
    pub fn largest_region(&self, frame: &Frame) -> Option<Region> {
        let gray = frame.to_gray();
        if gray.is_empty() {
            return None;
        }
        let gray = match &self.kernel {
            Some(k) => blur(&gray, k),
            None => gray,
        };
        let mask = fill_holes(&gray.mapv(|v| v <= self.cfg.threshold));
        let regions = regions(&mask);
        trace!(count = regions.len(), "foreground regions");
        regions
            .into_iter()
            .filter(|r| r.area >= self.cfg.min_area_px)
            .fold(None, |best: Option<Region>, r| match best {
                Some(b) if b.area >= r.area => Some(b),
                _ => Some(r),
            })
    }
}

/// Normalised 1-D Gaussian weights for an odd kernel size `k`, with
/// sigma = 0.3 * ((k - 1) * 0.5 - 1) + 0.8.
pub fn gaussian_kernel(k: usize) -> Vec<f32> {
    let k = k.max(1) | 1;
    let sigma = 0.3 * ((k as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (k / 2) as f64;
    let raw: Vec<f64> = (0..k)
        .map(|i| {
            let x = i as f64 - half;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.iter().map(|w| (w / sum) as f32).collect()
}

/// Separable convolution with replicated borders.
pub fn blur(img: &Array2<u8>, kernel: &[f32]) -> Array2<u8> {
    let (h, w) = img.dim();
    let half = (kernel.len() / 2) as isize;
    let clampi = |v: isize, n: usize| v.clamp(0, n as isize - 1) as usize;

    let mut tmp = Array2::<f32>::zeros((h, w));
    for r in 0..h {
        for c in 0..w {
            let mut acc = 0.0f32;
            for (i, &k) in kernel.iter().enumerate() {
                let cc = clampi(c as isize + i as isize - half, w);
                acc += k * f32::from(img[[r, cc]]);
            }
            tmp[[r, c]] = acc;
        }
    }

    let mut out = Array2::<u8>::zeros((h, w));
    for r in 0..h {
        for c in 0..w {
            let mut acc = 0.0f32;
            for (i, &k) in kernel.iter().enumerate() {
                let rr = clampi(r as isize + i as isize - half, h);
                acc += k * tmp[[rr, c]];
            }
            out[[r, c]] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

fn visit_background(
    mask: &Array2<bool>,
    outside: &mut Array2<bool>,
    queue: &mut VecDeque<(usize, usize)>,
    r: usize,
    c: usize,
) {
    if !mask[[r, c]] && !outside[[r, c]] {
        outside[[r, c]] = true;
        queue.push_back((r, c));
    }
}

/// Mark background pixels not 4-connected to the frame border as foreground.
pub fn fill_holes(mask: &Array2<bool>) -> Array2<bool> {
    let (h, w) = mask.dim();
    if h == 0 || w == 0 {
        return mask.clone();
    }
    let mut outside = Array2::<bool>::from_elem((h, w), false);
    let mut queue = VecDeque::new();
    for c in 0..w {
        visit_background(mask, &mut outside, &mut queue, 0, c);
        visit_background(mask, &mut outside, &mut queue, h - 1, c);
    }
    for r in 0..h {
        visit_background(mask, &mut outside, &mut queue, r, 0);
        visit_background(mask, &mut outside, &mut queue, r, w - 1);
    }
    while let Some((r, c)) = queue.pop_front() {
        if r > 0 {
            visit_background(mask, &mut outside, &mut queue, r - 1, c);
        }
        if r + 1 < h {
            visit_background(mask, &mut outside, &mut queue, r + 1, c);
        }
        if c > 0 {
            visit_background(mask, &mut outside, &mut queue, r, c - 1);
        }
        if c + 1 < w {
            visit_background(mask, &mut outside, &mut queue, r, c + 1);
        }
    }
    outside.mapv(|o| !o)
}

fn find_root(parent: &mut [usize], label: usize) -> usize {
    let mut current = label;
    while current != parent[current] {
        parent[current] = parent[parent[current]];
        current = parent[current];
    }
    current
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find_root(parent, a);
    let rb = find_root(parent, b);
    // Smaller label wins so roots stay at first raster appearance
    if ra < rb {
        parent[rb] = ra;
    } else if rb < ra {
        parent[ra] = rb;
    }
}

/// 8-connected foreground regions, ordered by first pixel in raster order.
///
/// Two-pass labelling with a union-find equivalence table.
pub fn regions(mask: &Array2<bool>) -> Vec<Region> {
    let (h, w) = mask.dim();
    let mut labels = Array2::<usize>::zeros((h, w));
    // Label 0 is background
    let mut parent = vec![0usize];

    for r in 0..h {
        for c in 0..w {
            if !mask[[r, c]] {
                continue;
            }
            // Already-visited neighbours: W, NW, N, NE
            let mut neighbours = [0usize; 4];
            if c > 0 {
                neighbours[0] = labels[[r, c - 1]];
            }
            if r > 0 {
                if c > 0 {
                    neighbours[1] = labels[[r - 1, c - 1]];
                }
                neighbours[2] = labels[[r - 1, c]];
                if c + 1 < w {
                    neighbours[3] = labels[[r - 1, c + 1]];
                }
            }
            let min = neighbours.iter().copied().filter(|&l| l > 0).min();
            match min {
                None => {
                    let l = parent.len();
                    parent.push(l);
                    labels[[r, c]] = l;
                }
                Some(m) => {
                    labels[[r, c]] = m;
                    for &n in neighbours.iter().filter(|&&l| l > 0 && l != m) {
                        union(&mut parent, m, n);
                    }
                }
            }
        }
    }

    // Accumulate bounding boxes per root label
    let mut stats: Vec<Option<(usize, usize, usize, usize, usize)>> = vec![None; parent.len()];
    for ((r, c), &l) in labels.indexed_iter() {
        if l == 0 {
            continue;
        }
        let root = find_root(&mut parent, l);
        let s = stats[root].get_or_insert((c, r, c, r, 0));
        s.0 = s.0.min(c);
        s.1 = s.1.min(r);
        s.2 = s.2.max(c);
        s.3 = s.3.max(r);
        s.4 += 1;
    }

    stats
        .into_iter()
        .flatten()
        .map(|(left, top, right, bottom, area)| Region {
            left,
            top,
            width: right - left + 1,
            height: bottom - top + 1,
            area,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from(rows: &[&str]) -> Array2<bool> {
        let h = rows.len();
        let w = rows[0].len();
        Array2::from_shape_fn((h, w), |(r, c)| rows[r].as_bytes()[c] == b'#')
    }

    #[test]
    fn kernel_is_normalised_and_symmetric() {
        let k = gaussian_kernel(5);
        assert_eq!(k.len(), 5);
        assert!((k.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert!((k[0] - k[4]).abs() < 1e-7);
        assert!(k[2] > k[1] && k[1] > k[0]);
    }

    #[test]
    fn diagonal_pixels_join_one_region() {
        let m = mask_from(&["#...", ".#..", "..#.", "...#"]);
        let rs = regions(&m);
        assert_eq!(rs.len(), 1);
        assert_eq!(rs[0].area, 4);
        assert_eq!((rs[0].width, rs[0].height), (4, 4));
    }

    #[test]
    fn u_shape_merges_through_union_find() {
        let m = mask_from(&["#.#", "#.#", "###"]);
        let rs = regions(&m);
        assert_eq!(rs.len(), 1);
        assert_eq!(rs[0].area, 7);
    }

    #[test]
    fn separate_regions_in_raster_order() {
        let m = mask_from(&["..##", "....", "#..."]);
        let rs = regions(&m);
        assert_eq!(rs.len(), 2);
        assert_eq!(rs[0].left, 2);
        assert_eq!(rs[1].left, 0);
    }

    #[test]
    fn enclosed_background_is_filled() {
        let m = mask_from(&["#####", "#...#", "#.#.#", "#...#", "#####", "....."]);
        let filled = fill_holes(&m);
        assert!(filled.slice(ndarray::s![0..5, ..]).iter().all(|&v| v));
        assert!(filled.row(5).iter().all(|&v| !v));
    }

    #[test]
    fn gap_in_ring_keeps_interior_open() {
        let m = mask_from(&["#####", "#...#", "#....", "#####"]);
        assert_eq!(fill_holes(&m), m);
    }

    #[test]
    fn blur_of_flat_image_is_identity() {
        let img = Array2::from_elem((6, 7), 90u8);
        assert_eq!(blur(&img, &gaussian_kernel(5)), img);
    }
}
