//! Calibrated distance → motion profile lookup.
//!
//! Entries are sorted by strictly increasing distance and the table is never
//! empty. Distances between two entries resolve by per-field linear
//! interpolation; distances outside the table clamp to the nearest end.

use crate::error::TableError;
use crate::profile::MotionProfile;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationEntry {
    pub distance: f64,
    pub profile: MotionProfile,
}

impl CalibrationEntry {
    pub fn new(distance: f64, profile: MotionProfile) -> Self {
        Self { distance, profile }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    entries: Vec<CalibrationEntry>,
}

impl CalibrationTable {
    pub fn new(entries: Vec<CalibrationEntry>) -> Result<Self, TableError> {
        if entries.is_empty() {
            return Err(TableError::Empty);
        }
        for (index, e) in entries.iter().enumerate() {
            if !(e.distance.is_finite() && e.distance > 0.0) {
                return Err(TableError::BadDistance {
                    index,
                    distance: e.distance,
                });
            }
            if index > 0 && entries[index - 1].distance >= e.distance {
                return Err(TableError::NotIncreasing {
                    index,
                    distance: e.distance,
                });
            }
        }
        Ok(Self { entries })
    }

    /// Bench table used when no calibration source is configured.
    pub fn seed() -> Self {
        const ROWS: [(f64, f64, f64, f64); 5] = [
            (50.0, 0.8, 0.3, 0.7),
            (100.0, 1.2, 0.5, 1.0),
            (150.0, 1.8, 0.7, 1.5),
            (200.0, 2.4, 0.9, 2.0),
            (250.0, 3.0, 1.1, 2.5),
        ];
        let entries = ROWS
            .iter()
            .map(|&(d, a, c, e)| CalibrationEntry {
                distance: d,
                profile: MotionProfile::from_trusted(a, c, e),
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[CalibrationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve the profile for travelling `distance` pixels.
    ///
    /// Negative or NaN distances resolve like zero (the smallest entry).
    pub fn resolve(&self, distance: f64) -> MotionProfile {
        let d = if distance.is_nan() { 0.0 } else { distance };
        // Non-empty by construction
        let first = &self.entries[0];
        let last = &self.entries[self.entries.len() - 1];
        if d <= first.distance {
            return first.profile;
        }
        if d >= last.distance {
            return last.profile;
        }
        // First entry with distance >= d; lies in 1..len because of the checks above
        let hi = self.entries.partition_point(|e| e.distance < d);
        let upper = &self.entries[hi];
        if upper.distance == d {
            return upper.profile;
        }
        let lower = &self.entries[hi - 1];
        let ratio = (d - lower.distance) / (upper.distance - lower.distance);
        lower.profile.lerp(&upper.profile, ratio)
    }

    /// New table version with `entry` added, replacing any entry at the same
    /// distance. The receiver is left untouched.
    pub fn with_entry(&self, entry: CalibrationEntry) -> Result<Self, TableError> {
        let mut entries = self.entries.clone();
        match entries.binary_search_by(|e| e.distance.total_cmp(&entry.distance)) {
            Ok(i) => entries[i] = entry,
            Err(i) => entries.insert(i, entry),
        }
        Self::new(entries)
    }
}
