//! Discrete occupancy band classification.
//!
//! A band spec turns a continuous probability into one of a small number of
//! labeled bins, either from explicit boundaries or from a named preset.
//! Bins are half-open `[b[i], b[i+1])` except the last, which is closed so
//! that `1.0` lands in the top band rather than falling off the end.

use serde::{Deserialize, Serialize};

use crate::error::{RasterError, RasterResult};
use crate::grid::DenseGrid;

/// Names of the built-in band presets, in registry order.
pub const PRESET_NAMES: &[&str] = &["occ3", "occ5", "occ_heat"];

/// Ordered band boundaries with one label per bin.
///
/// `boundaries` is non-decreasing with length >= 2; `labels` has exactly
/// `boundaries.len() - 1` entries.
///
/// # Example
///
/// ```
/// use occupancy_raster::BandSpec;
///
/// let spec = BandSpec::preset("occ3").unwrap();
/// assert_eq!(spec.band_count(), 3);
/// assert_eq!(spec.label(spec.classify(0.1)), "free");
/// assert_eq!(spec.label(spec.classify(0.9)), "occupied");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BandSpecRaw")]
pub struct BandSpec {
    boundaries: Vec<f64>,
    labels: Vec<String>,
}

/// Unvalidated mirror that routes deserialization through
/// [`BandSpec::new`], so external input cannot bypass the boundary and
/// label invariants.
#[derive(Deserialize)]
struct BandSpecRaw {
    boundaries: Vec<f64>,
    labels: Vec<String>,
}

impl TryFrom<BandSpecRaw> for BandSpec {
    type Error = RasterError;

    fn try_from(raw: BandSpecRaw) -> Result<Self, Self::Error> {
        Self::new(raw.boundaries, raw.labels)
    }
}

impl BandSpec {
    /// Creates a band spec from explicit boundaries and labels.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::TooFewBoundaries`] for fewer than two
    /// boundaries, [`RasterError::NonMonotonicBoundaries`] if the boundary
    /// list ever decreases, and [`RasterError::LabelCountMismatch`] if the
    /// label count is not `boundaries.len() - 1`.
    pub fn new(boundaries: Vec<f64>, labels: Vec<String>) -> RasterResult<Self> {
        if boundaries.len() < 2 {
            return Err(RasterError::TooFewBoundaries {
                count: boundaries.len(),
            });
        }
        for (i, pair) in boundaries.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(RasterError::NonMonotonicBoundaries { index: i + 1 });
            }
        }
        if labels.len() != boundaries.len() - 1 {
            return Err(RasterError::LabelCountMismatch {
                labels: labels.len(),
                bands: boundaries.len() - 1,
            });
        }
        Ok(Self { boundaries, labels })
    }

    /// Creates a band spec from explicit boundaries with generated labels.
    ///
    /// Labels are the half-open ranges printed to two decimals, e.g.
    /// `[0.00,0.25)`.
    ///
    /// # Errors
    ///
    /// Same boundary validation as [`BandSpec::new`].
    pub fn from_boundaries(boundaries: Vec<f64>) -> RasterResult<Self> {
        let labels = boundaries
            .windows(2)
            .map(|pair| format!("[{:.2},{:.2})", pair[0], pair[1]))
            .collect();
        Self::new(boundaries, labels)
    }

    /// Looks up a named preset from the closed registry.
    ///
    /// Known presets:
    /// - `occ3` — free / unknown / occupied at `[0.0, 0.5, 0.7, 1.0]`.
    /// - `occ5` — fine bands with clamp hints at
    ///   `[0.0, 0.12, 0.5, 0.7, 0.97, 1.0]`.
    /// - `occ_heat` — four equal quartile bands over `[0.0, 1.0]` with
    ///   generated range labels.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::UnknownPreset`] (listing the known names) for
    /// anything else.
    pub fn preset(name: &str) -> RasterResult<Self> {
        let owned = |labels: &[&str]| labels.iter().map(ToString::to_string).collect();
        match name {
            "occ3" => Self::new(
                vec![0.0, 0.5, 0.7, 1.0],
                owned(&["free", "unknown", "occupied"]),
            ),
            "occ5" => Self::new(
                vec![0.0, 0.12, 0.5, 0.7, 0.97, 1.0],
                owned(&[
                    "< clamp_min",
                    "[clamp_min,0.5)",
                    "[0.5,hit)",
                    "[hit,clamp_max)",
                    ">= clamp_max",
                ]),
            ),
            "occ_heat" => Self::from_boundaries(vec![0.0, 0.25, 0.5, 0.75, 1.0]),
            other => Err(RasterError::UnknownPreset {
                name: other.to_string(),
                known: PRESET_NAMES.join(", "),
            }),
        }
    }

    /// Returns the boundary list.
    #[must_use]
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Returns the number of bands.
    #[must_use]
    pub fn band_count(&self) -> usize {
        self.labels.len()
    }

    /// Returns the label of the given band index.
    ///
    /// # Panics
    ///
    /// Panics if `band >= band_count()`.
    #[must_use]
    pub fn label(&self, band: usize) -> &str {
        &self.labels[band]
    }

    /// Classifies a value into a band index.
    ///
    /// `v` maps to the bin `i` with `boundaries[i] <= v < boundaries[i+1]`;
    /// the top boundary itself maps to the last bin (closed upper edge).
    /// Values outside the boundary range clip to the nearest edge bin.
    ///
    /// # Example
    ///
    /// ```
    /// use occupancy_raster::BandSpec;
    ///
    /// let spec = BandSpec::preset("occ3").unwrap();
    /// assert_eq!(spec.classify(0.5), 1);  // [0.5, 0.7) -> unknown
    /// assert_eq!(spec.classify(1.0), 2);  // closed upper edge
    /// assert_eq!(spec.classify(-3.0), 0); // clips low
    /// ```
    #[must_use]
    pub fn classify(&self, v: f64) -> usize {
        let last = self.labels.len() - 1;
        if v < self.boundaries[0] {
            return 0;
        }
        for i in 0..self.labels.len() {
            if v < self.boundaries[i + 1] {
                return i;
            }
        }
        last
    }

    /// Classifies every cell of a grid, row-major.
    #[must_use]
    pub fn classify_grid(&self, grid: &DenseGrid) -> Vec<usize> {
        grid.values().iter().map(|&v| self.classify(v)).collect()
    }

    /// Returns the ordered `(lo, hi, label)` triples for a legend.
    #[must_use]
    pub fn ranges(&self) -> Vec<(f64, f64, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| (self.boundaries[i], self.boundaries[i + 1], label.as_str()))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::leaf::LeafRecord;

    #[test]
    fn test_new_validates_boundary_count() {
        assert!(matches!(
            BandSpec::new(vec![0.5], vec![]),
            Err(RasterError::TooFewBoundaries { count: 1 })
        ));
    }

    #[test]
    fn test_new_validates_monotonicity() {
        assert!(matches!(
            BandSpec::new(
                vec![0.0, 0.7, 0.5, 1.0],
                vec!["a".into(), "b".into(), "c".into()]
            ),
            Err(RasterError::NonMonotonicBoundaries { index: 2 })
        ));
    }

    #[test]
    fn test_new_validates_label_count() {
        assert!(matches!(
            BandSpec::new(vec![0.0, 0.5, 1.0], vec!["only".into()]),
            Err(RasterError::LabelCountMismatch { labels: 1, bands: 2 })
        ));
    }

    #[test]
    fn test_equal_boundaries_are_allowed() {
        // Non-decreasing, not strictly increasing; the empty band just
        // never classifies anything.
        let spec = BandSpec::new(
            vec![0.0, 0.5, 0.5, 1.0],
            vec!["a".into(), "b".into(), "c".into()],
        )
        .unwrap();
        assert_eq!(spec.classify(0.5), 2);
    }

    #[test]
    fn test_classify_half_open_bins() {
        let spec = BandSpec::preset("occ3").unwrap();
        assert_eq!(spec.classify(0.0), 0);
        assert_eq!(spec.classify(0.49), 0);
        assert_eq!(spec.classify(0.5), 1);
        assert_eq!(spec.classify(0.69), 1);
        assert_eq!(spec.classify(0.7), 2);
    }

    #[test]
    fn test_classify_closed_upper_edge() {
        let spec = BandSpec::preset("occ3").unwrap();
        assert_eq!(spec.classify(1.0), 2);
    }

    #[test]
    fn test_classify_clips_out_of_range() {
        let spec = BandSpec::preset("occ3").unwrap();
        assert_eq!(spec.classify(-0.5), 0);
        assert_eq!(spec.classify(2.0), 2);
    }

    #[test]
    fn test_occ5_preset() {
        let spec = BandSpec::preset("occ5").unwrap();
        assert_eq!(spec.band_count(), 5);
        assert_eq!(spec.label(spec.classify(0.05)), "< clamp_min");
        assert_eq!(spec.label(spec.classify(0.98)), ">= clamp_max");
        assert_eq!(spec.label(spec.classify(0.6)), "[0.5,hit)");
    }

    #[test]
    fn test_occ_heat_generated_labels() {
        let spec = BandSpec::preset("occ_heat").unwrap();
        assert_eq!(spec.band_count(), 4);
        assert_eq!(spec.label(0), "[0.00,0.25)");
        assert_eq!(spec.label(3), "[0.75,1.00)");
    }

    #[test]
    fn test_unknown_preset_lists_known_names() {
        let err = BandSpec::preset("occ7").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("occ3"));
        assert!(msg.contains("occ5"));
        assert!(msg.contains("occ_heat"));
    }

    #[test]
    fn test_deserialize_validates_invariants() {
        let ok: BandSpec =
            serde_json::from_str(r#"{"boundaries":[0.0,0.5,1.0],"labels":["a","b"]}"#).unwrap();
        assert_eq!(ok.band_count(), 2);

        // A label count of zero or a decreasing boundary list must not
        // produce a spec that misbehaves in classify.
        assert!(
            serde_json::from_str::<BandSpec>(r#"{"boundaries":[0.0,1.0],"labels":[]}"#).is_err()
        );
        assert!(serde_json::from_str::<BandSpec>(
            r#"{"boundaries":[0.0,0.7,0.5],"labels":["a","b"]}"#
        )
        .is_err());
    }

    #[test]
    fn test_classify_grid_row_major() {
        let grid = DenseGrid::rasterize(&[
            LeafRecord::new(0, 0, 0, 2, 0.1),
            LeafRecord::new(1, 0, 0, 2, 0.9),
            LeafRecord::new(0, 1, 0, 2, 0.5),
        ]);
        let spec = BandSpec::preset("occ3").unwrap();
        assert_eq!(spec.classify_grid(&grid), vec![0, 2, 1, 0]);
    }

    #[test]
    fn test_ranges_for_legend() {
        let spec = BandSpec::preset("occ3").unwrap();
        let ranges = spec.ranges();
        assert_eq!(ranges[0], (0.0, 0.5, "free"));
        assert_eq!(ranges[2], (0.7, 1.0, "occupied"));
    }
}
