//! Leaf records, the leaf table, and depth/z filtering.
//!
//! A leaf record is a single voxel sample emitted by an external octree
//! hierarchy builder: integer grid coordinates, the octree depth the sample
//! lives at, and an occupancy probability. The table keeps records in
//! insertion order, which matters downstream: rasterization resolves
//! duplicate `(x, y)` cells by letting the later record win.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RasterError, RasterResult};

/// Number of comma-separated fields in a leaf CSV row.
const LEAF_CSV_FIELDS: usize = 5;

/// A single voxel sample at a given octree depth.
///
/// Produced externally; immutable once loaded. `prob` is stored exactly as
/// parsed, with no `[0, 1]` validation (renderers clamp visually).
///
/// # Example
///
/// ```
/// use occupancy_raster::LeafRecord;
///
/// let rec = LeafRecord::new(1, 2, 0, 4, 0.85);
/// assert_eq!(rec.depth, 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeafRecord {
    /// X grid coordinate.
    pub x: u32,
    /// Y grid coordinate.
    pub y: u32,
    /// Z grid coordinate (slice index).
    pub z: u32,
    /// Octree depth the sample was emitted at. Higher depth = finer voxels.
    pub depth: u32,
    /// Occupancy probability, nominally in `[0, 1]` but stored raw.
    pub prob: f64,
}

impl LeafRecord {
    /// Creates a new leaf record.
    #[must_use]
    pub const fn new(x: u32, y: u32, z: u32, depth: u32, prob: f64) -> Self {
        Self { x, y, z, depth, prob }
    }
}

/// An ordered collection of leaf records.
///
/// Insertion order is preserved and observable: when two records land on the
/// same `(x, y)` cell of a rasterized slice, the later one wins.
///
/// # Example
///
/// ```
/// use occupancy_raster::{LeafRecord, LeafTable};
///
/// let table = LeafTable::from_records(vec![
///     LeafRecord::new(0, 0, 0, 2, 0.1),
///     LeafRecord::new(1, 0, 0, 2, 0.9),
/// ]);
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.max_depth(), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeafTable {
    records: Vec<LeafRecord>,
}

impl LeafTable {
    /// Creates an empty leaf table.
    #[must_use]
    pub const fn new() -> Self {
        Self { records: Vec::new() }
    }

    /// Creates a leaf table from existing records, preserving their order.
    #[must_use]
    pub fn from_records(records: Vec<LeafRecord>) -> Self {
        Self { records }
    }

    /// Loads a leaf table from a headerless CSV file.
    ///
    /// Expects the literal column order `x,y,z,depth,prob` with the first
    /// four fields parsing as non-negative integers and the fifth as a
    /// float. Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::FileNotFound`] if the file does not exist,
    /// [`RasterError::MalformedRecord`] (with the zero-based row index) if
    /// any row fails to parse, or [`RasterError::Io`] on read failure. A
    /// malformed row fails the whole load; no partial table is returned.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use occupancy_raster::LeafTable;
    ///
    /// let table = LeafTable::load_csv("leaves.csv").unwrap();
    /// println!("{} records", table.len());
    /// ```
    pub fn load_csv<P: AsRef<Path>>(path: P) -> RasterResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RasterError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                RasterError::Io(e)
            }
        })?;
        let table = Self::read_csv(BufReader::new(file))?;
        debug!(path = %path.display(), records = table.len(), "loaded leaf csv");
        Ok(table)
    }

    /// Reads a leaf table from any buffered reader of leaf CSV rows.
    ///
    /// The source is read exactly once, sequentially.
    ///
    /// # Errors
    ///
    /// Same parse contract as [`LeafTable::load_csv`].
    pub fn read_csv<R: BufRead>(reader: R) -> RasterResult<Self> {
        let mut records = Vec::new();
        for (line_idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            records.push(parse_leaf_row(trimmed, line_idx)?);
        }
        Ok(Self { records })
    }

    /// Returns the number of records in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[LeafRecord] {
        &self.records
    }

    /// Returns an iterator over the records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LeafRecord> {
        self.records.iter()
    }

    /// Returns the maximum depth over all records, or `None` if empty.
    #[must_use]
    pub fn max_depth(&self) -> Option<u32> {
        self.records.iter().map(|r| r.depth).max()
    }

    /// Resolves the target depth for a render request.
    ///
    /// `Some(d)` passes through unchanged; `None` defaults to the maximum
    /// depth present in the table.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::EmptyInput`] when `None` is requested on an
    /// empty table, since no default depth exists.
    ///
    /// # Example
    ///
    /// ```
    /// use occupancy_raster::{LeafRecord, LeafTable};
    ///
    /// let table = LeafTable::from_records(vec![
    ///     LeafRecord::new(0, 0, 0, 2, 0.5),
    ///     LeafRecord::new(0, 0, 0, 5, 0.5),
    /// ]);
    /// assert_eq!(table.resolve_depth(None).unwrap(), 5);
    /// assert_eq!(table.resolve_depth(Some(2)).unwrap(), 2);
    /// ```
    pub fn resolve_depth(&self, depth: Option<u32>) -> RasterResult<u32> {
        match depth {
            Some(d) => Ok(d),
            None => self.max_depth().ok_or(RasterError::EmptyInput),
        }
    }

    /// Returns the records matching a depth and an optional set of z indices.
    ///
    /// The predicate keeps records where `record.depth == depth` and, when
    /// `zs` is provided, `record.z` is in the set. Output preserves the
    /// table's insertion order.
    ///
    /// # Example
    ///
    /// ```
    /// use occupancy_raster::{LeafRecord, LeafTable};
    ///
    /// let table = LeafTable::from_records(vec![
    ///     LeafRecord::new(0, 0, 0, 2, 0.1),
    ///     LeafRecord::new(0, 0, 1, 2, 0.2),
    ///     LeafRecord::new(0, 0, 0, 3, 0.3),
    /// ]);
    ///
    /// let subset = table.filter(2, Some(&[0]));
    /// assert_eq!(subset.len(), 1);
    /// assert_eq!(subset.records()[0].prob, 0.1);
    /// ```
    #[must_use]
    pub fn filter(&self, depth: u32, zs: Option<&[u32]>) -> Self {
        let records = self
            .records
            .iter()
            .filter(|r| r.depth == depth && zs.is_none_or(|zs| zs.contains(&r.z)))
            .copied()
            .collect();
        Self { records }
    }

    /// Returns the record count per depth over the whole table.
    ///
    /// Useful for inspecting which resolution levels a dataset actually
    /// populated before picking a depth to render.
    ///
    /// # Example
    ///
    /// ```
    /// use occupancy_raster::{LeafRecord, LeafTable};
    ///
    /// let table = LeafTable::from_records(vec![
    ///     LeafRecord::new(0, 0, 0, 2, 0.1),
    ///     LeafRecord::new(1, 0, 0, 2, 0.2),
    ///     LeafRecord::new(0, 0, 0, 3, 0.3),
    /// ]);
    ///
    /// let hist = table.depth_histogram();
    /// assert_eq!(hist[&2], 2);
    /// assert_eq!(hist[&3], 1);
    /// ```
    #[must_use]
    pub fn depth_histogram(&self) -> BTreeMap<u32, usize> {
        let mut counts = BTreeMap::new();
        for rec in &self.records {
            *counts.entry(rec.depth).or_insert(0) += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a LeafTable {
    type Item = &'a LeafRecord;
    type IntoIter = std::slice::Iter<'a, LeafRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Parses one `x,y,z,depth,prob` row.
fn parse_leaf_row(row: &str, line: usize) -> RasterResult<LeafRecord> {
    let malformed = |message: String| RasterError::MalformedRecord { line, message };

    let fields: Vec<&str> = row.split(',').map(str::trim).collect();
    if fields.len() != LEAF_CSV_FIELDS {
        return Err(malformed(format!(
            "expected {LEAF_CSV_FIELDS} fields, got {}",
            fields.len()
        )));
    }

    let int_field = |idx: usize, name: &str| -> RasterResult<u32> {
        fields[idx]
            .parse::<u32>()
            .map_err(|e| malformed(format!("field '{name}': {e}")))
    };

    let x = int_field(0, "x")?;
    let y = int_field(1, "y")?;
    let z = int_field(2, "z")?;
    let depth = int_field(3, "depth")?;
    let prob = fields[4]
        .parse::<f64>()
        .map_err(|e| malformed(format!("field 'prob': {e}")))?;

    Ok(LeafRecord::new(x, y, z, depth, prob))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_table() -> LeafTable {
        LeafTable::from_records(vec![
            LeafRecord::new(0, 0, 0, 2, 0.1),
            LeafRecord::new(1, 0, 0, 2, 0.9),
            LeafRecord::new(0, 1, 0, 2, 0.5),
            LeafRecord::new(0, 0, 1, 2, 0.4),
            LeafRecord::new(0, 0, 0, 3, 0.7),
        ])
    }

    #[test]
    fn test_read_csv() {
        let src = "0,0,0,2,0.1\n1,0,0,2,0.9\n\n0,1,0,2,0.5\n";
        let table = LeafTable::read_csv(Cursor::new(src)).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[1].x, 1);
        assert_eq!(table.records()[1].prob, 0.9);
    }

    #[test]
    fn test_read_csv_tolerates_spaces() {
        let src = " 0, 0, 0, 2, 0.25\n";
        let table = LeafTable::read_csv(Cursor::new(src)).unwrap();
        assert_eq!(table.records()[0].prob, 0.25);
    }

    #[test]
    fn test_read_csv_malformed_row_reports_index() {
        let src = "0,0,0,2,0.1\n1,0,x,2,0.9\n";
        let err = LeafTable::read_csv(Cursor::new(src)).unwrap_err();
        match err {
            RasterError::MalformedRecord { line, .. } => assert_eq!(line, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_csv_rejects_negative_coordinate() {
        let src = "-1,0,0,2,0.1\n";
        assert!(matches!(
            LeafTable::read_csv(Cursor::new(src)),
            Err(RasterError::MalformedRecord { line: 0, .. })
        ));
    }

    #[test]
    fn test_read_csv_rejects_short_row() {
        let src = "0,0,0,2\n";
        assert!(matches!(
            LeafTable::read_csv(Cursor::new(src)),
            Err(RasterError::MalformedRecord { line: 0, .. })
        ));
    }

    #[test]
    fn test_prob_outside_unit_interval_is_kept() {
        let src = "0,0,0,2,1.75\n";
        let table = LeafTable::read_csv(Cursor::new(src)).unwrap();
        assert_eq!(table.records()[0].prob, 1.75);
    }

    #[test]
    fn test_load_csv_missing_file() {
        assert!(matches!(
            LeafTable::load_csv("definitely/not/here.csv"),
            Err(RasterError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_depth_defaults_to_max() {
        let table = sample_table();
        assert_eq!(table.resolve_depth(None).unwrap(), 3);
        assert_eq!(table.resolve_depth(Some(2)).unwrap(), 2);
    }

    #[test]
    fn test_resolve_depth_empty_table() {
        let table = LeafTable::new();
        assert!(matches!(
            table.resolve_depth(None),
            Err(RasterError::EmptyInput)
        ));
        // An explicit depth never needs the table.
        assert_eq!(table.resolve_depth(Some(4)).unwrap(), 4);
    }

    #[test]
    fn test_filter_by_depth_and_z() {
        let table = sample_table();
        let subset = table.filter(2, Some(&[0]));
        assert_eq!(subset.len(), 3);
        assert!(subset.iter().all(|r| r.depth == 2 && r.z == 0));
    }

    #[test]
    fn test_filter_no_z_keeps_all_z() {
        let table = sample_table();
        let subset = table.filter(2, None);
        assert_eq!(subset.len(), 4);
    }

    #[test]
    fn test_filter_preserves_order() {
        let table = sample_table();
        let subset = table.filter(2, Some(&[0]));
        let probs: Vec<f64> = subset.iter().map(|r| r.prob).collect();
        assert_eq!(probs, vec![0.1, 0.9, 0.5]);
    }

    #[test]
    fn test_depth_histogram() {
        let table = sample_table();
        let hist = table.depth_histogram();
        assert_eq!(hist[&2], 4);
        assert_eq!(hist[&3], 1);
        assert_eq!(hist.len(), 2);
    }
}
