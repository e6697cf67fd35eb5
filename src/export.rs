//! Dense tabular export of rendered grids.
//!
//! Exports are the fully dense form of a grid: one row per cell, zeros
//! included, so the row count is always `width * height` regardless of how
//! many sparse records populated the grid. Re-rasterizing the rows
//! reproduces the grid exactly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RasterError, RasterResult};
use crate::grid::DenseGrid;
use crate::leaf::LeafTable;

/// Fractional digits written for `prob` in grid export CSV.
const PROB_PRECISION: usize = 9;

/// One exported grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    /// Cell x coordinate.
    pub x: u32,
    /// Cell y coordinate.
    pub y: u32,
    /// Cell probability value.
    pub prob: f64,
}

/// Returns every cell of a grid as rows in row-major order.
///
/// `y` is the outer loop (ascending), `x` the inner loop (ascending).
///
/// # Example
///
/// ```
/// use occupancy_raster::{grid_rows, DenseGrid, LeafRecord};
///
/// let grid = DenseGrid::rasterize(&[LeafRecord::new(1, 0, 0, 2, 0.9)]);
/// let rows = grid_rows(&grid);
/// assert_eq!(rows.len(), grid.width() * grid.height());
/// assert_eq!((rows[1].x, rows[1].y), (1, 0));
/// assert_eq!(rows[1].prob, 0.9);
/// ```
#[must_use]
pub fn grid_rows(grid: &DenseGrid) -> Vec<GridRow> {
    grid.cells()
        .map(|(x, y, prob)| GridRow { x, y, prob })
        .collect()
}

/// Writes a grid to CSV with an `x,y,prob` header.
///
/// One data row per cell in row-major order; `prob` is printed with a fixed
/// 9 fractional digits.
///
/// # Errors
///
/// Returns [`RasterError::IoWrite`] (carrying the path) if the file cannot
/// be created or written.
pub fn write_grid_csv<P: AsRef<Path>>(grid: &DenseGrid, path: P) -> RasterResult<()> {
    let path = path.as_ref();
    let io_write = |source: std::io::Error| RasterError::IoWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_write)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "x,y,prob").map_err(io_write)?;
    for row in grid_rows(grid) {
        writeln!(
            writer,
            "{},{},{:.prec$}",
            row.x,
            row.y,
            row.prob,
            prec = PROB_PRECISION
        )
        .map_err(io_write)?;
    }
    writer.flush().map_err(io_write)?;
    debug!(path = %path.display(), cells = grid.width() * grid.height(), "wrote grid csv");
    Ok(())
}

/// Filters a table to one z slice, rasterizes it, and writes the grid CSV.
///
/// Returns the resolved depth.
///
/// # Errors
///
/// Returns [`RasterError::EmptyInput`] when `depth` is `None` and the table
/// is empty, or [`RasterError::IoWrite`] on write failure.
pub fn export_slice_grid<P: AsRef<Path>>(
    table: &LeafTable,
    z: u32,
    depth: Option<u32>,
    path: P,
) -> RasterResult<u32> {
    let depth = table.resolve_depth(depth)?;
    let grid = DenseGrid::rasterize(table.filter(depth, Some(&[z])).records());
    write_grid_csv(&grid, path)?;
    Ok(depth)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::leaf::LeafRecord;

    fn sample_grid() -> DenseGrid {
        DenseGrid::rasterize(&[
            LeafRecord::new(0, 0, 0, 2, 0.1),
            LeafRecord::new(1, 0, 0, 2, 0.9),
            LeafRecord::new(0, 1, 0, 2, 0.5),
        ])
    }

    #[test]
    fn test_grid_rows_dense_row_major() {
        let rows = grid_rows(&sample_grid());
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], GridRow { x: 0, y: 0, prob: 0.1 });
        assert_eq!(rows[1], GridRow { x: 1, y: 0, prob: 0.9 });
        assert_eq!(rows[2], GridRow { x: 0, y: 1, prob: 0.5 });
        assert_eq!(rows[3], GridRow { x: 1, y: 1, prob: 0.0 });
    }

    #[test]
    fn test_rows_rerasterize_to_same_grid() {
        let grid = sample_grid();
        let records: Vec<LeafRecord> = grid_rows(&grid)
            .into_iter()
            .map(|r| LeafRecord::new(r.x, r.y, 0, 0, r.prob))
            .collect();
        assert_eq!(DenseGrid::rasterize(&records), grid);
    }

    #[test]
    fn test_write_grid_csv_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.csv");
        write_grid_csv(&sample_grid(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "x,y,prob");
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "0,0,0.100000000");
        assert_eq!(lines[4], "1,1,0.000000000");
    }

    #[test]
    fn test_write_grid_csv_bad_path() {
        let grid = sample_grid();
        assert!(matches!(
            write_grid_csv(&grid, "no/such/dir/grid.csv"),
            Err(RasterError::IoWrite { .. })
        ));
    }

    #[test]
    fn test_export_slice_grid_end_to_end() {
        let table = LeafTable::from_records(vec![
            LeafRecord::new(0, 0, 0, 2, 0.1),
            LeafRecord::new(1, 0, 0, 2, 0.9),
            LeafRecord::new(0, 0, 1, 2, 0.4),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.csv");
        let depth = export_slice_grid(&table, 0, None, &path).unwrap();
        assert_eq!(depth, 2);

        let text = std::fs::read_to_string(&path).unwrap();
        // Header plus the 2x1 slice at z=0.
        assert_eq!(text.lines().count(), 3);
    }
}
