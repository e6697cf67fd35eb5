//! Dense 2D probability grids and sparse-to-dense rasterization.

// Grid extents are derived from u32 leaf coordinates and stay well below
// usize::MAX on all supported targets.
#![allow(clippy::cast_possible_truncation)]

use serde::{Deserialize, Serialize};

use crate::error::RasterError;
use crate::leaf::LeafRecord;

/// A dense 2D grid of probabilities, indexed `[row = y][col = x]`.
///
/// Every cell is initialized to `0.0` before population, so a cell no record
/// ever touched is indistinguishable from a record with `prob == 0.0`. That
/// is a documented convention of the format, not an "unknown" marker.
///
/// # Example
///
/// ```
/// use occupancy_raster::DenseGrid;
///
/// let mut grid = DenseGrid::zeros(3, 2);
/// grid.set(2, 1, 0.75);
/// assert_eq!(grid.get(2, 1), 0.75);
/// assert_eq!(grid.get(0, 0), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DenseGridRaw")]
pub struct DenseGrid {
    width: usize,
    height: usize,
    /// Row-major cell values, `data[y * width + x]`.
    data: Vec<f64>,
}

/// Unvalidated mirror that routes deserialization through shape checks, so
/// external input cannot construct a grid whose data length disagrees with
/// its extent.
#[derive(Deserialize)]
struct DenseGridRaw {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl TryFrom<DenseGridRaw> for DenseGrid {
    type Error = RasterError;

    fn try_from(raw: DenseGridRaw) -> Result<Self, Self::Error> {
        if raw.width == 0 || raw.height == 0 || raw.data.len() != raw.width * raw.height {
            return Err(RasterError::InvalidGridShape {
                width: raw.width,
                height: raw.height,
                cells: raw.data.len(),
            });
        }
        Ok(Self {
            width: raw.width,
            height: raw.height,
            data: raw.data,
        })
    }
}

impl DenseGrid {
    /// Creates a zero-filled grid of the given extent.
    ///
    /// A zero extent is clamped to 1 so the degenerate grid is always the
    /// `1x1` zero grid.
    #[must_use]
    pub fn zeros(width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Rasterizes a sparse record set into a dense grid.
    ///
    /// The extent is derived from the data: `width = max(x) + 1`,
    /// `height = max(y) + 1`. An empty record set produces the `1x1` zero
    /// grid rather than an error, so batch callers (montage panels,
    /// multi-z aggregation) need no special casing for absent slices.
    ///
    /// Records are applied in order and the last write wins on duplicate
    /// `(x, y)` cells. This is a collision policy, not an aggregation.
    ///
    /// # Example
    ///
    /// ```
    /// use occupancy_raster::{DenseGrid, LeafRecord};
    ///
    /// let grid = DenseGrid::rasterize(&[
    ///     LeafRecord::new(0, 0, 0, 2, 0.1),
    ///     LeafRecord::new(1, 0, 0, 2, 0.9),
    ///     LeafRecord::new(0, 1, 0, 2, 0.5),
    /// ]);
    /// assert_eq!(grid.width(), 2);
    /// assert_eq!(grid.height(), 2);
    /// assert_eq!(grid.get(1, 0), 0.9);
    /// assert_eq!(grid.get(1, 1), 0.0);
    /// ```
    #[must_use]
    pub fn rasterize(records: &[LeafRecord]) -> Self {
        let width = records.iter().map(|r| r.x as usize + 1).max().unwrap_or(1);
        let height = records.iter().map(|r| r.y as usize + 1).max().unwrap_or(1);
        let mut grid = Self::zeros(width, height);
        for rec in records {
            grid.set(rec.x as usize, rec.y as usize, rec.prob);
        }
        grid
    }

    /// Returns the grid width in cells.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Returns the grid height in cells.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Returns the value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        assert!(x < self.width && y < self.height, "cell out of bounds");
        self.data[y * self.width + x]
    }

    /// Sets the value at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        assert!(x < self.width && y < self.height, "cell out of bounds");
        self.data[y * self.width + x] = value;
    }

    /// Returns the row-major cell values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Returns a copy zero-padded to at least the given extent.
    ///
    /// Existing cells keep their position; new cells are `0.0`. Padding
    /// never truncates: a target extent smaller than the current one is
    /// ignored on that axis.
    #[must_use]
    pub fn padded_to(&self, width: usize, height: usize) -> Self {
        let width = width.max(self.width);
        let height = height.max(self.height);
        if width == self.width && height == self.height {
            return self.clone();
        }
        let mut out = Self::zeros(width, height);
        for y in 0..self.height {
            for x in 0..self.width {
                out.set(x, y, self.get(x, y));
            }
        }
        out
    }

    /// Returns a row-major iterator over every cell as `(x, y, value)`.
    ///
    /// `y` is the outer loop (ascending), `x` the inner loop (ascending),
    /// and every cell is visited, zero-filled ones included. This is the
    /// dense export order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, f64)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).map(move |x| (x as u32, y as u32, self.get(x, y)))
        })
    }
}
