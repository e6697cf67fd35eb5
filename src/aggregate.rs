//! Reduction of per-z slice grids over an inclusive z range.

use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RasterError, RasterResult};
use crate::grid::DenseGrid;
use crate::leaf::LeafTable;

/// Elementwise reduction applied across a stack of per-z grids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    /// Elementwise maximum across the stack.
    #[default]
    Max,
    /// Elementwise arithmetic mean across the stack. A voxel absent from a
    /// slice counts as probability `0.0` in that slice's contribution, not
    /// as excluded from the average.
    Mean,
}

impl AggregateOp {
    /// Returns the operator's canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Mean => "mean",
        }
    }
}

impl FromStr for AggregateOp {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(Self::Max),
            "mean" => Ok(Self::Mean),
            other => Err(RasterError::UnknownOp {
                name: other.to_string(),
            }),
        }
    }
}

/// Reduces the slices in `zmin..=zmax` into a single grid.
///
/// Each z index in the inclusive range is filtered and rasterized
/// independently (in parallel), every per-z grid is zero-padded to the union
/// bounding box of the stack, and the stack is then reduced elementwise with
/// `op`. Differing slice extents are never truncated.
///
/// An inverted range (`zmin > zmax`) yields an empty stack and therefore the
/// degenerate `1x1` zero grid, consistent with rasterizing an empty record
/// set.
///
/// Returns the reduced grid together with the resolved depth.
///
/// # Errors
///
/// Returns [`RasterError::EmptyInput`] when `depth` is `None` and the table
/// is empty, since no default depth can be resolved.
///
/// # Example
///
/// ```
/// use occupancy_raster::{aggregate, AggregateOp, LeafRecord, LeafTable};
///
/// let table = LeafTable::from_records(vec![
///     LeafRecord::new(0, 0, 0, 2, 0.2),
///     LeafRecord::new(0, 0, 1, 2, 0.8),
/// ]);
///
/// let (grid, depth) = aggregate(&table, None, (0, 1), AggregateOp::Max).unwrap();
/// assert_eq!(depth, 2);
/// assert_eq!(grid.get(0, 0), 0.8);
/// ```
pub fn aggregate(
    table: &LeafTable,
    depth: Option<u32>,
    z_range: (u32, u32),
    op: AggregateOp,
) -> RasterResult<(DenseGrid, u32)> {
    let depth = table.resolve_depth(depth)?;
    let (zmin, zmax) = z_range;
    let zs: Vec<u32> = if zmin <= zmax {
        (zmin..=zmax).collect()
    } else {
        Vec::new()
    };
    debug!(depth, zmin, zmax, op = op.name(), "aggregating z range");

    let stack: Vec<DenseGrid> = zs
        .par_iter()
        .map(|&z| DenseGrid::rasterize(table.filter(depth, Some(&[z])).records()))
        .collect();

    Ok((reduce_stack(&stack, op), depth))
}

/// Pads a stack of grids to their union bounding box and reduces it.
fn reduce_stack(stack: &[DenseGrid], op: AggregateOp) -> DenseGrid {
    if stack.is_empty() {
        return DenseGrid::zeros(1, 1);
    }
    let width = stack.iter().map(DenseGrid::width).max().unwrap_or(1);
    let height = stack.iter().map(DenseGrid::height).max().unwrap_or(1);

    let mut out = DenseGrid::zeros(width, height);
    for grid in stack {
        let padded = grid.padded_to(width, height);
        for (x, y, value) in padded.cells() {
            let (x, y) = (x as usize, y as usize);
            match op {
                AggregateOp::Max => out.set(x, y, out.get(x, y).max(value)),
                AggregateOp::Mean => out.set(x, y, out.get(x, y) + value),
            }
        }
    }
    if op == AggregateOp::Mean {
        #[allow(clippy::cast_precision_loss)]
        let n = stack.len() as f64;
        for y in 0..height {
            for x in 0..width {
                out.set(x, y, out.get(x, y) / n);
            }
        }
    }
    out
}
