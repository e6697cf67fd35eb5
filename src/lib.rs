//! Rasterization and 2D view compositing for sparse multi-resolution
//! occupancy leaves.
//!
//! An external octree hierarchy builder emits sparse leaf records — voxel
//! coordinates, an octree depth, and an occupancy probability. This crate
//! turns those records into dense 2D grids and inspection views:
//!
//! - **Slices**: a single z layer rasterized into a grid
//! - **Projections**: a z range reduced with max or mean
//! - **Band classification**: probabilities bucketed into labeled bands
//!   (free / unknown / occupied and friends)
//! - **Montages**: one panel per z index, arranged row-major
//! - **Overlays**: two datasets alpha-blended at the same slice
//! - **Grid export**: a rendered grid written back to dense tabular form
//!
//! Rendering stops at a color [`PixelBuffer`] plus legend metadata;
//! encoding to PNG or any other image format is a downstream concern.
//!
//! # Layer 0 Crate
//!
//! This crate has **zero GUI or GPU dependencies**. It can be used in:
//! - CLI tools
//! - Servers
//! - Batch pipelines
//! - Python bindings
//!
//! # Example
//!
//! ```
//! use occupancy_raster::{
//!     render_slice, ColorScale, LeafRecord, LeafTable, SliceStyle,
//! };
//!
//! let table = LeafTable::from_records(vec![
//!     LeafRecord::new(0, 0, 0, 2, 0.1),
//!     LeafRecord::new(1, 0, 0, 2, 0.9),
//!     LeafRecord::new(0, 1, 0, 2, 0.5),
//! ]);
//!
//! let style = SliceStyle {
//!     color: ColorScale::preset("occ3").unwrap(),
//!     ..SliceStyle::default()
//! };
//! let view = render_slice(&table, 0, None, &style).unwrap();
//! assert_eq!(view.depth, 2);
//! ```
//!
//! # Grid Convention
//!
//! Grids are indexed `[row = y][col = x]` with extents derived from the
//! data (`max + 1` per axis). Cells start at `0.0`, so an untouched cell is
//! indistinguishable from an explicit zero-probability record; that is a
//! convention of the format, not an "unknown" marker. Empty inputs
//! degenerate to a `1x1` zero grid instead of failing, so batch views
//! tolerate absent z layers.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod aggregate;
mod bands;
mod color;
mod error;
mod export;
mod grid;
mod leaf;
mod render;

pub use aggregate::{aggregate, AggregateOp};
pub use bands::{BandSpec, PRESET_NAMES};
pub use color::{ColorScale, Colormap, Rgba, COLORMAP_NAMES};
pub use error::{RasterError, RasterResult};
pub use export::{export_slice_grid, grid_rows, write_grid_csv, GridRow};
pub use grid::DenseGrid;
pub use leaf::{LeafRecord, LeafTable};
pub use render::{
    render_grid, render_montage, render_overlay, render_projection, render_slice, LegendEntry,
    MontageStyle, OverlayStyle, PixelBuffer, RenderStyle, RenderedView, SliceStyle, ZSelection,
};
