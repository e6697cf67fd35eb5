//! Pure compositing of grids into color pixel buffers.
//!
//! Three view modes: a single z slice, a reduced z-range projection, a
//! multi-panel montage, and a two-source alpha overlay. All of them are
//! pure functions from grids plus style parameters to a [`PixelBuffer`];
//! encoding the buffer to PNG or any other file format is a downstream
//! concern and deliberately absent here.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{aggregate, AggregateOp};
use crate::color::{ColorScale, Colormap, Rgba};
use crate::error::{RasterError, RasterResult};
use crate::grid::DenseGrid;
use crate::leaf::LeafTable;

/// Grid-line overlay color: white at half opacity, drawn over cell colors.
const GRID_LINE_COLOR: Rgba = Rgba::new(255, 255, 255, 128);

/// A dense row-major buffer of color pixels.
///
/// Row 0 corresponds to cell row `y = 0`; an encoder that wants image
/// coordinates with the origin at the top-left can flip rows without any
/// information loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgba>,
}

impl PixelBuffer {
    /// Creates a buffer filled with a single color.
    #[must_use]
    pub fn filled(width: usize, height: usize, fill: Rgba) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        Self {
            width,
            height,
            pixels: vec![fill; width * height],
        }
    }

    /// Returns the buffer width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Returns the buffer height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major pixel data.
    #[must_use]
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Returns the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> Rgba {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.pixels[y * self.width + x]
    }

    /// Sets the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.pixels[y * self.width + x] = color;
    }

    /// Composites `color` over the existing pixel at `(x, y)`.
    fn blend_pixel(&mut self, x: usize, y: usize, color: Rgba) {
        let dst = self.pixel(x, y);
        self.set_pixel(x, y, color.over(dst));
    }

    /// Copies `src` into this buffer with its top-left corner at `(x0, y0)`.
    ///
    /// # Panics
    ///
    /// Panics if `src` does not fit at that position.
    pub fn blit(&mut self, src: &Self, x0: usize, y0: usize) {
        assert!(
            x0 + src.width <= self.width && y0 + src.height <= self.height,
            "blit out of bounds"
        );
        for y in 0..src.height {
            for x in 0..src.width {
                self.set_pixel(x0 + x, y0 + y, src.pixel(x, y));
            }
        }
    }
}

/// Which z layers a rendered view covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZSelection {
    /// A single slice.
    Single(u32),
    /// An inclusive range, reduced to one grid.
    Range(u32, u32),
    /// An explicit ordered list, one panel each.
    List(Vec<u32>),
}

/// One band of a legend: its value range and label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    /// Inclusive lower boundary of the band.
    pub lo: f64,
    /// Upper boundary (exclusive, except for the last band).
    pub hi: f64,
    /// Band label.
    pub label: String,
}

/// A rendered view: the pixel buffer plus the metadata an encoder needs to
/// caption it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedView {
    /// The color-mapped pixels.
    pub buffer: PixelBuffer,
    /// The depth that was rendered (resolved when the request left it open).
    pub depth: u32,
    /// The z layers covered.
    pub z: ZSelection,
    /// The reduction operator, for projection views.
    pub op: Option<AggregateOp>,
    /// Ordered band legend, present when a banded scale was used and the
    /// style asked for a legend.
    pub legend: Option<Vec<LegendEntry>>,
}

/// Style parameters shared by every render mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    /// Square pixels per grid cell. Must be >= 1.
    pub scale: usize,
    /// Draw 1-px cell boundary markers over the cells. Suppressed below
    /// 2 px/cell, where the line would cover the whole cell.
    pub grid_lines: bool,
    /// Emit a band legend in the view metadata. Ignored for continuous
    /// scales, which have no bands to list.
    pub legend: bool,
    /// Fill color for pixels no panel covers.
    pub background: Rgba,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            scale: 8,
            grid_lines: false,
            legend: false,
            background: Rgba::TRANSPARENT,
        }
    }
}

/// Style for single-slice and projection views.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceStyle {
    /// Continuous or banded color scale.
    pub color: ColorScale,
    /// Shared style parameters.
    pub base: RenderStyle,
}

impl Default for SliceStyle {
    fn default() -> Self {
        Self {
            color: ColorScale::Continuous(Colormap::Viridis),
            base: RenderStyle::default(),
        }
    }
}

/// Style for montage views.
#[derive(Debug, Clone, PartialEq)]
pub struct MontageStyle {
    /// Continuous palette applied to every panel over the fixed `[0, 1]`
    /// range.
    pub colormap: Colormap,
    /// Number of layout columns. Clamped to at least 1.
    pub ncols: usize,
    /// Shared style parameters.
    pub base: RenderStyle,
}

impl Default for MontageStyle {
    fn default() -> Self {
        Self {
            colormap: Colormap::Viridis,
            ncols: 4,
            base: RenderStyle::default(),
        }
    }
}

/// Style for two-source overlay views.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    /// Palette for the first (lower) grid.
    pub colormap_a: Colormap,
    /// Palette for the second (upper) grid.
    pub colormap_b: Colormap,
    /// Blend weight of the first grid, in `[0, 1]`.
    pub alpha_a: f64,
    /// Blend weight of the second grid, in `[0, 1]`.
    pub alpha_b: f64,
    /// Shared style parameters.
    pub base: RenderStyle,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            colormap_a: Colormap::Greens,
            colormap_b: Colormap::Reds,
            alpha_a: 0.6,
            alpha_b: 0.6,
            base: RenderStyle::default(),
        }
    }
}

impl OverlayStyle {
    fn validate(&self) -> RasterResult<()> {
        for alpha in [self.alpha_a, self.alpha_b] {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(RasterError::AlphaOutOfRange { value: alpha });
            }
        }
        Ok(())
    }
}

/// Colorizes a grid through a scale into a pixel buffer.
///
/// Each cell becomes a `scale x scale` block; continuous scales clamp the
/// cell value to `[0, 1]`, banded scales paint the band color. Grid-line
/// markers are drawn on top when requested.
#[must_use]
pub fn render_grid(grid: &DenseGrid, color: &ColorScale, style: &RenderStyle) -> PixelBuffer {
    let scale = style.scale.max(1);
    let mut buf = PixelBuffer::filled(
        grid.width() * scale,
        grid.height() * scale,
        style.background,
    );
    for (x, y, value) in grid.cells() {
        let pixel = color.color_for(value);
        let (x, y) = (x as usize, y as usize);
        for dy in 0..scale {
            for dx in 0..scale {
                buf.set_pixel(x * scale + dx, y * scale + dy, pixel);
            }
        }
    }
    if style.grid_lines && scale >= 2 {
        draw_grid_lines(&mut buf, grid.width(), grid.height(), scale);
    }
    buf
}

/// Blends 1-px cell boundary lines over a colorized panel.
fn draw_grid_lines(buf: &mut PixelBuffer, cells_w: usize, cells_h: usize, scale: usize) {
    for cx in 0..=cells_w {
        let x = (cx * scale).min(buf.width() - 1);
        for y in 0..buf.height() {
            buf.blend_pixel(x, y, GRID_LINE_COLOR);
        }
    }
    for cy in 0..=cells_h {
        let y = (cy * scale).min(buf.height() - 1);
        for x in 0..buf.width() {
            // Corners already hold one line pass; blending twice there is
            // the same on every run, so determinism holds.
            buf.blend_pixel(x, y, GRID_LINE_COLOR);
        }
    }
}

/// Builds the legend metadata for a view, when the style asks for one and
/// the scale is banded.
fn legend_for(color: &ColorScale, style: &RenderStyle) -> Option<Vec<LegendEntry>> {
    if !style.legend {
        return None;
    }
    color.bands().map(|spec| {
        spec.ranges()
            .into_iter()
            .map(|(lo, hi, label)| LegendEntry {
                lo,
                hi,
                label: label.to_string(),
            })
            .collect()
    })
}

/// Renders a single z slice of a leaf table.
///
/// Filters to the resolved depth and the requested z, rasterizes, and
/// colorizes. A z absent from the data renders as the `1x1` zero grid.
///
/// # Errors
///
/// Returns [`RasterError::EmptyInput`] when `depth` is `None` and the table
/// is empty.
///
/// # Example
///
/// ```
/// use occupancy_raster::{render_slice, LeafRecord, LeafTable, SliceStyle};
///
/// let table = LeafTable::from_records(vec![
///     LeafRecord::new(0, 0, 0, 2, 0.1),
///     LeafRecord::new(1, 0, 0, 2, 0.9),
/// ]);
///
/// let view = render_slice(&table, 0, None, &SliceStyle::default()).unwrap();
/// assert_eq!(view.depth, 2);
/// assert_eq!(view.buffer.width(), 2 * 8); // two cells at the default scale
/// ```
pub fn render_slice(
    table: &LeafTable,
    z: u32,
    depth: Option<u32>,
    style: &SliceStyle,
) -> RasterResult<RenderedView> {
    let depth = table.resolve_depth(depth)?;
    let grid = DenseGrid::rasterize(table.filter(depth, Some(&[z])).records());
    info!(z, depth, width = grid.width(), height = grid.height(), "rendered slice");
    Ok(RenderedView {
        legend: legend_for(&style.color, &style.base),
        buffer: render_grid(&grid, &style.color, &style.base),
        depth,
        z: ZSelection::Single(z),
        op: None,
    })
}

/// Renders a reduced projection of an inclusive z range.
///
/// Aggregates the range with `op` (see [`aggregate`]) and colorizes the
/// result. The view metadata records the range and the operator.
///
/// # Errors
///
/// Returns [`RasterError::EmptyInput`] when `depth` is `None` and the table
/// is empty.
pub fn render_projection(
    table: &LeafTable,
    z_range: (u32, u32),
    depth: Option<u32>,
    op: AggregateOp,
    style: &SliceStyle,
) -> RasterResult<RenderedView> {
    let (grid, depth) = aggregate(table, depth, z_range, op)?;
    info!(
        zmin = z_range.0,
        zmax = z_range.1,
        depth,
        op = op.name(),
        "rendered projection"
    );
    Ok(RenderedView {
        legend: legend_for(&style.color, &style.base),
        buffer: render_grid(&grid, &style.color, &style.base),
        depth,
        z: ZSelection::Range(z_range.0, z_range.1),
        op: Some(op),
    })
}

/// Renders one panel per z index, arranged row-major into `ncols` columns.
///
/// Panels are rasterized and colorized independently (in parallel) and
/// placed in the exact input order: panel `i` occupies row `i / ncols`,
/// column `i % ncols`. Trailing unused layout slots stay background.
/// Every panel slot has the extent of the largest panel; smaller panels
/// align to their slot's top-left corner.
///
/// # Errors
///
/// Returns [`RasterError::EmptyInput`] when `depth` is `None` and the table
/// is empty.
pub fn render_montage(
    table: &LeafTable,
    zs: &[u32],
    depth: Option<u32>,
    style: &MontageStyle,
) -> RasterResult<RenderedView> {
    let depth = table.resolve_depth(depth)?;
    let scale = ColorScale::Continuous(style.colormap);

    let panels: Vec<PixelBuffer> = zs
        .par_iter()
        .map(|&z| {
            let grid = DenseGrid::rasterize(table.filter(depth, Some(&[z])).records());
            render_grid(&grid, &scale, &style.base)
        })
        .collect();

    let ncols = style.ncols.max(1);
    let nrows = zs.len().div_ceil(ncols).max(1);
    let slot_w = panels.iter().map(PixelBuffer::width).max().unwrap_or(1);
    let slot_h = panels.iter().map(PixelBuffer::height).max().unwrap_or(1);

    let mut buf = PixelBuffer::filled(ncols * slot_w, nrows * slot_h, style.base.background);
    for (i, panel) in panels.iter().enumerate() {
        let row = i / ncols;
        let col = i % ncols;
        buf.blit(panel, col * slot_w, row * slot_h);
    }
    info!(panels = zs.len(), ncols, nrows, depth, "rendered montage");

    Ok(RenderedView {
        buffer: buf,
        depth,
        z: ZSelection::List(zs.to_vec()),
        op: None,
        legend: None,
    })
}

/// Renders two independently sourced tables at the same z, alpha-blended.
///
/// Both tables are filtered and rasterized on their own; the canvas is the
/// union of the two bounding boxes (neither source is truncated). The first
/// grid is painted over the background with `alpha_a`, then the second over
/// that with `alpha_b` — straight alpha compositing in both steps. The
/// reported depth is the first table's resolved depth.
///
/// # Errors
///
/// Returns [`RasterError::AlphaOutOfRange`] for blend weights outside
/// `[0, 1]`, and [`RasterError::EmptyInput`] when `depth` is `None` and
/// either table is empty.
pub fn render_overlay(
    table_a: &LeafTable,
    table_b: &LeafTable,
    z: u32,
    depth: Option<u32>,
    style: &OverlayStyle,
) -> RasterResult<RenderedView> {
    style.validate()?;
    let depth_a = table_a.resolve_depth(depth)?;
    let depth_b = table_b.resolve_depth(depth)?;
    let grid_a = DenseGrid::rasterize(table_a.filter(depth_a, Some(&[z])).records());
    let grid_b = DenseGrid::rasterize(table_b.filter(depth_b, Some(&[z])).records());

    let width = grid_a.width().max(grid_b.width());
    let height = grid_a.height().max(grid_b.height());
    let grid_a = grid_a.padded_to(width, height);
    let grid_b = grid_b.padded_to(width, height);

    let pixel_scale = style.base.scale.max(1);
    let mut buf = PixelBuffer::filled(
        width * pixel_scale,
        height * pixel_scale,
        style.base.background,
    );
    for y in 0..height {
        for x in 0..width {
            let a = style
                .colormap_a
                .sample(grid_a.get(x, y))
                .with_alpha(style.alpha_a);
            let b = style
                .colormap_b
                .sample(grid_b.get(x, y))
                .with_alpha(style.alpha_b);
            let color = b.over(a.over(style.base.background));
            for dy in 0..pixel_scale {
                for dx in 0..pixel_scale {
                    buf.set_pixel(x * pixel_scale + dx, y * pixel_scale + dy, color);
                }
            }
        }
    }
    if style.base.grid_lines && pixel_scale >= 2 {
        draw_grid_lines(&mut buf, width, height, pixel_scale);
    }
    info!(z, depth = depth_a, width, height, "rendered overlay");

    Ok(RenderedView {
        buffer: buf,
        depth: depth_a,
        z: ZSelection::Single(z),
        op: None,
        legend: None,
    })
}
