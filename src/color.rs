//! Colors, named colormaps, and the continuous/banded color scale.

// Channel math stays within u8 range by construction.
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bands::BandSpec;
use crate::error::{RasterError, RasterResult};

/// Names of the supported colormaps, in registry order.
pub const COLORMAP_NAMES: &[&str] = &[
    "viridis", "magma", "inferno", "plasma", "cividis", "greens", "reds", "greys",
];

/// An 8-bit RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel, 255 = opaque.
    pub a: u8,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Creates a pixel from explicit channels.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Creates an opaque pixel.
    #[must_use]
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Returns this pixel with its alpha scaled by `alpha` in `[0, 1]`.
    #[must_use]
    pub fn with_alpha(self, alpha: f64) -> Self {
        let a = (f64::from(self.a) * alpha.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Straight (non-premultiplied) alpha compositing of `self` over `dst`.
    ///
    /// The destination's color contribution is weighted by its own alpha,
    /// so a transparent destination never bleeds its channels into the
    /// result.
    #[must_use]
    pub fn over(self, dst: Self) -> Self {
        let sa = f64::from(self.a) / 255.0;
        let da = f64::from(dst.a) / 255.0;
        let out_a = da.mul_add(1.0 - sa, sa);
        if out_a <= 0.0 {
            return Self::TRANSPARENT;
        }
        let blend = |s: u8, d: u8| {
            let c = f64::from(s).mul_add(sa, f64::from(d) * da * (1.0 - sa)) / out_a;
            c.round() as u8
        };
        Self {
            r: blend(self.r, dst.r),
            g: blend(self.g, dst.g),
            b: blend(self.b, dst.b),
            a: (out_a * 255.0).round() as u8,
        }
    }
}

/// Linear interpolation between two control points.
fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    f64::from(a).mul_add(1.0 - t, f64::from(b) * t).round() as u8
}

/// A named color palette sampled by piecewise-linear interpolation over
/// fixed control points.
///
/// # Example
///
/// ```
/// use occupancy_raster::Colormap;
///
/// let cmap: Colormap = "viridis".parse().unwrap();
/// let low = cmap.sample(0.0);
/// let high = cmap.sample(1.0);
/// assert_ne!(low, high);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Perceptually uniform purple-to-yellow ramp.
    Viridis,
    /// Black-purple-orange-light ramp.
    Magma,
    /// Black-red-yellow heat ramp.
    Inferno,
    /// Blue-magenta-yellow ramp.
    Plasma,
    /// Color-vision-deficiency-friendly blue-to-yellow ramp.
    Cividis,
    /// Sequential light-to-dark greens.
    Greens,
    /// Sequential light-to-dark reds.
    Reds,
    /// Sequential white-to-black greys.
    Greys,
}

impl Colormap {
    /// Resolves a colormap by name.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::UnknownColormap`] (listing the supported
    /// names) for anything outside the registry.
    pub fn from_name(name: &str) -> RasterResult<Self> {
        match name {
            "viridis" => Ok(Self::Viridis),
            "magma" => Ok(Self::Magma),
            "inferno" => Ok(Self::Inferno),
            "plasma" => Ok(Self::Plasma),
            "cividis" => Ok(Self::Cividis),
            "greens" => Ok(Self::Greens),
            "reds" => Ok(Self::Reds),
            "greys" => Ok(Self::Greys),
            other => Err(RasterError::UnknownColormap {
                name: other.to_string(),
                supported: COLORMAP_NAMES.join(", "),
            }),
        }
    }

    /// Returns the palette's control points, low to high.
    const fn control_points(self) -> &'static [(u8, u8, u8)] {
        match self {
            Self::Viridis => &[
                (68, 1, 84),
                (71, 44, 122),
                (59, 81, 139),
                (44, 113, 142),
                (33, 144, 141),
                (39, 173, 129),
                (92, 200, 99),
                (170, 220, 50),
                (253, 231, 37),
            ],
            Self::Magma => &[
                (0, 0, 4),
                (28, 16, 68),
                (79, 18, 123),
                (129, 37, 129),
                (181, 54, 122),
                (229, 80, 100),
                (251, 135, 97),
                (254, 194, 135),
                (252, 253, 191),
            ],
            Self::Inferno => &[
                (0, 0, 4),
                (31, 12, 72),
                (85, 15, 109),
                (136, 34, 106),
                (186, 54, 85),
                (227, 89, 51),
                (249, 140, 10),
                (249, 201, 50),
                (252, 255, 164),
            ],
            Self::Plasma => &[
                (13, 8, 135),
                (84, 2, 163),
                (139, 10, 165),
                (185, 50, 137),
                (219, 92, 104),
                (244, 136, 73),
                (254, 188, 43),
                (240, 249, 33),
            ],
            Self::Cividis => &[
                (0, 32, 76),
                (0, 42, 102),
                (40, 60, 101),
                (86, 84, 103),
                (117, 107, 112),
                (148, 130, 120),
                (184, 156, 118),
                (219, 183, 107),
                (255, 234, 70),
            ],
            Self::Greens => &[
                (247, 252, 245),
                (229, 245, 224),
                (199, 233, 192),
                (161, 217, 155),
                (116, 196, 118),
                (65, 171, 93),
                (35, 139, 69),
                (0, 109, 44),
                (0, 68, 27),
            ],
            Self::Reds => &[
                (255, 245, 240),
                (254, 224, 210),
                (252, 187, 161),
                (252, 146, 114),
                (251, 106, 74),
                (239, 59, 44),
                (203, 24, 29),
                (165, 15, 21),
                (103, 0, 13),
            ],
            Self::Greys => &[
                (255, 255, 255),
                (217, 217, 217),
                (189, 189, 189),
                (150, 150, 150),
                (115, 115, 115),
                (82, 82, 82),
                (37, 37, 37),
                (0, 0, 0),
            ],
        }
    }

    /// Samples the palette at `t`, clamped to `[0, 1]`.
    #[must_use]
    pub fn sample(self, t: f64) -> Rgba {
        let points = self.control_points();
        let t = t.clamp(0.0, 1.0);
        #[allow(clippy::cast_precision_loss)]
        let x = t * (points.len() - 1) as f64;
        let i = (x.floor() as usize).min(points.len() - 2);
        #[allow(clippy::cast_precision_loss)]
        let f = x - i as f64;
        let (r0, g0, b0) = points[i];
        let (r1, g1, b1) = points[i + 1];
        Rgba::opaque(
            lerp_channel(r0, r1, f),
            lerp_channel(g0, g1, f),
            lerp_channel(b0, b1, f),
        )
    }

    /// Samples one of `n` discrete colors, taken at bin centers.
    ///
    /// Matches the look of a continuous palette resampled down to `n`
    /// entries: band `i` of `n` gets the color at `(i + 0.5) / n`.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0` or `i >= n`.
    #[must_use]
    pub fn sample_discrete(self, n: usize, i: usize) -> Rgba {
        assert!(n > 0 && i < n, "discrete sample out of range");
        #[allow(clippy::cast_precision_loss)]
        self.sample((i as f64 + 0.5) / n as f64)
    }
}

impl FromStr for Colormap {
    type Err = RasterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// How cell values are turned into colors: a continuous palette or a banded
/// scale with one fixed color per band.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorScale {
    /// Continuous mapping of the value (clamped to `[0, 1]`) through a
    /// palette.
    Continuous(Colormap),
    /// Discrete mapping through a band spec, one color per band.
    Banded {
        /// Boundaries and labels of the bands.
        spec: BandSpec,
        /// One color per band, in band order.
        colors: Vec<Rgba>,
    },
}

impl ColorScale {
    /// Builds a banded scale by resampling a palette to one color per band.
    #[must_use]
    pub fn banded(spec: BandSpec, cmap: Colormap) -> Self {
        let n = spec.band_count();
        let colors = (0..n).map(|i| cmap.sample_discrete(n, i)).collect();
        Self::Banded { spec, colors }
    }

    /// Builds the banded scale of a named preset, with its listed colors.
    ///
    /// `occ3` and `occ5` carry hand-picked band colors; `occ_heat` uses the
    /// inferno palette discretized to its four bands.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError::UnknownPreset`] for names outside the
    /// registry.
    pub fn preset(name: &str) -> RasterResult<Self> {
        let spec = BandSpec::preset(name)?;
        let colors = match name {
            "occ3" => vec![
                Rgba::opaque(0x2c, 0x7f, 0xb8),
                Rgba::opaque(0xbd, 0xbd, 0xbd),
                Rgba::opaque(0xd7, 0x30, 0x1f),
            ],
            "occ5" => vec![
                Rgba::opaque(0x08, 0x40, 0x81),
                Rgba::opaque(0x4e, 0xb3, 0xd3),
                Rgba::opaque(0xbd, 0xbd, 0xbd),
                Rgba::opaque(0xfd, 0xae, 0x61),
                Rgba::opaque(0xd7, 0x30, 0x1f),
            ],
            _ => {
                let n = spec.band_count();
                (0..n).map(|i| Colormap::Inferno.sample_discrete(n, i)).collect()
            }
        };
        Ok(Self::Banded { spec, colors })
    }

    /// Maps a cell value to its color.
    #[must_use]
    pub fn color_for(&self, value: f64) -> Rgba {
        match self {
            Self::Continuous(cmap) => cmap.sample(value),
            Self::Banded { spec, colors } => colors[spec.classify(value)],
        }
    }

    /// Returns the band spec when the scale is banded.
    #[must_use]
    pub fn bands(&self) -> Option<&BandSpec> {
        match self {
            Self::Continuous(_) => None,
            Self::Banded { spec, .. } => Some(spec),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_colormap_lists_supported() {
        let err = Colormap::from_name("jet").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("jet"));
        assert!(msg.contains("viridis"));
        assert!(msg.contains("greys"));
    }

    #[test]
    fn test_sample_endpoints() {
        let cmap = Colormap::Viridis;
        assert_eq!(cmap.sample(0.0), Rgba::opaque(68, 1, 84));
        assert_eq!(cmap.sample(1.0), Rgba::opaque(253, 231, 37));
    }

    #[test]
    fn test_sample_clamps() {
        let cmap = Colormap::Magma;
        assert_eq!(cmap.sample(-2.0), cmap.sample(0.0));
        assert_eq!(cmap.sample(5.0), cmap.sample(1.0));
    }

    #[test]
    fn test_sample_discrete_bin_centers() {
        let cmap = Colormap::Greys;
        assert_eq!(cmap.sample_discrete(2, 0), cmap.sample(0.25));
        assert_eq!(cmap.sample_discrete(2, 1), cmap.sample(0.75));
    }

    #[test]
    fn test_over_opaque_src_replaces() {
        let src = Rgba::opaque(10, 20, 30);
        let dst = Rgba::opaque(200, 200, 200);
        assert_eq!(src.over(dst), src);
    }

    #[test]
    fn test_over_transparent_dst_keeps_src_color() {
        let src = Rgba::opaque(200, 40, 40).with_alpha(0.5);
        // Transparent destination: its channels must not bleed through.
        let dst = Rgba::new(0, 255, 0, 0);
        let out = src.over(dst);
        assert_eq!((out.r, out.g, out.b), (200, 40, 40));
        assert_eq!(out.a, src.a);
    }

    #[test]
    fn test_over_fully_transparent_both() {
        let out = Rgba::TRANSPARENT.over(Rgba::new(10, 20, 30, 0));
        assert_eq!(out, Rgba::TRANSPARENT);
    }

    #[test]
    fn test_over_half_alpha_blends() {
        let src = Rgba::opaque(100, 100, 100).with_alpha(0.5);
        let dst = Rgba::opaque(0, 0, 0);
        let out = src.over(dst);
        assert!(out.r > 45 && out.r < 55);
        assert_eq!(out.a, 255);
    }

    #[test]
    fn test_preset_scale_colors() {
        let scale = ColorScale::preset("occ3").unwrap();
        assert_eq!(scale.color_for(0.1), Rgba::opaque(0x2c, 0x7f, 0xb8));
        assert_eq!(scale.color_for(0.9), Rgba::opaque(0xd7, 0x30, 0x1f));
        assert_eq!(scale.color_for(0.6), Rgba::opaque(0xbd, 0xbd, 0xbd));
    }

    #[test]
    fn test_banded_scale_from_explicit_boundaries() {
        let spec = BandSpec::from_boundaries(vec![0.0, 0.5, 1.0]).unwrap();
        let scale = ColorScale::banded(spec, Colormap::Viridis);
        assert_eq!(scale.color_for(0.2), Colormap::Viridis.sample_discrete(2, 0));
        assert_eq!(scale.color_for(0.8), Colormap::Viridis.sample_discrete(2, 1));
    }
}
