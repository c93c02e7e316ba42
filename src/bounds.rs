//! Drawing bounds with optional percentile trimming of outliers.
//!
//! Roads that fall outside a trimmed region are not cut: they keep their full geometry and
//! run off the canvas edge, where the SVG viewport clips them.

use crate::projection::PlanarPoint;

/// Below this many points, percentile trimming is skipped and the plain extent is used.
pub const MIN_POINTS_FOR_CLIPPING: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingRegion {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingRegion {
    pub fn point(p: PlanarPoint) -> Self {
        BoundingRegion {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    /// Region covering `points`, with `clip_percentile` percent of the values cut from each
    /// edge of each axis independently. Returns `None` for an empty slice.
    pub fn from_points(points: &[PlanarPoint], clip_percentile: f64) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let percentile = if points.len() < MIN_POINTS_FOR_CLIPPING { 0.0 } else { clip_percentile };

        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        let (min_x, max_x) = percentile_range(xs, percentile);
        let (min_y, max_y) = percentile_range(ys, percentile);

        Some(BoundingRegion { min_x, min_y, max_x, max_y })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, p: PlanarPoint) -> bool {
        (self.min_x..=self.max_x).contains(&p.x) && (self.min_y..=self.max_y).contains(&p.y)
    }
}

/// The `percentile`-th and `(100 - percentile)`-th values of a non-empty sample.
/// With `percentile == 0` this is the plain minimum and maximum.
pub fn percentile_range(mut values: Vec<f64>, percentile: f64) -> (f64, f64) {
    debug_assert!(!values.is_empty());
    values.sort_by(f64::total_cmp);
    let n = values.len();
    let low_idx = (n as f64 * percentile / 100.0).floor() as usize;
    let high_idx = ((n as f64 * (100.0 - percentile) / 100.0).floor() as usize).saturating_sub(1);

    let high_idx = high_idx.min(n - 1);
    let low_idx = low_idx.min(high_idx);
    (values[low_idx], values[high_idx])
}
