//! Geographic to canvas coordinates.
//!
//! Longitude maps linearly to x and latitude to y, with x shrunk by the cosine of the mean
//! latitude so that east-west distances keep roughly their true proportion. This is a local
//! approximation: it holds for city-sized extracts (tens of km) and distorts anything
//! spanning countries or continents.

use crate::bounds::BoundingRegion;
use crate::data::semantic::MapCoords;

/// Extent substituted for a region that collapsed to a single point.
pub const MIN_EXTENT: f64 = 1.0;

/// Projected, unscaled coordinates. `y` grows northwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
}

/// Final drawing coordinates, origin top-left, `y` growing downwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarProjection {
    mean_latitude: f64,
    x_scale: f64,
}

impl PlanarProjection {
    /// Projection centred on the mean latitude of `coords`. An empty set projects around
    /// the equator.
    pub fn from_coords<I>(coords: I) -> Self
    where
        I: IntoIterator<Item = MapCoords>,
    {
        let (sum, count) = coords
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), c| (sum + c.lat, count + 1));
        let mean_latitude = if count == 0 { 0.0 } else { sum / count as f64 };
        PlanarProjection {
            mean_latitude,
            x_scale: mean_latitude.to_radians().cos(),
        }
    }

    pub fn mean_latitude(&self) -> f64 {
        self.mean_latitude
    }

    pub fn project(&self, coords: MapCoords) -> PlanarPoint {
        PlanarPoint {
            x: coords.lon * self.x_scale,
            y: coords.lat,
        }
    }
}

/// Uniform scale and offset taking a planar region onto the canvas, aspect ratio preserved
/// and content centred inside the padding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    region: BoundingRegion,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
    width: u32,
    height: u32,
}

impl CanvasTransform {
    /// Fits `region` into a `width` wide canvas. With `height == None` the height follows
    /// the region's aspect ratio.
    pub fn fit(region: BoundingRegion, width: u32, height: Option<u32>, padding: f64) -> Self {
        let extent_x = region.width();
        let extent_y = region.height();
        let usable_width = (width as f64 - 2.0 * padding).max(0.0);

        let height = height.unwrap_or_else(|| {
            if extent_x > 0.0 {
                let auto = 2.0 * padding + extent_y * usable_width / extent_x;
                (auto.round() as u32).max(1)
            } else {
                width
            }
        });
        let usable_height = (height as f64 - 2.0 * padding).max(0.0);

        // An axis with no extent does not constrain the scale, it only gets centred.
        let scale = match (extent_x > 0.0, extent_y > 0.0) {
            (true, true) => (usable_width / extent_x).min(usable_height / extent_y),
            (true, false) => usable_width / extent_x,
            (false, true) => usable_height / extent_y,
            (false, false) => usable_width.min(usable_height) / MIN_EXTENT,
        };

        CanvasTransform {
            region,
            scale,
            offset_x: padding + (usable_width - extent_x * scale) / 2.0,
            offset_y: padding + (usable_height - extent_y * scale) / 2.0,
            width,
            height,
        }
    }

    pub fn to_canvas(&self, p: PlanarPoint) -> CanvasPoint {
        CanvasPoint {
            x: self.offset_x + (p.x - self.region.min_x) * self.scale,
            y: self.offset_y + (self.region.max_y - p.y) * self.scale,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn canvas_width(&self) -> u32 {
        self.width
    }

    pub fn canvas_height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(lat: f64, lon: f64) -> MapCoords {
        MapCoords { lat, lon }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }

    #[test]
    fn shrinks_longitude_by_mean_latitude() {
        let projection = PlanarProjection::from_coords([coords(59.0, 10.0), coords(61.0, 11.0)]);
        assert_close(projection.mean_latitude(), 60.0);
        let p = projection.project(coords(60.0, 10.0));
        assert_close(p.x, 5.0);
        assert_close(p.y, 60.0);
    }

    #[test]
    fn equator_projection_is_identity() {
        let projection = PlanarProjection::from_coords(Vec::new());
        let p = projection.project(coords(-3.0, 7.0));
        assert_eq!(p, PlanarPoint { x: 7.0, y: -3.0 });
    }

    #[test]
    fn north_is_up_and_region_fills_width() {
        let region = BoundingRegion { min_x: 0.0, min_y: 0.0, max_x: 2.0, max_y: 1.0 };
        let transform = CanvasTransform::fit(region, 220, None, 10.0);
        assert_eq!(transform.canvas_height(), 120);

        let top_left = transform.to_canvas(PlanarPoint { x: 0.0, y: 1.0 });
        let bottom_right = transform.to_canvas(PlanarPoint { x: 2.0, y: 0.0 });
        assert_close(top_left.x, 10.0);
        assert_close(top_left.y, 10.0);
        assert_close(bottom_right.x, 210.0);
        assert_close(bottom_right.y, 110.0);
    }

    #[test]
    fn fixed_height_keeps_aspect_and_centres() {
        let region = BoundingRegion { min_x: 0.0, min_y: 0.0, max_x: 1.0, max_y: 1.0 };
        let transform = CanvasTransform::fit(region, 300, Some(100), 0.0);
        assert_close(transform.scale(), 100.0);
        let corner = transform.to_canvas(PlanarPoint { x: 0.0, y: 1.0 });
        assert_close(corner.x, 100.0);
        assert_close(corner.y, 0.0);
    }

    #[test]
    fn single_point_lands_at_centre() {
        let region = BoundingRegion::point(PlanarPoint { x: 4.0, y: 52.0 });
        let transform = CanvasTransform::fit(region, 500, None, 20.0);
        assert_eq!(transform.canvas_height(), 500);
        assert!(transform.scale().is_finite());
        let p = transform.to_canvas(PlanarPoint { x: 4.0, y: 52.0 });
        assert_close(p.x, 250.0);
        assert_close(p.y, 250.0);
    }

    #[test]
    fn flat_region_is_centred_vertically() {
        let region = BoundingRegion { min_x: 0.0, min_y: 5.0, max_x: 10.0, max_y: 5.0 };
        let transform = CanvasTransform::fit(region, 100, Some(50), 0.0);
        assert_close(transform.scale(), 10.0);
        let p = transform.to_canvas(PlanarPoint { x: 10.0, y: 5.0 });
        assert_close(p.x, 100.0);
        assert_close(p.y, 25.0);
    }
}
