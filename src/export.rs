//! Millimeter conversion surface consumed by downstream exporters.
//!
//! Pixel space has a top-left origin with y growing downward; vector
//! formats (DXF) use a bottom-left origin. Conversions here therefore
//! negate y: `x_mm = x_px / x_ratio + origin.x`,
//! `y_mm = -y_px / y_ratio + origin.y`. This sign convention is part of
//! the output contract.

use serde::{Deserialize, Serialize};

use crate::calibrate::AxisRatios;
use crate::contours::Contour;
use crate::image_impl::Point2f;

/// A millimeter-space point in the exporter's bottom-left-origin frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MmPoint {
    pub x_mm: f32,
    pub y_mm: f32,
}

/// Converts one pixel-space point into exporter millimeter space.
pub fn point_to_mm(p: Point2f, ratios: &AxisRatios, origin: (f32, f32)) -> MmPoint {
    MmPoint {
        x_mm: p.x / ratios.x_ratio + origin.0,
        y_mm: -p.y / ratios.y_ratio + origin.1,
    }
}

/// Converts a contour's boundary polygon into exporter millimeter space.
pub fn contour_to_mm(contour: &Contour, ratios: &AxisRatios, origin: (f32, f32)) -> Vec<MmPoint> {
    contour
        .points()
        .iter()
        .map(|&p| point_to_mm(p, ratios, origin))
        .collect()
}

/// Millimeter-space centroid for labeling; `None` for a degenerate contour.
pub fn centroid_to_mm(
    contour: &Contour,
    ratios: &AxisRatios,
    origin: (f32, f32),
) -> Option<MmPoint> {
    contour.centroid().map(|c| point_to_mm(c, ratios, origin))
}

/// Distance in mm between two pixel points on the rectified image, with
/// each axis converted through its own ratio before the norm is taken.
pub fn point_distance_mm(p1: Point2f, p2: Point2f, ratios: &AxisRatios) -> f32 {
    let dx_mm = (p2.x - p1.x).abs() / ratios.x_ratio;
    let dy_mm = (p2.y - p1.y).abs() / ratios.y_ratio;
    dx_mm.hypot(dy_mm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_axis_is_flipped_on_export() {
        let ratios = AxisRatios::new(2.0, 4.0);
        let p = point_to_mm(Point2f::new(100.0, 80.0), &ratios, (0.0, 0.0));
        assert!((p.x_mm - 50.0).abs() < 1e-5);
        assert!((p.y_mm + 20.0).abs() < 1e-5);
    }

    #[test]
    fn origin_offsets_are_applied() {
        let ratios = AxisRatios::new(1.0, 1.0);
        let p = point_to_mm(Point2f::new(10.0, 10.0), &ratios, (5.0, 100.0));
        assert_eq!(p, MmPoint { x_mm: 15.0, y_mm: 90.0 });
    }

    #[test]
    fn contour_polygon_converts_pointwise() {
        let ratios = AxisRatios::new(2.0, 2.0);
        let contour = Contour::new(vec![
            Point2f::new(0.0, 0.0),
            Point2f::new(20.0, 0.0),
            Point2f::new(20.0, 20.0),
            Point2f::new(0.0, 20.0),
        ]);
        let mm = contour_to_mm(&contour, &ratios, (0.0, 0.0));
        assert_eq!(mm.len(), 4);
        assert_eq!(mm[2], MmPoint { x_mm: 10.0, y_mm: -10.0 });

        let centroid = centroid_to_mm(&contour, &ratios, (0.0, 0.0)).unwrap();
        assert!((centroid.x_mm - 5.0).abs() < 1e-4);
        assert!((centroid.y_mm + 5.0).abs() < 1e-4);
    }

    #[test]
    fn two_point_distance_uses_per_axis_ratios() {
        let ratios = AxisRatios::new(2.0, 5.0);
        // 60 px horizontal and 40 px vertical -> 30 mm and 8 mm.
        let d = point_distance_mm(Point2f::new(0.0, 0.0), Point2f::new(60.0, 40.0), &ratios);
        let expected = (30.0f32 * 30.0 + 8.0 * 8.0).sqrt();
        assert!((d - expected).abs() < 1e-4);
    }
}
