//! Contour value type and boundary extraction from a binary edge map.

use image::GrayImage;
use imageproc::contours::BorderType;

use crate::geometry::{centroid_from_moments, polygon_area, polygon_perimeter};
use crate::image_impl::Point2f;

/// A closed boundary polygon of one connected foreground region.
///
/// Derived scalars are computed once at construction; the value is
/// immutable afterwards.
#[derive(Debug, Clone)]
pub struct Contour {
    points: Vec<Point2f>,
    area: f32,
    perimeter: f32,
    centroid: Option<Point2f>,
    circularity: f32,
}

impl Contour {
    pub fn new(points: Vec<Point2f>) -> Self {
        let area = polygon_area(&points);
        let perimeter = polygon_perimeter(&points);
        let centroid = centroid_from_moments(&points);
        let circularity = if perimeter > 0.0 {
            4.0 * std::f32::consts::PI * area / (perimeter * perimeter)
        } else {
            0.0
        };
        Self {
            points,
            area,
            perimeter,
            centroid,
            circularity,
        }
    }

    pub fn points(&self) -> &[Point2f] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed area in px^2.
    pub fn area(&self) -> f32 {
        self.area
    }

    /// Closed boundary length in px.
    pub fn perimeter(&self) -> f32 {
        self.perimeter
    }

    /// Area-weighted centroid; `None` for a degenerate contour.
    pub fn centroid(&self) -> Option<Point2f> {
        self.centroid
    }

    /// 4 * pi * area / perimeter^2; 1.0 for a perfect circle, 0 when the
    /// perimeter is zero.
    pub fn circularity(&self) -> f32 {
        self.circularity
    }
}

/// Traces closed boundaries in a binary image, keeping outermost borders
/// only, and drops contours at or below `min_area`.
///
/// The returned order is the trace's detection order and is not part of
/// the contract.
pub fn find_contours(binary_img: &GrayImage, min_area: f32) -> Vec<Contour> {
    imageproc::contours::find_contours::<i32>(binary_img)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            Contour::new(
                c.points
                    .into_iter()
                    .map(|p| Point2f::new(p.x as f32, p.y as f32))
                    .collect(),
            )
        })
        .filter(|c| c.area() > min_area)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn finds_a_filled_rectangle() {
        let mut img = GrayImage::new(40, 40);
        for y in 5..35 {
            for x in 5..35 {
                img.put_pixel(x, y, Luma([255]));
            }
        }

        let contours = find_contours(&img, 100.0);
        assert_eq!(contours.len(), 1);

        let c = &contours[0];
        // Traced boundary of a 30x30 block encloses roughly 29*29 px.
        assert!((c.area() - 841.0).abs() / 841.0 < 0.05);
        let centroid = c.centroid().unwrap();
        assert!((centroid.x - 19.5).abs() < 1.0);
        assert!((centroid.y - 19.5).abs() < 1.0);
    }

    #[test]
    fn min_area_filter_suppresses_noise() {
        let mut img = GrayImage::new(40, 40);
        // A 3x3 speck.
        for y in 10..13 {
            for x in 10..13 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        assert!(find_contours(&img, 100.0).is_empty());
    }

    #[test]
    fn hole_borders_are_not_reported() {
        // Ring: filled 30x30 block with an empty 10x10 interior.
        let mut img = GrayImage::new(40, 40);
        for y in 5..35 {
            for x in 5..35 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        for y in 15..25 {
            for x in 15..25 {
                img.put_pixel(x, y, Luma([0]));
            }
        }

        let contours = find_contours(&img, 10.0);
        assert_eq!(contours.len(), 1);
    }

    #[test]
    fn degenerate_contour_is_safe() {
        let c = Contour::new(vec![Point2f::new(3.0, 3.0)]);
        assert_eq!(c.area(), 0.0);
        assert_eq!(c.circularity(), 0.0);
        assert!(c.centroid().is_none());
    }
}
