//! Circle classification and coin-based calibration helpers.

use crate::calibrate::AxisRatios;
use crate::contours::Contour;
use crate::error::MeasureError;
use crate::geometry::distance;
use crate::image_impl::Point2f;

/// Whether a contour is round enough to count as a circle.
///
/// A perfect circle scores 1.0; calibration use typically thresholds in the
/// 0.80-0.90 range.
pub fn is_circle(contour: &Contour, threshold: f32) -> bool {
    contour.circularity() >= threshold
}

/// Filters contours down to circular shapes.
pub fn detect_circles(contours: &[Contour], threshold: f32) -> Vec<&Contour> {
    contours.iter().filter(|c| is_circle(c, threshold)).collect()
}

/// Minimum distance from the contour's centroid to any boundary point.
///
/// This is the closest-boundary-point approximation, not the maximum
/// inscribed circle of polygon theory; it excludes side-on artifacts (a
/// coin's visible rim) from the radius on purpose. Returns 0 for a
/// degenerate contour.
pub fn min_inscribed_radius(contour: &Contour) -> f32 {
    let Some(center) = contour.centroid() else {
        return 0.0;
    };
    contour
        .points()
        .iter()
        .map(|&p| distance(center, p))
        .fold(f32::INFINITY, f32::min)
}

/// Smallest circle containing every contour point.
pub fn min_enclosing_circle(contour: &Contour) -> (Point2f, f32) {
    enclosing_circle(contour.points())
}

/// Among circular contours, the one whose centroid lies closest to
/// `origin`; `None` when no contour passes the circularity threshold.
///
/// This is the coin-selection heuristic: the calibration coin is placed
/// near a known corner of the frame.
pub fn nearest_to_origin<'a>(
    contours: &'a [Contour],
    origin: Point2f,
    threshold: f32,
) -> Option<&'a Contour> {
    detect_circles(contours, threshold)
        .into_iter()
        .filter_map(|c| c.centroid().map(|ctr| (distance(ctr, origin), c)))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c)
}

/// px/mm ratio from a detected coin of known diameter.
///
/// Uses the inscribed-radius diameter so that a partially visible coin edge
/// does not inflate the estimate the way an enclosing circle would.
pub fn coin_px_per_mm(contour: &Contour, coin_diameter_mm: f32) -> Result<f32, MeasureError> {
    if coin_diameter_mm <= 0.0 {
        return Err(MeasureError::InvalidConfig(format!(
            "coin diameter must be positive, got {coin_diameter_mm} mm"
        )));
    }
    if contour.centroid().is_none() {
        return Err(MeasureError::Geometry(
            "coin contour has no valid center".to_string(),
        ));
    }

    let diameter_px = 2.0 * min_inscribed_radius(contour);
    Ok(diameter_px / coin_diameter_mm)
}

/// Inscribed-circle diameter in millimeters, measured in mm space so the
/// per-axis ratios are honored; `None` for a degenerate contour.
pub fn inscribed_diameter_mm(contour: &Contour, ratios: &AxisRatios) -> Option<f32> {
    let center = contour.centroid()?;
    let min_distance = contour
        .points()
        .iter()
        .map(|p| {
            let x_dist = (p.x - center.x) / ratios.x_ratio;
            let y_dist = (p.y - center.y) / ratios.y_ratio;
            x_dist.hypot(y_dist)
        })
        .fold(f32::INFINITY, f32::min);

    if min_distance.is_finite() {
        Some(2.0 * min_distance)
    } else {
        None
    }
}

/// Longest straight-line span between any two contour points, in mm.
pub fn max_chord_mm(contour: &Contour, ratios: &AxisRatios) -> f32 {
    let points = contour.points();
    let mut max_length = 0.0f32;
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let dx = (points[j].x - points[i].x) / ratios.x_ratio;
            let dy = (points[j].y - points[i].y) / ratios.y_ratio;
            let length = dx.hypot(dy);
            if length > max_length {
                max_length = length;
            }
        }
    }
    max_length
}

const ENCLOSING_EPS: f64 = 1e-7;

/// Exact minimal enclosing circle, grown incrementally one point at a time.
fn enclosing_circle(points: &[Point2f]) -> (Point2f, f32) {
    if points.is_empty() {
        return (Point2f::default(), 0.0);
    }

    let mut circle = (points[0], 0.0f32);
    for i in 1..points.len() {
        if contains(circle, points[i]) {
            continue;
        }
        circle = (points[i], 0.0);
        for j in 0..i {
            if contains(circle, points[j]) {
                continue;
            }
            circle = circle_from_two(points[i], points[j]);
            for k in 0..j {
                if !contains(circle, points[k]) {
                    circle = circle_from_three(points[i], points[j], points[k]);
                }
            }
        }
    }
    circle
}

fn contains(circle: (Point2f, f32), p: Point2f) -> bool {
    distance(circle.0, p) as f64 <= circle.1 as f64 + 1e-4
}

fn circle_from_two(a: Point2f, b: Point2f) -> (Point2f, f32) {
    let center = Point2f::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    (center, distance(a, b) / 2.0)
}

fn circle_from_three(a: Point2f, b: Point2f, c: Point2f) -> (Point2f, f32) {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (bx, by) = (b.x as f64, b.y as f64);
    let (cx, cy) = (c.x as f64, c.y as f64);

    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));
    if d.abs() < ENCLOSING_EPS {
        // Collinear: widest two-point circle covers all three.
        let candidates = [
            circle_from_two(a, b),
            circle_from_two(b, c),
            circle_from_two(a, c),
        ];
        return candidates
            .into_iter()
            .max_by(|p, q| p.1.total_cmp(&q.1))
            .unwrap_or((a, 0.0));
    }

    let a2 = ax * ax + ay * ay;
    let b2 = bx * bx + by * by;
    let c2 = cx * cx + cy * cy;
    let ux = (a2 * (by - cy) + b2 * (cy - ay) + c2 * (ay - by)) / d;
    let uy = (a2 * (cx - bx) + b2 * (ax - cx) + c2 * (bx - ax)) / d;

    let center = Point2f::new(ux as f32, uy as f32);
    (center, distance(center, a))
}
