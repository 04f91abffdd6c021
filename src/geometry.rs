//! Primitive vector math and corner canonicalization.

use crate::error::MeasureError;
use crate::image_impl::Point2f;

pub fn distance(p1: Point2f, p2: Point2f) -> f32 {
    (p1.x - p2.x).hypot(p1.y - p2.y)
}

/// Enclosed area of a closed polygon via the shoelace formula.
///
/// Returns 0 for fewer than 3 points.
pub fn polygon_area(points: &[Point2f]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    signed_area(points).abs()
}

fn signed_area(points: &[Point2f]) -> f32 {
    let n = points.len();
    let mut acc = 0.0f64;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        acc += p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
    }
    (acc / 2.0) as f32
}

/// Perimeter of a closed polygon (wraps last point back to first).
pub fn polygon_perimeter(points: &[Point2f]) -> f32 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..n {
        total += distance(points[i], points[(i + 1) % n]);
    }
    total
}

/// Area-weighted centroid of a closed polygon.
///
/// `None` for a degenerate (zero-area) polygon. Callers treat that as
/// "no valid center", not as a failure.
pub fn centroid_from_moments(points: &[Point2f]) -> Option<Point2f> {
    if points.len() < 3 {
        return None;
    }

    let a = signed_area(points);
    if a.abs() < f32::EPSILON {
        return None;
    }

    let n = points.len();
    let mut cx = 0.0f64;
    let mut cy = 0.0f64;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let cross = p.x as f64 * q.y as f64 - q.x as f64 * p.y as f64;
        cx += (p.x as f64 + q.x as f64) * cross;
        cy += (p.y as f64 + q.y as f64) * cross;
    }
    let factor = 1.0 / (6.0 * a as f64);
    Some(Point2f::new((cx * factor) as f32, (cy * factor) as f32))
}

/// Orders four corner points into [top-left, top-right, bottom-right,
/// bottom-left].
///
/// Top-left minimizes x+y, bottom-right maximizes it; top-right maximizes
/// x-y, bottom-left minimizes it. This closed-form heuristic holds for
/// near-rectangular quadrilaterals with bounded skew; it is not valid for
/// configurations rotated beyond 45 degrees.
pub fn order_corners(corners: &[Point2f]) -> Result<[Point2f; 4], MeasureError> {
    if corners.len() != 4 {
        return Err(MeasureError::InvalidInput(format!(
            "expected 4 corner points, got {}",
            corners.len()
        )));
    }

    let mut top_left = 0usize;
    let mut bottom_right = 0usize;
    let mut top_right = 0usize;
    let mut bottom_left = 0usize;

    for (i, p) in corners.iter().enumerate() {
        let s = p.x + p.y;
        let d = p.x - p.y;
        if s < corners[top_left].x + corners[top_left].y {
            top_left = i;
        }
        if s > corners[bottom_right].x + corners[bottom_right].y {
            bottom_right = i;
        }
        if d > corners[top_right].x - corners[top_right].y {
            top_right = i;
        }
        if d < corners[bottom_left].x - corners[bottom_left].y {
            bottom_left = i;
        }
    }

    Ok([
        corners[top_left],
        corners[top_right],
        corners[bottom_right],
        corners[bottom_left],
    ])
}
