//! Per-axis pixel-to-millimeter calibration from ordered frame corners.

use serde::{Deserialize, Serialize};

use crate::error::MeasureError;
use crate::geometry::distance;
use crate::image_impl::Point2f;
use crate::types::FrameSpec;

/// Pixels-per-millimeter conversion factors, one per axis.
///
/// Independent x/y ratios absorb non-square pixel aspect and anisotropic
/// lens behavior that a single scalar ratio would average away. Each
/// rectification produces a fresh pair; ratios are never mutated.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRatios {
    pub x_ratio: f32,
    pub y_ratio: f32,
}

impl AxisRatios {
    pub fn new(x_ratio: f32, y_ratio: f32) -> Self {
        Self { x_ratio, y_ratio }
    }
}

/// Pixel lengths of the four frame edges as [top, right, bottom, left].
pub fn frame_edges_px(corners: &[Point2f; 4]) -> [f32; 4] {
    let [tl, tr, br, bl] = *corners;
    [
        distance(tr, tl),
        distance(br, tr),
        distance(br, bl),
        distance(bl, tl),
    ]
}

/// Computes per-axis px/mm ratios from ordered corners and the frame's real
/// dimensions.
///
/// Opposite edges are averaged to compensate for residual perspective skew
/// that corner selection alone does not remove.
pub fn axis_ratios(corners: &[Point2f; 4], frame: &FrameSpec) -> Result<AxisRatios, MeasureError> {
    frame.validate()?;

    let [top_px, right_px, bottom_px, left_px] = frame_edges_px(corners);

    let avg_width_px = (top_px + bottom_px) / 2.0;
    let avg_height_px = (right_px + left_px) / 2.0;

    if avg_width_px <= 0.0 || avg_height_px <= 0.0 {
        return Err(MeasureError::Geometry(format!(
            "frame collapses to {avg_width_px} x {avg_height_px} px"
        )));
    }

    Ok(AxisRatios::new(
        avg_width_px / frame.real_width_mm,
        avg_height_px / frame.real_height_mm,
    ))
}

/// Refines ratios from a user-measured reference: two pixel points on the
/// rectified image plus their true separation in mm.
///
/// A `true_mm` of zero or below leaves the previous ratios untouched. An
/// axis with no pixel delta also keeps its previous ratio, so an
/// axis-aligned reference measurement refines only the axis it spans.
pub fn refine_with_known_measurement(
    prev: AxisRatios,
    p1: Point2f,
    p2: Point2f,
    true_mm: f32,
) -> AxisRatios {
    if true_mm <= 0.0 {
        return prev;
    }

    let dx = (p2.x - p1.x).abs();
    let dy = (p2.y - p1.y).abs();

    AxisRatios::new(
        if dx > 0.0 { dx / true_mm } else { prev.x_ratio },
        if dy > 0.0 { dy / true_mm } else { prev.y_ratio },
    )
}
