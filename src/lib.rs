//! # FrameCal - Photo-to-Millimeter Measurement
//!
//! FrameCal measures real-world dimensions of objects photographed inside a
//! rectangular reference frame (a drawer) by correcting camera perspective
//! and converting pixel distances to millimeters.
//!
//! ## Features
//!
//! - **Corner canonicalization**: four corner points in any order become a
//!   stable top-left/top-right/bottom-right/bottom-left ordering
//! - **Per-axis calibration**: independent x/y px-per-mm ratios from the
//!   frame's known real dimensions
//! - **Perspective rectification**: top-down canvas whose size is an exact
//!   integer multiple of the calibration
//! - **Contour measurement**: edge-detected object boundaries with
//!   circularity-based coin selection for reference checks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use framecal::{imread, measure, FrameSpec, MeasureRequest, Point2f};
//!
//! let image = imread("drawer.jpg")?;
//! let request = MeasureRequest::new(
//!     vec![
//!         Point2f::new(100.0, 50.0),
//!         Point2f::new(900.0, 50.0),
//!         Point2f::new(900.0, 550.0),
//!         Point2f::new(100.0, 550.0),
//!     ],
//!     FrameSpec::new(300.0, 180.0),
//! );
//!
//! let output = measure(&image, &request)?;
//! println!(
//!     "{} contours at {:.3} x {:.3} px/mm",
//!     output.contours.len(),
//!     output.ratios.x_ratio,
//!     output.ratios.y_ratio
//! );
//! # Ok::<(), framecal::MeasureError>(())
//! ```

mod calibrate;
mod circles;
mod contours;
mod edges;
mod error;
mod export;
mod geometry;
mod image_impl;
mod pipeline;
mod rectify;
mod transform;
mod types;

pub use crate::calibrate::{
    axis_ratios, frame_edges_px, refine_with_known_measurement, AxisRatios,
};
pub use crate::circles::{
    coin_px_per_mm, detect_circles, inscribed_diameter_mm, is_circle, max_chord_mm,
    min_enclosing_circle, min_inscribed_radius, nearest_to_origin,
};
pub use crate::contours::{find_contours, Contour};
pub use crate::edges::{extract, prepare_image};
pub use crate::error::MeasureError;
pub use crate::export::{
    centroid_to_mm, contour_to_mm, point_distance_mm, point_to_mm, MmPoint,
};
pub use crate::geometry::{
    centroid_from_moments, distance, order_corners, polygon_area, polygon_perimeter,
};
pub use crate::image_impl::{imread, imwrite, Mat, Point2f, Size};
pub use crate::pipeline::{
    measure, ContourReport, MeasureOutput, MeasureReport, MeasureRequest,
};
pub use crate::rectify::{rectify, RectifiedImage};
pub use crate::transform::{apply_to_image, map_point, unmap_point, Rotation, Transformation};
pub use crate::types::{EdgeDetectionSettings, FrameSpec, MeasureConfig};

use std::path::Path;

/// Convenience wrapper binding a request to repeated measurements.
pub struct FrameCal {
    request: MeasureRequest,
}

impl FrameCal {
    pub fn new(request: MeasureRequest) -> Self {
        Self { request }
    }

    /// Runs the pipeline on an image file.
    pub fn measure_file<P: AsRef<Path>>(&self, path: P) -> Result<MeasureOutput, MeasureError> {
        let image = imread(path)?;
        measure(&image, &self.request)
    }

    /// Runs the pipeline on a decoded raster.
    pub fn measure_image(&self, image: &Mat) -> Result<MeasureOutput, MeasureError> {
        measure(image, &self.request)
    }

    pub fn request(&self) -> &MeasureRequest {
        &self.request
    }
}
