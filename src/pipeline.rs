//! End-to-end request processing: transformation, corner ordering,
//! rectification, contour extraction and circle classification.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calibrate::AxisRatios;
use crate::circles::{coin_px_per_mm, inscribed_diameter_mm, is_circle};
use crate::contours::Contour;
use crate::edges;
use crate::error::MeasureError;
use crate::export::{centroid_to_mm, MmPoint};
use crate::geometry::{distance, order_corners};
use crate::image_impl::{Mat, Point2f};
use crate::rectify::{rectify, RectifiedImage};
use crate::transform::{apply_to_image, Transformation};
use crate::types::{EdgeDetectionSettings, FrameSpec, MeasureConfig};

/// One measurement request: four corner points (any order) captured on the
/// transformed image, the frame's real dimensions, and tunables.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeasureRequest {
    pub corners: Vec<Point2f>,
    pub frame: FrameSpec,
    #[serde(default)]
    pub transformation: Transformation,
    #[serde(default)]
    pub edge_settings: EdgeDetectionSettings,
    #[serde(default)]
    pub config: MeasureConfig,
}

impl MeasureRequest {
    pub fn new(corners: Vec<Point2f>, frame: FrameSpec) -> Self {
        Self {
            corners,
            frame,
            transformation: Transformation::default(),
            edge_settings: EdgeDetectionSettings::default(),
            config: MeasureConfig::default(),
        }
    }
}

/// Everything the transport layer needs from one processed request.
pub struct MeasureOutput {
    pub rectified: RectifiedImage,
    pub ratios: AxisRatios,
    pub contours: Vec<Contour>,
    /// Indices into `contours` that pass the circularity threshold.
    pub circles: Vec<usize>,
    /// Index of the calibration coin candidate: the circular contour whose
    /// centroid lies closest to the frame's top-left corner.
    pub coin: Option<usize>,
    pub elapse: f64,
}

/// Runs the full measurement pipeline on a decoded raster.
pub fn measure(image: &Mat, request: &MeasureRequest) -> Result<MeasureOutput, MeasureError> {
    let start = Instant::now();

    request.frame.validate()?;
    request.edge_settings.validate()?;

    let transformed = if request.transformation.is_identity() {
        image.clone()
    } else {
        apply_to_image(image, &request.transformation)
    };

    validate_coordinates(&transformed, &request.corners)?;
    let ordered = order_corners(&request.corners)?;

    let (rectified, ratios) = rectify(&transformed, &ordered, &request.frame)?;

    let contours = edges::extract(
        &rectified.image,
        &request.edge_settings,
        request.config.min_contour_area,
    )?;

    let circles: Vec<usize> = contours
        .iter()
        .enumerate()
        .filter(|(_, c)| is_circle(c, request.config.circle_threshold))
        .map(|(i, _)| i)
        .collect();

    let origin = Point2f::new(0.0, 0.0);
    let coin = circles
        .iter()
        .copied()
        .filter_map(|i| {
            contours[i]
                .centroid()
                .map(|centroid| (distance(centroid, origin), i))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, i)| i);

    let elapse = start.elapsed().as_secs_f64();
    info!(
        contours = contours.len(),
        circles = circles.len(),
        coin = ?coin,
        elapse,
        "measurement pipeline finished"
    );

    Ok(MeasureOutput {
        rectified,
        ratios,
        contours,
        circles,
        coin,
        elapse,
    })
}

/// Rejects any corner outside the transformed image bounds.
fn validate_coordinates(image: &Mat, corners: &[Point2f]) -> Result<(), MeasureError> {
    let width = image.cols() as f32;
    let height = image.rows() as f32;
    for p in corners {
        if p.x < 0.0 || p.x >= width || p.y < 0.0 || p.y >= height {
            return Err(MeasureError::InvalidInput(format!(
                "coordinate ({}, {}) is outside image boundaries (width: {}, height: {})",
                p.x, p.y, width, height
            )));
        }
    }
    debug!(count = corners.len(), "coordinates within bounds");
    Ok(())
}

/// Per-contour summary row in a [`MeasureReport`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContourReport {
    pub index: usize,
    pub point_count: usize,
    pub area_px: f32,
    pub perimeter_px: f32,
    pub circularity: f32,
    pub is_circle: bool,
    pub centroid_mm: Option<MmPoint>,
    pub inscribed_diameter_mm: Option<f32>,
}

/// Serializable pipeline summary for the CLI and the transport layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeasureReport {
    pub x_ratio: f32,
    pub y_ratio: f32,
    pub rectified_width_px: u32,
    pub rectified_height_px: u32,
    pub contours: Vec<ContourReport>,
    pub coin_index: Option<usize>,
    pub coin_px_per_mm: Option<f32>,
    pub elapse: f64,
}

impl MeasureReport {
    pub fn from_output(output: &MeasureOutput, config: &MeasureConfig) -> Self {
        let contours = output
            .contours
            .iter()
            .enumerate()
            .map(|(index, c)| ContourReport {
                index,
                point_count: c.len(),
                area_px: c.area(),
                perimeter_px: c.perimeter(),
                circularity: c.circularity(),
                is_circle: output.circles.contains(&index),
                centroid_mm: centroid_to_mm(c, &output.ratios, (0.0, 0.0)),
                inscribed_diameter_mm: inscribed_diameter_mm(c, &output.ratios),
            })
            .collect();

        let coin_ratio = output
            .coin
            .and_then(|i| coin_px_per_mm(&output.contours[i], config.coin_diameter_mm).ok());

        Self {
            x_ratio: output.ratios.x_ratio,
            y_ratio: output.ratios.y_ratio,
            rectified_width_px: output.rectified.width_px,
            rectified_height_px: output.rectified.height_px,
            contours,
            coin_index: output.coin,
            coin_px_per_mm: coin_ratio,
            elapse: output.elapse,
        }
    }
}
