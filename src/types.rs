use serde::{Deserialize, Serialize};

use crate::error::MeasureError;

/// Real-world dimensions of the reference frame (the drawer opening).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FrameSpec {
    pub real_width_mm: f32,
    pub real_height_mm: f32,
}

impl FrameSpec {
    pub fn new(real_width_mm: f32, real_height_mm: f32) -> Self {
        Self {
            real_width_mm,
            real_height_mm,
        }
    }

    pub fn validate(&self) -> Result<(), MeasureError> {
        if self.real_width_mm <= 0.0 || self.real_height_mm <= 0.0 {
            return Err(MeasureError::InvalidConfig(format!(
                "frame dimensions must be positive, got {} x {} mm",
                self.real_width_mm, self.real_height_mm
            )));
        }
        Ok(())
    }
}

/// Parameters for the edge detection filter chain.
///
/// Kernel sizes are (width, height) pairs and must be odd positive integers.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeDetectionSettings {
    pub blur_kernel_size: (u32, u32),
    pub canny_low: f32,
    pub canny_high: f32,
    pub morph_kernel_size: (u32, u32),
}

impl Default for EdgeDetectionSettings {
    fn default() -> Self {
        Self {
            blur_kernel_size: (5, 5),
            canny_low: 30.0,
            canny_high: 130.0,
            morph_kernel_size: (5, 5),
        }
    }
}

impl EdgeDetectionSettings {
    pub fn validate(&self) -> Result<(), MeasureError> {
        for (name, (kw, kh)) in [
            ("blur_kernel_size", self.blur_kernel_size),
            ("morph_kernel_size", self.morph_kernel_size),
        ] {
            if kw == 0 || kh == 0 || kw % 2 == 0 || kh % 2 == 0 {
                return Err(MeasureError::InvalidConfig(format!(
                    "{name} must be odd and positive, got ({kw}, {kh})"
                )));
            }
        }
        if self.canny_low <= 0.0 || self.canny_high <= self.canny_low {
            return Err(MeasureError::InvalidConfig(format!(
                "canny thresholds must satisfy 0 < low < high, got {} / {}",
                self.canny_low, self.canny_high
            )));
        }
        Ok(())
    }
}

/// Thresholds applied after contour extraction.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    /// Minimum enclosed area (px^2) for a contour to survive noise filtering.
    pub min_contour_area: f32,
    /// Circularity threshold for circle classification.
    pub circle_threshold: f32,
    /// Diameter of the reference coin used for coin-based calibration.
    pub coin_diameter_mm: f32,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            min_contour_area: 1000.0,
            circle_threshold: 0.85,
            coin_diameter_mm: 23.25,
        }
    }
}
