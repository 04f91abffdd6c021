//! Deterministic filter chain turning a raster into a binary edge map and
//! extracting candidate object boundaries from it.
//!
//! Chain: grayscale -> Gaussian blur -> Canny -> morphological closing.

use image::{GrayImage, Luma};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use tracing::debug;

use crate::contours::{find_contours, Contour};
use crate::error::MeasureError;
use crate::image_impl::Mat;
use crate::types::EdgeDetectionSettings;

/// Runs the full filter chain and returns the closed binary edge map.
pub fn prepare_image(
    image: &Mat,
    settings: &EdgeDetectionSettings,
) -> Result<GrayImage, MeasureError> {
    settings.validate()?;

    let gray = image.to_luma8();
    let blurred = gaussian_blur_f32(&gray, blur_sigma(settings.blur_kernel_size));
    let edges = canny(&blurred, settings.canny_low, settings.canny_high);
    let closed = close_rect(&edges, settings.morph_kernel_size);

    Ok(closed)
}

/// Filter chain plus boundary extraction in one step.
pub fn extract(
    image: &Mat,
    settings: &EdgeDetectionSettings,
    min_area: f32,
) -> Result<Vec<Contour>, MeasureError> {
    let edge_map = prepare_image(image, settings)?;
    let contours = find_contours(&edge_map, min_area);
    debug!(count = contours.len(), min_area, "extracted contours");
    Ok(contours)
}

/// Gaussian sigma for an odd kernel, one axis at a time, averaged.
///
/// Same kernel-to-sigma mapping OpenCV applies when sigma is left at 0.
fn blur_sigma(kernel: (u32, u32)) -> f32 {
    let per_axis = |k: u32| 0.3 * ((k as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    (per_axis(kernel.0) + per_axis(kernel.1)) / 2.0
}

/// Morphological closing (dilate then erode) with a rectangular structuring
/// element, bridging small gaps in the edge map.
fn close_rect(src: &GrayImage, kernel: (u32, u32)) -> GrayImage {
    let dilated = dilate_rect(src, kernel);
    erode_rect(&dilated, kernel)
}

fn dilate_rect(src: &GrayImage, kernel: (u32, u32)) -> GrayImage {
    let (width, height) = src.dimensions();
    let rx = (kernel.0 / 2) as i64;
    let ry = (kernel.1 / 2) as i64;
    let mut out = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut any_set = false;
            'probe: for dy in -ry..=ry {
                let ny = y as i64 + dy;
                if ny < 0 || ny >= height as i64 {
                    continue;
                }
                for dx in -rx..=rx {
                    let nx = x as i64 + dx;
                    if nx < 0 || nx >= width as i64 {
                        continue;
                    }
                    if src.get_pixel(nx as u32, ny as u32)[0] > 0 {
                        any_set = true;
                        break 'probe;
                    }
                }
            }
            out.put_pixel(x, y, Luma([if any_set { 255 } else { 0 }]));
        }
    }

    out
}

fn erode_rect(src: &GrayImage, kernel: (u32, u32)) -> GrayImage {
    let (width, height) = src.dimensions();
    let rx = (kernel.0 / 2) as i64;
    let ry = (kernel.1 / 2) as i64;
    let mut out = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let mut all_set = true;
            'probe: for dy in -ry..=ry {
                let ny = y as i64 + dy;
                for dx in -rx..=rx {
                    let nx = x as i64 + dx;
                    // Out-of-bounds counts as background.
                    if nx < 0 || nx >= width as i64 || ny < 0 || ny >= height as i64 {
                        all_set = false;
                        break 'probe;
                    }
                    if src.get_pixel(nx as u32, ny as u32)[0] == 0 {
                        all_set = false;
                        break 'probe;
                    }
                }
            }
            out.put_pixel(x, y, Luma([if all_set { 255 } else { 0 }]));
        }
    }

    out
}
