//! Perspective rectification of the frame region into a top-down canvas.

use tracing::debug;

use crate::calibrate::{axis_ratios, AxisRatios};
use crate::error::MeasureError;
use crate::image_impl::{get_perspective_transform, warp_perspective, Mat, Point2f, Size};
use crate::types::FrameSpec;

/// A rectified ("top-down") raster whose pixel dimensions are coupled to the
/// calibration: `width_px = round(real_width_mm * x_ratio)` and likewise for
/// the height. Rederiving `width_px / real_width_mm` reproduces the final
/// ratio exactly.
pub struct RectifiedImage {
    pub image: Mat,
    pub width_px: u32,
    pub height_px: u32,
}

/// Warps the quadrilateral spanned by `corners` onto an axis-aligned canvas.
///
/// The provisional ratios computed from uncorrected pixel distances size the
/// canvas; the returned ratios are rederived from the rounded integer canvas
/// and are the ones every subsequent mm conversion must use.
pub fn rectify(
    image: &Mat,
    corners: &[Point2f; 4],
    frame: &FrameSpec,
) -> Result<(RectifiedImage, AxisRatios), MeasureError> {
    let provisional = axis_ratios(corners, frame)?;

    let target_width_px = (frame.real_width_mm * provisional.x_ratio).round() as i64;
    let target_height_px = (frame.real_height_mm * provisional.y_ratio).round() as i64;

    if target_width_px <= 0 || target_height_px <= 0 {
        return Err(MeasureError::Geometry(format!(
            "degenerate corners produce a {target_width_px}x{target_height_px} canvas"
        )));
    }

    let dst_points = [
        Point2f::new(0.0, 0.0),
        Point2f::new(target_width_px as f32, 0.0),
        Point2f::new(target_width_px as f32, target_height_px as f32),
        Point2f::new(0.0, target_height_px as f32),
    ];

    let matrix = get_perspective_transform(corners, &dst_points)?;
    let corrected = warp_perspective(
        image,
        &matrix,
        Size::new(target_width_px as i32, target_height_px as i32),
    )?;

    let final_ratios = AxisRatios::new(
        target_width_px as f32 / frame.real_width_mm,
        target_height_px as f32 / frame.real_height_mm,
    );

    debug!(
        width_px = target_width_px,
        height_px = target_height_px,
        x_ratio = final_ratios.x_ratio,
        y_ratio = final_ratios.y_ratio,
        "rectified frame region"
    );

    Ok((
        RectifiedImage {
            image: corrected,
            width_px: target_width_px as u32,
            height_px: target_height_px as u32,
        },
        final_ratios,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn blank(width: u32, height: u32) -> Mat {
        Mat::new(DynamicImage::ImageRgb8(RgbImage::new(width, height)))
    }

    #[test]
    fn canvas_size_reproduces_final_ratios() {
        let image = blank(1000, 600);
        let corners = [
            Point2f::new(100.0, 50.0),
            Point2f::new(900.0, 50.0),
            Point2f::new(900.0, 550.0),
            Point2f::new(100.0, 550.0),
        ];
        let frame = FrameSpec::new(300.0, 180.0);

        let (rectified, ratios) = rectify(&image, &corners, &frame).unwrap();

        assert_eq!(rectified.width_px, 800);
        assert_eq!(rectified.height_px, 500);
        assert_eq!(rectified.image.cols() as u32, rectified.width_px);
        assert_eq!(rectified.image.rows() as u32, rectified.height_px);

        // The output canvas divided by the real dims is exactly the ratio.
        assert_eq!(
            ratios.x_ratio,
            rectified.width_px as f32 / frame.real_width_mm
        );
        assert_eq!(
            ratios.y_ratio,
            rectified.height_px as f32 / frame.real_height_mm
        );
        assert!((ratios.x_ratio - 800.0 / 300.0).abs() < 1e-4);
        assert!((ratios.y_ratio - 500.0 / 180.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_corners_fail_with_geometry_error() {
        let image = blank(100, 100);
        let p = Point2f::new(50.0, 50.0);
        let corners = [p, p, p, p];
        let frame = FrameSpec::new(300.0, 180.0);
        assert!(matches!(
            rectify(&image, &corners, &frame),
            Err(MeasureError::Geometry(_))
        ));
    }

    #[test]
    fn warp_preserves_region_content() {
        // White rectangle inside a black 200x200 image; after rectification
        // the canvas interior should be white.
        let mut img = RgbImage::new(200, 200);
        for y in 40..160 {
            for x in 20..180 {
                img.put_pixel(x, y, image::Rgb([255, 255, 255]));
            }
        }
        let mat = Mat::new(DynamicImage::ImageRgb8(img));
        let corners = [
            Point2f::new(20.0, 40.0),
            Point2f::new(180.0, 40.0),
            Point2f::new(180.0, 160.0),
            Point2f::new(20.0, 160.0),
        ];
        let frame = FrameSpec::new(160.0, 120.0);
        let (rectified, _) = rectify(&mat, &corners, &frame).unwrap();

        let center =
            rectified
                .image
                .get_pixel(rectified.width_px / 2, rectified.height_px / 2);
        assert_eq!(center, [255, 255, 255]);
    }
}
