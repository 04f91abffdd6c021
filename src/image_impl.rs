//! Raster abstraction over the `image` crate plus the projective transform
//! primitives used by perspective rectification.

use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb};
use serde::{Deserialize, Serialize};

use crate::error::MeasureError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

impl Default for Point2f {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

impl Point2f {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone)]
pub struct Mat {
    image: DynamicImage,
}

impl Default for Mat {
    fn default() -> Self {
        Self {
            image: DynamicImage::new_rgb8(1, 1),
        }
    }
}

impl Mat {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn from_rgb8(width: u32, height: u32, data: Vec<u8>) -> Result<Self, MeasureError> {
        let img = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data).ok_or_else(|| {
            MeasureError::Image("failed to create image from raw data".to_string())
        })?;
        Ok(Self {
            image: DynamicImage::ImageRgb8(img),
        })
    }

    pub fn rows(&self) -> i32 {
        self.image.height() as i32
    }

    pub fn cols(&self) -> i32 {
        self.image.width() as i32
    }

    pub fn size(&self) -> Size {
        Size::new(self.cols(), self.rows())
    }

    pub fn empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn to_rgb8(&self) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
        self.image.to_rgb8()
    }

    pub fn to_luma8(&self) -> image::GrayImage {
        self.image.to_luma8()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let pixel = self.image.get_pixel(x, y);
        [pixel[0], pixel[1], pixel[2]]
    }

    /// 90 degrees clockwise.
    pub fn rotate90(&self) -> Mat {
        Mat::new(self.image.rotate90())
    }

    pub fn rotate180(&self) -> Mat {
        Mat::new(self.image.rotate180())
    }

    /// 270 degrees clockwise (90 counter-clockwise).
    pub fn rotate270(&self) -> Mat {
        Mat::new(self.image.rotate270())
    }

    /// Horizontal (left-right) mirror.
    pub fn fliph(&self) -> Mat {
        Mat::new(self.image.fliph())
    }
}

pub fn imread<P: AsRef<Path>>(path: P) -> Result<Mat, MeasureError> {
    let img = image::open(path)?;
    Ok(Mat::new(img))
}

pub fn imwrite<P: AsRef<Path>>(path: P, img: &Mat) -> Result<(), MeasureError> {
    img.image.save(path)?;
    Ok(())
}

/// Solves the 3x3 projective map taking `src_pts` onto `dst_pts`.
///
/// Tries the 8-parameter system with c22 = 1 first; falls back to an SVD
/// of the homogeneous 9-parameter system when the direct solve degenerates.
pub fn get_perspective_transform(
    src_pts: &[Point2f; 4],
    dst_pts: &[Point2f; 4],
) -> Result<[[f64; 3]; 3], MeasureError> {
    use nalgebra::DMatrix;

    let mut a = DMatrix::<f64>::zeros(8, 8);
    let mut b = DMatrix::<f64>::zeros(8, 1);

    for i in 0..4 {
        let x = src_pts[i].x as f64;
        let y = src_pts[i].y as f64;
        let u = dst_pts[i].x as f64;
        let v = dst_pts[i].y as f64;

        a[(i, 0)] = x;
        a[(i, 1)] = y;
        a[(i, 2)] = 1.0;
        a[(i, 6)] = -u * x;
        a[(i, 7)] = -u * y;
        b[(i, 0)] = u;

        a[(i + 4, 3)] = x;
        a[(i + 4, 4)] = y;
        a[(i + 4, 5)] = 1.0;
        a[(i + 4, 6)] = -v * x;
        a[(i + 4, 7)] = -v * y;
        b[(i + 4, 0)] = v;
    }

    if let Some(sol) = a.clone().lu().solve(&b) {
        let residual = (&a * &sol - &b).norm();
        if residual < 1e-8 {
            return Ok([
                [sol[(0, 0)], sol[(1, 0)], sol[(2, 0)]],
                [sol[(3, 0)], sol[(4, 0)], sol[(5, 0)]],
                [sol[(6, 0)], sol[(7, 0)], 1.0],
            ]);
        }
    }

    // Homogeneous fallback: null-space of the 8x9 constraint matrix.
    let mut a9 = DMatrix::<f64>::zeros(8, 9);
    for i in 0..4 {
        let x = src_pts[i].x as f64;
        let y = src_pts[i].y as f64;
        let u = dst_pts[i].x as f64;
        let v = dst_pts[i].y as f64;

        a9[(i, 0)] = x;
        a9[(i, 1)] = y;
        a9[(i, 2)] = 1.0;
        a9[(i, 6)] = -u * x;
        a9[(i, 7)] = -u * y;
        a9[(i, 8)] = -u;

        a9[(i + 4, 3)] = x;
        a9[(i + 4, 4)] = y;
        a9[(i + 4, 5)] = 1.0;
        a9[(i + 4, 6)] = -v * x;
        a9[(i + 4, 7)] = -v * y;
        a9[(i + 4, 8)] = -v;
    }

    let ata = a9.transpose() * &a9;
    let svd = ata.svd(true, false);
    let v = svd
        .u
        .ok_or_else(|| MeasureError::Geometry("SVD failed on perspective solve".to_string()))?;
    let h = v.column(8);

    Ok([
        [h[0], h[1], h[2]],
        [h[3], h[4], h[5]],
        [h[6], h[7], h[8]],
    ])
}

/// Resamples `src` through the inverse of `matrix` onto a fresh canvas of
/// `dsize`, with bilinear interpolation and nearest-neighbor fallback at the
/// border. Never mutates `src`.
pub fn warp_perspective(
    src: &Mat,
    matrix: &[[f64; 3]; 3],
    dsize: Size,
) -> Result<Mat, MeasureError> {
    if dsize.width <= 0 || dsize.height <= 0 {
        return Err(MeasureError::Geometry(format!(
            "warp target size must be positive, got {}x{}",
            dsize.width, dsize.height
        )));
    }

    let mut out_img = ImageBuffer::new(dsize.width as u32, dsize.height as u32);
    let src_img = src.to_rgb8();

    let m_inv = invert_matrix_3x3(matrix)?;

    let (m00, m01, m02) = (m_inv[0][0], m_inv[0][1], m_inv[0][2]);
    let (m10, m11, m12) = (m_inv[1][0], m_inv[1][1], m_inv[1][2]);
    let (m20, m21, m22) = (m_inv[2][0], m_inv[2][1], m_inv[2][2]);
    let src_cols = src.cols();
    let src_rows = src.rows();

    for y in 0..dsize.height as u32 {
        let y_f = y as f64;
        let m01y = m01 * y_f;
        let m11y = m11 * y_f;
        let m21y = m21 * y_f;

        for x in 0..dsize.width as u32 {
            let x_f = x as f64;
            let src_x_h = m00 * x_f + m01y + m02;
            let src_y_h = m10 * x_f + m11y + m12;
            let w = m20 * x_f + m21y + m22;

            let src_x_f = src_x_h / w;
            let src_y_f = src_y_h / w;

            let x0 = src_x_f.floor() as i32;
            let y0 = src_y_f.floor() as i32;
            let x1 = x0 + 1;
            let y1 = y0 + 1;

            if x0 >= 0 && x1 < src_cols && y0 >= 0 && y1 < src_rows {
                let fx = src_x_f - x0 as f64;
                let fy = src_y_f - y0 as f64;

                let p00 = src_img.get_pixel(x0 as u32, y0 as u32);
                let p10 = src_img.get_pixel(x1 as u32, y0 as u32);
                let p01 = src_img.get_pixel(x0 as u32, y1 as u32);
                let p11 = src_img.get_pixel(x1 as u32, y1 as u32);

                let r = ((1.0 - fx) * (1.0 - fy) * p00[0] as f64
                    + fx * (1.0 - fy) * p10[0] as f64
                    + (1.0 - fx) * fy * p01[0] as f64
                    + fx * fy * p11[0] as f64) as u8;
                let g = ((1.0 - fx) * (1.0 - fy) * p00[1] as f64
                    + fx * (1.0 - fy) * p10[1] as f64
                    + (1.0 - fx) * fy * p01[1] as f64
                    + fx * fy * p11[1] as f64) as u8;
                let b = ((1.0 - fx) * (1.0 - fy) * p00[2] as f64
                    + fx * (1.0 - fy) * p10[2] as f64
                    + (1.0 - fx) * fy * p01[2] as f64
                    + fx * fy * p11[2] as f64) as u8;

                out_img.put_pixel(x, y, Rgb([r, g, b]));
            } else if x0 >= 0 && x0 < src_cols && y0 >= 0 && y0 < src_rows {
                let pixel = src_img.get_pixel(x0 as u32, y0 as u32);
                out_img.put_pixel(x, y, *pixel);
            }
        }
    }

    Ok(Mat::new(DynamicImage::ImageRgb8(out_img)))
}

fn invert_matrix_3x3(m: &[[f64; 3]; 3]) -> Result<[[f64; 3]; 3], MeasureError> {
    use nalgebra::Matrix3;

    let mat = Matrix3::new(
        m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
    );

    let inv = mat
        .try_inverse()
        .ok_or_else(|| MeasureError::Geometry("perspective matrix is not invertible".to_string()))?;

    Ok([
        [inv[(0, 0)], inv[(0, 1)], inv[(0, 2)]],
        [inv[(1, 0)], inv[(1, 1)], inv[(1, 2)]],
        [inv[(2, 0)], inv[(2, 1)], inv[(2, 2)]],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_maps_points_to_themselves() {
        let pts = [
            Point2f::new(0.0, 0.0),
            Point2f::new(10.0, 0.0),
            Point2f::new(10.0, 10.0),
            Point2f::new(0.0, 10.0),
        ];
        let m = get_perspective_transform(&pts, &pts).unwrap();
        for p in &pts {
            let w = m[2][0] * p.x as f64 + m[2][1] * p.y as f64 + m[2][2];
            let u = (m[0][0] * p.x as f64 + m[0][1] * p.y as f64 + m[0][2]) / w;
            let v = (m[1][0] * p.x as f64 + m[1][1] * p.y as f64 + m[1][2]) / w;
            assert!((u - p.x as f64).abs() < 1e-6);
            assert!((v - p.y as f64).abs() < 1e-6);
        }
    }

    #[test]
    fn skewed_quad_maps_onto_rectangle_corners() {
        let src = [
            Point2f::new(12.0, 8.0),
            Point2f::new(95.0, 14.0),
            Point2f::new(90.0, 76.0),
            Point2f::new(8.0, 70.0),
        ];
        let dst = [
            Point2f::new(0.0, 0.0),
            Point2f::new(80.0, 0.0),
            Point2f::new(80.0, 60.0),
            Point2f::new(0.0, 60.0),
        ];
        let m = get_perspective_transform(&src, &dst).unwrap();
        for (s, d) in src.iter().zip(dst.iter()) {
            let w = m[2][0] * s.x as f64 + m[2][1] * s.y as f64 + m[2][2];
            let u = (m[0][0] * s.x as f64 + m[0][1] * s.y as f64 + m[0][2]) / w;
            let v = (m[1][0] * s.x as f64 + m[1][1] * s.y as f64 + m[1][2]) / w;
            assert!((u - d.x as f64).abs() < 1e-4);
            assert!((v - d.y as f64).abs() < 1e-4);
        }
    }

    #[test]
    fn warp_rejects_degenerate_canvas() {
        let mat = Mat::default();
        let m = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(warp_perspective(&mat, &m, Size::new(0, 10)).is_err());
    }
}
