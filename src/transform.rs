//! Maps point coordinates between an original image frame and the frame
//! produced by mirroring and/or rotating that image, plus the raster-side
//! counterpart. Both sides share one convention: mirror first, then rotate.

use serde::{Deserialize, Serialize};

use crate::error::MeasureError;
use crate::image_impl::{Mat, Point2f};

/// Quarter-turn rotation applied to a captured image.
///
/// `Deg90` maps a point via `x' = y, y' = width - 1 - x`; the matching
/// raster operation is selected so the coordinate map and the image
/// transform can never disagree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Rotation {
    #[default]
    None,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn from_degrees(degrees: i32) -> Result<Self, MeasureError> {
        match degrees {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(MeasureError::InvalidConfig(format!(
                "rotation must be one of 0, 90, 180, 270, got {other}"
            ))),
        }
    }

    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// Whether this rotation swaps the image's width and height.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

impl TryFrom<i32> for Rotation {
    type Error = MeasureError;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> i32 {
        rotation.degrees()
    }
}

/// The rigid transform applied to a captured image before measurement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transformation {
    pub mirrored: bool,
    pub rotation: Rotation,
}

impl Transformation {
    pub fn new(mirrored: bool, rotation: Rotation) -> Self {
        Self { mirrored, rotation }
    }

    pub fn is_identity(&self) -> bool {
        !self.mirrored && self.rotation == Rotation::None
    }
}

/// Re-expresses a point captured on the original image in the frame of the
/// transformed image. `width`/`height` are the original image's dimensions.
pub fn map_point(p: Point2f, width: u32, height: u32, t: &Transformation) -> Point2f {
    let w = width as f32;
    let h = height as f32;

    let mirrored = if t.mirrored {
        Point2f::new(w - 1.0 - p.x, p.y)
    } else {
        p
    };

    match t.rotation {
        Rotation::None => mirrored,
        Rotation::Deg90 => Point2f::new(mirrored.y, w - 1.0 - mirrored.x),
        Rotation::Deg180 => Point2f::new(w - 1.0 - mirrored.x, h - 1.0 - mirrored.y),
        Rotation::Deg270 => Point2f::new(h - 1.0 - mirrored.y, mirrored.x),
    }
}

/// Algebraic inverse of [`map_point`]: takes a point in the transformed
/// frame back to the original frame. `width`/`height` are still the
/// original image's dimensions.
pub fn unmap_point(p: Point2f, width: u32, height: u32, t: &Transformation) -> Point2f {
    let w = width as f32;
    let h = height as f32;

    let unrotated = match t.rotation {
        Rotation::None => p,
        Rotation::Deg90 => Point2f::new(w - 1.0 - p.y, p.x),
        Rotation::Deg180 => Point2f::new(w - 1.0 - p.x, h - 1.0 - p.y),
        Rotation::Deg270 => Point2f::new(p.y, h - 1.0 - p.x),
    };

    if t.mirrored {
        Point2f::new(w - 1.0 - unrotated.x, unrotated.y)
    } else {
        unrotated
    }
}

/// Raster counterpart of [`map_point`]: horizontal flip first, then the
/// quarter-turn whose pixel mapping matches the point formulas.
pub fn apply_to_image(image: &Mat, t: &Transformation) -> Mat {
    let flipped = if t.mirrored { image.fliph() } else { image.clone() };

    match t.rotation {
        Rotation::None => flipped,
        // (x, y) -> (y, w - 1 - x) is a counter-clockwise quarter turn.
        Rotation::Deg90 => flipped.rotate270(),
        Rotation::Deg180 => flipped.rotate180(),
        // (x, y) -> (h - 1 - y, x) is a clockwise quarter turn.
        Rotation::Deg270 => flipped.rotate90(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage};

    const WIDTH: u32 = 9;
    const HEIGHT: u32 = 7;

    fn all_transformations() -> Vec<Transformation> {
        let mut out = Vec::new();
        for mirrored in [false, true] {
            for degrees in [0, 90, 180, 270] {
                out.push(Transformation::new(
                    mirrored,
                    Rotation::from_degrees(degrees).unwrap(),
                ));
            }
        }
        out
    }

    #[test]
    fn out_of_enum_rotation_is_rejected() {
        assert!(matches!(
            Rotation::from_degrees(45),
            Err(MeasureError::InvalidConfig(_))
        ));
        assert!(Rotation::from_degrees(-90).is_err());
    }

    #[test]
    fn rotation_formulas_match_the_documented_mapping() {
        let t90 = Transformation::new(false, Rotation::Deg90);
        let p = map_point(Point2f::new(2.0, 1.0), WIDTH, HEIGHT, &t90);
        assert_eq!(p, Point2f::new(1.0, 6.0));

        let t180 = Transformation::new(false, Rotation::Deg180);
        let p = map_point(Point2f::new(2.0, 1.0), WIDTH, HEIGHT, &t180);
        assert_eq!(p, Point2f::new(6.0, 5.0));

        let t270 = Transformation::new(false, Rotation::Deg270);
        let p = map_point(Point2f::new(2.0, 1.0), WIDTH, HEIGHT, &t270);
        assert_eq!(p, Point2f::new(5.0, 2.0));
    }

    #[test]
    fn map_then_unmap_round_trips() {
        for t in all_transformations() {
            for (x, y) in [(0.0, 0.0), (2.0, 1.0), (8.0, 6.0), (4.0, 3.0)] {
                let p = Point2f::new(x, y);
                let forward = map_point(p, WIDTH, HEIGHT, &t);
                let back = unmap_point(forward, WIDTH, HEIGHT, &t);
                assert_eq!(back, p, "round trip failed for {t:?}");
            }
        }
    }

    #[test]
    fn point_map_agrees_with_raster_transform() {
        for t in all_transformations() {
            let mut img = RgbImage::new(WIDTH, HEIGHT);
            img.put_pixel(2, 1, Rgb([255, 0, 0]));
            let mat = Mat::new(DynamicImage::ImageRgb8(img));

            let transformed = apply_to_image(&mat, &t);
            let p = map_point(Point2f::new(2.0, 1.0), WIDTH, HEIGHT, &t);

            if t.rotation.swaps_axes() {
                assert_eq!(transformed.cols() as u32, HEIGHT);
                assert_eq!(transformed.rows() as u32, WIDTH);
            } else {
                assert_eq!(transformed.cols() as u32, WIDTH);
                assert_eq!(transformed.rows() as u32, HEIGHT);
            }

            let pixel = transformed.get_pixel(p.x as u32, p.y as u32);
            assert_eq!(pixel, [255, 0, 0], "raster/point drift for {t:?}");
        }
    }

    #[test]
    fn rotation_serializes_as_degrees() {
        let t = Transformation::new(true, Rotation::Deg270);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, r#"{"mirrored":true,"rotation":270}"#);

        let parsed: Transformation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, t);

        assert!(serde_json::from_str::<Transformation>(r#"{"rotation":45}"#).is_err());
    }
}
