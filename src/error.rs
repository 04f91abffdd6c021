#[derive(thiserror::Error, Debug)]
pub enum MeasureError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Degenerate geometry: {0}")]
    Geometry(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image processing error: {0}")]
    Image(String),
}

impl From<image::ImageError> for MeasureError {
    fn from(err: image::ImageError) -> Self {
        MeasureError::Image(err.to_string())
    }
}
