use clap::{Parser, ValueEnum};
use framecal::{
    imwrite, EdgeDetectionSettings, FrameCal, FrameSpec, MeasureConfig, MeasureReport,
    MeasureRequest, Point2f, Rotation, Transformation,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "framecal")]
#[command(about = "FrameCal - measure objects photographed inside a known reference frame", long_about = None)]
struct Cli {
    /// Input image path
    image: PathBuf,

    /// Frame corner pixels as "x1,y1,x2,y2,x3,y3,x4,y4" (any corner order)
    #[arg(long)]
    corners: String,

    /// Real frame width in mm
    #[arg(long)]
    width_mm: f32,

    /// Real frame height in mm
    #[arg(long)]
    height_mm: f32,

    /// Rotation applied to the captured image (0, 90, 180 or 270 degrees)
    #[arg(long, default_value_t = 0)]
    rotation: i32,

    /// Mirror the captured image horizontally before rotation
    #[arg(long)]
    mirrored: bool,

    /// Gaussian blur kernel size (odd)
    #[arg(long, default_value_t = 5)]
    blur_kernel: u32,

    /// Lower Canny threshold
    #[arg(long, default_value_t = 30.0)]
    canny_low: f32,

    /// Upper Canny threshold
    #[arg(long, default_value_t = 130.0)]
    canny_high: f32,

    /// Morphological closing kernel size (odd)
    #[arg(long, default_value_t = 5)]
    morph_kernel: u32,

    /// Minimum contour area in px^2
    #[arg(long, default_value_t = 1000.0)]
    min_area: f32,

    /// Circularity threshold for circle classification
    #[arg(long, default_value_t = 0.85)]
    circle_threshold: f32,

    /// Reference coin diameter in mm
    #[arg(long, default_value_t = 23.25)]
    coin_diameter: f32,

    /// Write the rectified image to this path
    #[arg(long)]
    save_rectified: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    /// JSON report with full details
    Json,
    /// Plain text, one line per contour
    Text,
}

fn parse_corners(raw: &str) -> Result<Vec<Point2f>, String> {
    let values: Result<Vec<f32>, _> = raw
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect();
    let values = values.map_err(|e| format!("invalid corner value: {e}"))?;
    if values.len() != 8 {
        return Err(format!(
            "expected 8 comma-separated values (4 corners), got {}",
            values.len()
        ));
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| Point2f::new(pair[0], pair[1]))
        .collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let corners = parse_corners(&cli.corners)?;

    let request = MeasureRequest {
        corners,
        frame: FrameSpec::new(cli.width_mm, cli.height_mm),
        transformation: Transformation::new(cli.mirrored, Rotation::from_degrees(cli.rotation)?),
        edge_settings: EdgeDetectionSettings {
            blur_kernel_size: (cli.blur_kernel, cli.blur_kernel),
            canny_low: cli.canny_low,
            canny_high: cli.canny_high,
            morph_kernel_size: (cli.morph_kernel, cli.morph_kernel),
        },
        config: MeasureConfig {
            min_contour_area: cli.min_area,
            circle_threshold: cli.circle_threshold,
            coin_diameter_mm: cli.coin_diameter,
        },
    };

    let framecal = FrameCal::new(request);
    let output = framecal.measure_file(&cli.image)?;

    if let Some(path) = &cli.save_rectified {
        imwrite(path, &output.rectified.image)?;
    }

    let report = MeasureReport::from_output(&output, &framecal.request().config);

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!(
                "ratios: {:.4} x {:.4} px/mm, canvas: {}x{} px",
                report.x_ratio,
                report.y_ratio,
                report.rectified_width_px,
                report.rectified_height_px
            );
            for c in &report.contours {
                let kind = if c.is_circle { "circle" } else { "shape" };
                println!(
                    "#{} {}: area {:.0} px^2, circularity {:.3}",
                    c.index, kind, c.area_px, c.circularity
                );
            }
            if let (Some(index), Some(ratio)) = (report.coin_index, report.coin_px_per_mm) {
                println!("coin: contour #{index}, {ratio:.4} px/mm");
            }
        }
    }

    Ok(())
}
