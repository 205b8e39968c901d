use anyhow::{Context, Result, bail};
use clap::Parser;
use image::GenericImageView;
use sectoral_histogram::core_modules::coordinate_mapper::CoordinateMapper;
use sectoral_histogram::core_modules::utils::image_helper::image_helper::save_rendered;
use sectoral_histogram::pipeline::{HistogramConfig, ReferenceCoordinate, SectorPipeline};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "bmp", "webp"];

#[derive(Parser, Debug)]
#[command(name = "sector_tester")]
#[command(version, about = "Render sectoral cumulative intensity histograms around a reference point")]
struct Cli {
    /// Input image (jpg, jpeg, png, tif, tiff, bmp, webp).
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the rendered histogram (PNG).
    #[arg(short, long)]
    output: PathBuf,

    /// Sector width in degrees. Overrides the config file.
    #[arg(short, long, value_name = "DEG")]
    angle_step: Option<f64>,

    /// Number of accumulation workers. Overrides the config file.
    #[arg(short = 'j', long, value_name = "N")]
    workers: Option<usize>,

    /// JSON file holding a HistogramConfig.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reference x in image pixels.
    #[arg(long, requires = "y", conflicts_with = "click", allow_hyphen_values = true)]
    x: Option<i64>,

    /// Reference y in image pixels.
    #[arg(long, requires = "x", allow_hyphen_values = true)]
    y: Option<i64>,

    /// Click position in display space. Needs --display.
    #[arg(long, value_name = "X,Y", requires = "display")]
    click: Option<String>,

    /// Size the image was shown at when clicked.
    #[arg(long, value_name = "WxH")]
    display: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // --- 1. Parameters ---
    check_extension(&cli.input)?;
    let config = load_config(&cli)?;
    let pipeline = SectorPipeline::new(config).context("invalid histogram configuration")?;

    // --- 2. Image & reference point ---
    let image = image::open(&cli.input)
        .with_context(|| format!("failed to open image {}", cli.input.display()))?;
    let (width, height) = image.dimensions();
    info!(width, height, path = %cli.input.display(), "image loaded");

    let reference = resolve_reference(&cli, width, height)?;
    info!(x = reference.x, y = reference.y, "reference coordinate");

    // --- 3. Compute & save ---
    let report = pipeline
        .compute(Arc::new(image), reference)
        .await
        .context("failed to compute sector histogram")?;

    save_rendered(&cli.output, &report.image)
        .with_context(|| format!("failed to save result to {}", cli.output.display()))?;

    info!(
        sectors = report.sector_count,
        elapsed_ms = report.elapsed.as_millis() as u64,
        path = %cli.output.display(),
        "result saved"
    );
    Ok(())
}

fn check_extension(path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        bail!(
            "unsupported image file {}: expected one of {}",
            path.display(),
            IMAGE_EXTENSIONS.join(", ")
        );
    }
    Ok(())
}

/// Config file (or defaults), then command-line overrides.
fn load_config(cli: &Cli) -> Result<HistogramConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => HistogramConfig::default(),
    };
    if let Some(angle_step) = cli.angle_step {
        config.angle_step = angle_step;
    }
    if let Some(workers) = cli.workers {
        config.worker_count = Some(workers);
    }
    Ok(config)
}

/// Explicit image coordinates win, then a mapped click, then the image center.
fn resolve_reference(cli: &Cli, width: u32, height: u32) -> Result<ReferenceCoordinate> {
    if let (Some(x), Some(y)) = (cli.x, cli.y) {
        return Ok(ReferenceCoordinate::new(x, y));
    }

    if let Some(click) = &cli.click {
        let display = cli.display.as_deref().context("--click needs --display WxH")?;
        let (display_width, display_height) = parse_pair(display, 'x')?;
        let (click_x, click_y) = parse_pair(click, ',')?;
        let mapper = CoordinateMapper::new(display_width, display_height, width, height)?;
        return Ok(mapper.map_to_image_space(click_x, click_y));
    }

    info!("no reference point given, using the image center");
    Ok(ReferenceCoordinate::new(
        i64::from(width / 2),
        i64::from(height / 2),
    ))
}

fn parse_pair(raw: &str, separator: char) -> Result<(f64, f64)> {
    let (first, second) = raw
        .split_once(separator)
        .with_context(|| format!("expected two numbers separated by '{separator}', got {raw:?}"))?;
    let parse = |value: &str| -> Result<f64> {
        value
            .trim()
            .parse()
            .with_context(|| format!("{value:?} is not a number"))
    };
    Ok((parse(first)?, parse(second)?))
}
