//! sfx-trim - trim a sound file from the command line
//!
//! Drives the same pipeline the upload form uses: decode, select a region,
//! wait for the debounced recompute, submit, and write the MP3.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sfx_common::human_time::{format_time_field, parse_time_field};
use sfx_trim::config::TomlConfig;
use sfx_trim::trim::{NoCapture, TrimController, TrimUpdate};
use sfx_trim::{FfmpegTranscoder, SymphoniaDecoder, TrimPipeline};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for sfx-trim
#[derive(Parser, Debug)]
#[command(name = "sfx-trim")]
#[command(about = "Trim a sound effect and encode it as MP3")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (", env!("GIT_HASH"), ", ", env!("BUILD_PROFILE"), ", built ", env!("BUILD_TIMESTAMP"), ")"
))]
struct Args {
    /// Source audio file (mp3, wav, flac, ogg, m4a, aac)
    input: PathBuf,

    /// Region start ("2.5", "2.5s", "1:02.5")
    #[arg(short, long)]
    start: Option<String>,

    /// Region end, same formats as --start
    #[arg(short, long)]
    end: Option<String>,

    /// Title used for the output file name (defaults to the input file name)
    #[arg(short, long)]
    title: Option<String>,

    /// Output path (defaults to the suggested name in the current directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (overrides SFX_TRIM_CONFIG and the platform default)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = TomlConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "sfx_trim={level},sfx_common={level}",
                    level = config.logging.level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        input = %args.input.display(),
        "Starting sfx-trim"
    );

    let bytes = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let file_name = args
        .input
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();

    let pipeline = TrimPipeline::spawn(
        Arc::new(SymphoniaDecoder::new()),
        Arc::new(FfmpegTranscoder::new(&config.encoder)),
        config.trim.clone(),
    );

    let source = pipeline
        .load_source(bytes, "application/octet-stream", &file_name)
        .await
        .with_context(|| format!("Failed to decode {}", args.input.display()))?;

    let mut controller = TrimController::new(source.duration_secs, 1.0, &config.trim, NoCapture);
    let start = parse_bound(args.start.as_deref(), 0.0).context("Invalid --start")?;
    let end = parse_bound(args.end.as_deref(), source.duration_secs).context("Invalid --end")?;

    if let TrimUpdate::Region(region) = controller.set_region(start, end) {
        pipeline
            .update_region(source.generation, region)
            .await
            .context("Failed to apply region")?;
    }

    let region = controller.region();
    info!(
        start = %format_time_field(region.start(), source.duration_secs),
        end = %format_time_field(region.end(), source.duration_secs),
        "Trimming"
    );

    let title = args
        .title
        .clone()
        .unwrap_or_else(|| file_stem(&args.input));
    let asset = pipeline.submit(&title).await.context("Failed to encode trimmed audio")?;

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&asset.suggested_name));
    tokio::fs::write(&output, &asset.bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(output = %output.display(), bytes = asset.bytes.len(), "Done");
    println!("{}", output.display());
    Ok(())
}

fn parse_bound(text: Option<&str>, default: f64) -> Result<f64> {
    match text {
        Some(text) => Ok(parse_time_field(text)?),
        None => Ok(default),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}
