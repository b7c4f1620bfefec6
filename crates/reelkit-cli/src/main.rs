//! Reelkit CLI: run the media-authoring pipeline on local files.
//!
//! Videos are decoded by the software host, which plays animated GIFs.
//! Configuration comes from REELKIT_* environment variables (or `.env`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use reelkit_cli::{
    init_tracing, load_batch, load_file, parse_adjustment, parse_aspect, parse_crop, submit_files,
    write_file,
};
use reelkit_core::models::{FilterPreset, MediaAsset, MediaFile, TrimWindow};
use reelkit_core::PipelineConfig;
use reelkit_processing::session::{self, CropFrame};
use reelkit_processing::{
    probe_video, CreationMode, ExportPipeline, FilmstripGenerator, HandleRegistry, Ingestor,
    SoftwareHost, TrimOutcome, TrimRequest, VideoTrimEngine,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Side of the square viewport image crops are framed in.
const CROP_VIEWPORT: f64 = 1080.0;

#[derive(Parser)]
#[command(name = "reelkit", about = "Client-side media authoring pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List filter presets and their base expressions
    Filters,
    /// Validate and probe files as a creation batch
    Probe {
        files: Vec<PathBuf>,
        /// Creation mode: post, reel or ad
        #[arg(long, default_value = "post")]
        mode: String,
        /// Treat GIFs as still images instead of clips
        #[arg(long)]
        gif_stills: bool,
    },
    /// Crop, filter and re-encode an image
    Image {
        input: PathBuf,
        /// Aspect ratio: 1:1, 4:5, 16:9, 9:16, original, W:H or a decimal
        #[arg(long, default_value = "original")]
        aspect: String,
        #[arg(long, default_value = "1.0")]
        zoom: f64,
        /// Horizontal pan in viewport pixels
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pan_x: f64,
        /// Vertical pan in viewport pixels
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pan_y: f64,
        #[arg(long, default_value = "Normal")]
        filter: String,
        /// Adjustment as name=value (repeatable)
        #[arg(long = "adjust")]
        adjustments: Vec<String>,
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Sample a clip into filmstrip thumbnails
    Filmstrip {
        input: PathBuf,
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Trim and crop a clip
    Trim {
        input: PathBuf,
        #[arg(long)]
        start: f64,
        #[arg(long)]
        end: f64,
        /// Native crop as x,y,width,height
        #[arg(long)]
        crop: Option<String>,
        #[arg(long)]
        mute: bool,
        #[arg(long, default_value = "out")]
        out: PathBuf,
    },
    /// Export and "upload" a batch into a directory
    Submit {
        files: Vec<PathBuf>,
        #[arg(long, default_value = "post")]
        mode: String,
        /// Treat GIFs as still images instead of clips
        #[arg(long)]
        gif_stills: bool,
        /// Destination directory standing in for the upload service
        #[arg(long)]
        dest: PathBuf,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Load a clip as a video asset regardless of its declared type.
async fn load_clip(
    host: &SoftwareHost,
    registry: &HandleRegistry,
    path: &Path,
) -> anyhow::Result<MediaAsset> {
    let file = load_file(path, None).await?;
    let metadata = probe_video(host, registry, &file)
        .await
        .with_context(|| format!("Failed to probe {}", path.display()))?;
    Ok(MediaAsset::new_video(
        file,
        metadata.width,
        metadata.height,
        metadata.duration,
    )?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = PipelineConfig::from_env().context("Invalid REELKIT_* configuration")?;
    let host = SoftwareHost::new();
    let registry = HandleRegistry::new();

    let cli = Cli::parse();

    match cli.command {
        Commands::Filters => {
            let presets: Vec<_> = FilterPreset::ALL
                .iter()
                .map(|preset| {
                    serde_json::json!({
                        "name": preset.name(),
                        "expression": preset.base_expression(),
                    })
                })
                .collect();
            print_json(&presets)?;
        }
        Commands::Probe {
            files,
            mode,
            gif_stills,
        } => {
            let mode = CreationMode::parse(&mode)?;
            let ingestor = Ingestor::from_config(Arc::new(host), registry, mode, &config);
            let report = ingestor.ingest_batch(load_batch(&files, gif_stills).await?).await;
            let accepted: Vec<_> = report
                .assets
                .iter()
                .map(|asset| {
                    serde_json::json!({
                        "file_name": asset.source().file_name,
                        "kind": asset.kind(),
                        "width": asset.native_width(),
                        "height": asset.native_height(),
                        "duration": asset.video().map(|v| v.duration_seconds()),
                    })
                })
                .collect();
            print_json(&serde_json::json!({
                "accepted": accepted,
                "rejected": report.rejected,
            }))?;
        }
        Commands::Image {
            input,
            aspect,
            zoom,
            pan_x,
            pan_y,
            filter,
            adjustments,
            out,
        } => {
            let ingestor = Ingestor::from_config(
                Arc::new(host.clone()),
                registry.clone(),
                CreationMode::Post,
                &config,
            );
            let mut asset = ingestor.ingest(load_file(&input, None).await?).await?;
            let aspect = parse_aspect(&aspect)?.unwrap_or_else(|| asset.native_aspect());
            let frame = CropFrame::fit(CROP_VIEWPORT, CROP_VIEWPORT, aspect)
                .context("Aspect ratio leaves no crop frame")?;

            session::set_target_aspect(&mut asset, aspect, frame)?;
            session::set_zoom(&mut asset, zoom, frame);
            session::pan_by(&mut asset, pan_x, pan_y, frame);
            session::confirm_image_crop(&mut asset, frame)?;

            let preset = FilterPreset::parse(&filter)
                .with_context(|| format!("Unknown filter '{}'", filter))?;
            asset.set_filter(preset);
            for raw in &adjustments {
                let (adjustment, value) = parse_adjustment(raw)?;
                asset.set_adjustment(adjustment, value);
            }

            let pipeline = ExportPipeline::from_config(Arc::new(host), registry, &config);
            let exported = pipeline.export_asset(&asset, |_| {}).await;
            let path = write_file(&out, &exported.file).await?;
            tracing::info!(path = %path.display(), "Image written");
            print_json(&exported.summary())?;
        }
        Commands::Filmstrip { input, out } => {
            let mut asset = load_clip(&host, &registry, &input).await?;
            let generator = FilmstripGenerator::new(Arc::new(host), registry, config);
            generator.generate(&mut asset).await?;

            let stem = asset.source().stem().to_string();
            let mut written = Vec::new();
            if let Some(frames) = asset.video().and_then(|v| v.thumbnail_frames()) {
                for frame in frames {
                    let file = MediaFile::new(
                        format!("{}_thumb_{:02}.jpg", stem, frame.index),
                        "image/jpeg",
                        frame.bytes.clone(),
                    );
                    written.push(serde_json::json!({
                        "path": write_file(&out, &file).await?,
                        "time_seconds": frame.time_seconds,
                        "width": frame.width,
                        "height": frame.height,
                    }));
                }
            }
            print_json(&written)?;
        }
        Commands::Trim {
            input,
            start,
            end,
            crop,
            mute,
            out,
        } => {
            let asset = load_clip(&host, &registry, &input).await?;
            let request = TrimRequest {
                trim: TrimWindow::new(start, end),
                crop: crop.as_deref().map(parse_crop).transpose()?,
                sound_enabled: !mute,
            };
            let engine = VideoTrimEngine::new(Arc::new(host), registry, config);
            let mut last_reported = 0u8;
            let outcome = engine
                .trim(asset.source(), request, |p| {
                    let step = (p / 10.0).floor() as u8;
                    if step > last_reported {
                        last_reported = step;
                        tracing::info!(progress = p.round(), "Trimming");
                    }
                })
                .await;

            let path = write_file(&out, outcome.file()).await?;
            let summary = match &outcome {
                TrimOutcome::Encoded {
                    width,
                    height,
                    crop_applied,
                    mime_type,
                    ..
                } => serde_json::json!({
                    "path": path,
                    "encoded": true,
                    "width": width,
                    "height": height,
                    "crop_applied": crop_applied,
                    "mime_type": mime_type,
                }),
                TrimOutcome::Passthrough { reason, .. } => serde_json::json!({
                    "path": path,
                    "encoded": false,
                    "reason": reason.to_string(),
                }),
            };
            print_json(&summary)?;
        }
        Commands::Submit {
            files,
            mode,
            gif_stills,
            dest,
        } => {
            let mode = CreationMode::parse(&mode)?;
            let submission = submit_files(&files, mode, gif_stills, &dest, &config).await?;
            print_json(&submission)?;
        }
    }

    Ok(())
}
