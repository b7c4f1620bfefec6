use anyhow::{bail, Context};
use async_trait::async_trait;
use reelkit_core::models::{Adjustment, AspectRatioLabel, MediaFile, PixelRect};
use reelkit_core::PipelineConfig;
use reelkit_processing::{
    CreationMode, EditSession, ExportPipeline, FilmstripGenerator, HandleRegistry, Ingestor,
    SoftwareHost, Submission, SubmissionPipeline, UploadError, Uploader,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// MIME type for a file path, from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// MIME type for a file in a creation batch. The software host plays
/// animated GIFs, so they are declared as clips unless `gif_stills` is set.
pub fn batch_mime_for_path(path: &Path, gif_stills: bool) -> &'static str {
    match mime_for_path(path) {
        "image/gif" if !gif_stills => "video/gif",
        mime => mime,
    }
}

/// Read a file from disk into a [`MediaFile`].
pub async fn load_file(path: &Path, mime_type: Option<&str>) -> anyhow::Result<MediaFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("media")
        .to_string();
    let mime_type = mime_type.unwrap_or_else(|| mime_for_path(path));
    Ok(MediaFile::new(file_name, mime_type, bytes))
}

/// Read every file of a creation batch.
pub async fn load_batch(paths: &[PathBuf], gif_stills: bool) -> anyhow::Result<Vec<MediaFile>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        files.push(load_file(path, Some(batch_mime_for_path(path, gif_stills))).await?);
    }
    Ok(files)
}

/// Write `file` into `dir` under its own name and return the path.
pub async fn write_file(dir: &Path, file: &MediaFile) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(&file.file_name);
    tokio::fs::write(&path, &file.bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Parse an aspect ratio: a label ("1:1", "portrait"), "W:H" or a decimal.
/// `original` yields `None`.
pub fn parse_aspect(s: &str) -> anyhow::Result<Option<f64>> {
    if let Some(label) = AspectRatioLabel::parse(s) {
        return match (label, label.ratio()) {
            (_, Some(ratio)) => Ok(Some(ratio)),
            (AspectRatioLabel::Original, None) => Ok(None),
            _ => bail!("Aspect '{}' has no fixed ratio", s),
        };
    }
    let ratio = match s.split_once(':') {
        Some((w, h)) => {
            let w: f64 = w.trim().parse().context("Invalid aspect width")?;
            let h: f64 = h.trim().parse().context("Invalid aspect height")?;
            w / h
        }
        None => s.trim().parse().context("Invalid aspect ratio")?,
    };
    if !(ratio.is_finite() && ratio > 0.0) {
        bail!("Aspect ratio must be positive, got '{}'", s);
    }
    Ok(Some(ratio))
}

/// Parse a crop rectangle given as `x,y,width,height`.
pub fn parse_crop(s: &str) -> anyhow::Result<PixelRect> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Invalid crop '{}', expected x,y,width,height", s))?;
    match parts.as_slice() {
        [x, y, width, height] if *width > 0 && *height > 0 => {
            Ok(PixelRect::new(*x, *y, *width, *height))
        }
        _ => bail!("Invalid crop '{}', expected x,y,width,height", s),
    }
}

/// Parse an adjustment given as `name=value`.
pub fn parse_adjustment(s: &str) -> anyhow::Result<(Adjustment, i32)> {
    let (name, value) = s
        .split_once('=')
        .with_context(|| format!("Invalid adjustment '{}', expected name=value", s))?;
    let adjustment = Adjustment::parse(name)
        .with_context(|| format!("Unknown adjustment '{}'", name.trim()))?;
    let value = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}", name.trim()))?;
    Ok((adjustment, value))
}

/// Uploader that "publishes" into a local directory.
pub struct DirectoryUploader {
    root: PathBuf,
}

impl DirectoryUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Uploader for DirectoryUploader {
    async fn upload(&self, file: &MediaFile) -> Result<String, UploadError> {
        let path = write_file(&self.root, file)
            .await
            .map_err(|e| UploadError::Network(format!("{:#}", e)))?;
        Ok(format!("file://{}", path.display()))
    }
}

/// Ingest, prepare, export and upload a batch into `dest`.
pub async fn submit_files(
    paths: &[PathBuf],
    mode: CreationMode,
    gif_stills: bool,
    dest: &Path,
    config: &PipelineConfig,
) -> anyhow::Result<Submission> {
    let host = Arc::new(SoftwareHost::new());
    let registry = HandleRegistry::new();
    let ingestor = Ingestor::from_config(host.clone(), registry.clone(), mode, config);
    let report = ingestor.ingest_batch(load_batch(paths, gif_stills).await?).await;
    for rejected in &report.rejected {
        tracing::warn!(
            file_name = %rejected.file_name,
            reason = %rejected.reason,
            "Skipped"
        );
    }

    let mut session = EditSession::from_report(registry.clone(), report);
    let generator = FilmstripGenerator::new(host.clone(), registry.clone(), config.clone());
    for (asset_id, error) in session.prepare_filmstrips(&generator).await {
        tracing::warn!(%asset_id, %error, "No filmstrip");
    }

    let pipeline = SubmissionPipeline::new(
        ExportPipeline::from_config(host, registry, config),
        DirectoryUploader::new(dest),
    );
    let result = pipeline.submit(session.assets(), |_| {}).await;
    session.close();
    match result {
        Ok(submission) => Ok(submission),
        Err(failure) => bail!("{} (retryable: {})", failure.message, failure.retryable),
    }
}
