//! Image processor - metadata extraction and validation

use crate::metadata::ImageMetadata;
use crate::traits::MediaProcessor;
use async_trait::async_trait;
use image::{GenericImageView, ImageReader};
use std::io::Cursor;

pub struct ImageProcessor;

#[async_trait]
impl MediaProcessor for ImageProcessor {
    type Metadata = ImageMetadata;

    async fn extract_metadata(&self, data: &[u8]) -> Result<Self::Metadata, anyhow::Error> {
        let size_bytes = data.len() as u64;
        let data = data.to_vec();
        // Image decode is CPU-bound; run off the async pool to avoid blocking other tasks.
        tokio::task::spawn_blocking(move || -> Result<ImageMetadata, anyhow::Error> {
            let reader = ImageReader::new(Cursor::new(&data)).with_guessed_format()?;
            let format = reader
                .format()
                .map(|f| format!("{:?}", f))
                .unwrap_or_else(|| "unknown".to_string());
            let (width, height) = reader.into_dimensions()?;
            Ok(ImageMetadata {
                width,
                height,
                format,
                size_bytes: Some(size_bytes),
            })
        })
        .await?
    }

    fn validate(&self, data: &[u8]) -> Result<(), anyhow::Error> {
        let reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        reader.decode()?;
        Ok(())
    }

    fn get_dimensions(&self, data: &[u8]) -> Option<(u32, u32)> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .ok()?;
        let img = reader.decode().ok()?;
        Some(img.dimensions())
    }
}
