use anyhow::anyhow;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::RgbImage;
use reelkit_core::PipelineError;

/// Output format for encoded stills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, PipelineError> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            _ => Err(PipelineError::InvalidInput(format!("Invalid format: {}", s))),
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
        }
    }
}

/// An encoded still with its pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub bytes: Bytes,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

impl EncodedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

pub struct ImageCompressor;

impl ImageCompressor {
    /// Encode an opaque RGB surface in `format`. `quality` only applies to
    /// JPEG.
    pub fn encode(
        img: &RgbImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<EncodedImage, PipelineError> {
        match format {
            OutputFormat::Jpeg => Self::encode_jpeg(img, quality),
            OutputFormat::Png => Self::encode_png(img),
        }
    }

    /// Encode an opaque RGB surface as baseline JPEG.
    pub fn encode_jpeg(img: &RgbImage, quality: u8) -> Result<EncodedImage, PipelineError> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::Encoding(
                "Cannot encode an empty surface".to_string(),
            ));
        }
        let mut buffer = Vec::with_capacity((width * height / 4) as usize);
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        img.write_with_encoder(encoder)
            .map_err(|e| PipelineError::EncodingWithSource {
                message: format!("JPEG encode of {}x{} surface failed", width, height),
                source: anyhow!(e),
            })?;

        Ok(EncodedImage {
            bytes: Bytes::from(buffer),
            width,
            height,
            format: OutputFormat::Jpeg,
        })
    }

    pub fn encode_png(img: &RgbImage) -> Result<EncodedImage, PipelineError> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::Encoding(
                "Cannot encode an empty surface".to_string(),
            ));
        }
        let mut buffer = Vec::new();
        img.write_with_encoder(PngEncoder::new(&mut buffer))
            .map_err(|e| PipelineError::EncodingWithSource {
                message: format!("PNG encode of {}x{} surface failed", width, height),
                source: anyhow!(e),
            })?;

        Ok(EncodedImage {
            bytes: Bytes::from(buffer),
            width,
            height,
            format: OutputFormat::Png,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JPG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("png").unwrap(), OutputFormat::Png);
        assert!(OutputFormat::parse("tiff").is_err());
    }

    #[test]
    fn test_encode_jpeg() {
        let img = RgbImage::from_pixel(64, 32, Rgb([200, 10, 10]));
        let encoded = ImageCompressor::encode_jpeg(&img, 92).unwrap();
        assert_eq!((encoded.width, encoded.height), (64, 32));
        assert_eq!(encoded.mime_type(), "image/jpeg");
        // SOI marker
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&encoded.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_encode_empty_surface_fails() {
        let img = RgbImage::new(0, 0);
        assert!(matches!(
            ImageCompressor::encode_jpeg(&img, 92),
            Err(PipelineError::Encoding(_))
        ));
    }

    #[test]
    fn test_encode_png_dispatch() {
        let img = RgbImage::from_pixel(3, 5, Rgb([1, 2, 3]));
        let encoded = ImageCompressor::encode(&img, OutputFormat::Png, 10).unwrap();
        assert_eq!(encoded.format, OutputFormat::Png);
        assert_eq!(
            image::guess_format(&encoded.bytes).unwrap(),
            ImageFormat::Png
        );
    }
}
