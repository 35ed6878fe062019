//! Imaging helper: a fan-out resizer that produces every named thumbnail
//! size from one decoded input, plus a single-shot resize used for ML
//! preprocessing. The decoder, encoders, and resampling itself are all
//! `image`/`webp`; only the external RAW decoder is out of scope.

use image::imageops::FilterType;
use image::{DynamicImage, ImageEncoder};
use lumilio_model::kind::ThumbnailSize;
use lumilio_model::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Webp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gravity {
    /// Preserve aspect ratio, bound the longest side.
    Fit,
    /// Crop to the target aspect ratio around the image center.
    CenterCrop,
}

#[derive(Debug, Clone, Copy)]
pub struct ResizeOptions {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: u8,
    pub gravity: Gravity,
}

/// One size's output. Empty when the encoder produced nothing worth
/// keeping; callers skip empty buffers rather than persist them.
pub type SizedBuffer = (ThumbnailSize, Vec<u8>);

/// Decodes `input` once and produces a JPEG buffer per
/// [`ThumbnailSize::RESIZABLE`] entry, longest side bounded, aspect
/// preserved. A failure resizing one size is reported but does not prevent
/// the others from being produced.
pub fn fan_out_thumbnails(input: &[u8]) -> Vec<Result<SizedBuffer>> {
    let decoded = match image::load_from_memory(input) {
        Ok(image) => image,
        Err(e) => {
            let message = format!("failed to decode source image: {e}");
            return ThumbnailSize::RESIZABLE
                .iter()
                .map(|_| {
                    Err(EngineError::TransientIo {
                        task: "generate_thumbnails".into(),
                        source: anyhow::anyhow!(message.clone()),
                    })
                })
                .collect();
        }
    };

    ThumbnailSize::RESIZABLE
        .iter()
        .map(|size| resize_one(&decoded, *size))
        .collect()
}

fn resize_one(decoded: &DynamicImage, size: ThumbnailSize) -> Result<SizedBuffer> {
    let bound = size
        .bound_px()
        .expect("RESIZABLE sizes always carry a bound");
    let resized = decoded.resize(bound, bound, FilterType::Lanczos3);

    let mut buffer = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, 90);
    encoder
        .write_image(
            resized.as_bytes(),
            resized.width(),
            resized.height(),
            resized.color().into(),
        )
        .map_err(|e| EngineError::TransientIo {
            task: "generate_thumbnails".into(),
            source: anyhow::anyhow!("failed to encode {size} thumbnail: {e}"),
        })?;

    Ok((size, buffer))
}

/// Single-shot resize for the ML preprocessing jobs (CLIP/OCR/Caption/Face):
/// one target size, format, quality, and crop strategy per call.
pub fn resize_single(input: &[u8], options: ResizeOptions) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(input).map_err(|e| EngineError::TransientIo {
        task: "clip_processing".into(),
        source: anyhow::anyhow!("failed to decode source image: {e}"),
    })?;

    let resized = match options.gravity {
        Gravity::Fit => decoded.resize(options.width, options.height, FilterType::Lanczos3),
        Gravity::CenterCrop => {
            decoded.resize_to_fill(options.width, options.height, FilterType::Lanczos3)
        }
    };

    let mut buffer = Vec::new();
    match options.format {
        OutputFormat::Jpeg => {
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, options.quality);
            encoder
                .write_image(
                    resized.as_bytes(),
                    resized.width(),
                    resized.height(),
                    resized.color().into(),
                )
                .map_err(encode_error)?;
        }
        OutputFormat::Webp => {
            let encoder = webp::Encoder::from_image(&resized).map_err(|e| {
                EngineError::Internal(format!("failed to build WEBP encoder: {e}"))
            })?;
            let encoded = encoder.encode(options.quality as f32);
            buffer.extend_from_slice(&encoded);
        }
    }

    Ok(buffer)
}

fn encode_error(e: image::ImageError) -> EngineError {
    EngineError::TransientIo {
        task: "clip_processing".into(),
        source: anyhow::anyhow!("failed to encode resized image: {e}"),
    }
}

/// The fixed preprocessing table from the ML fan-out stage.
pub fn clip_options() -> ResizeOptions {
    ResizeOptions {
        width: 224,
        height: 224,
        format: OutputFormat::Webp,
        quality: 90,
        gravity: Gravity::CenterCrop,
    }
}

pub fn ocr_options() -> ResizeOptions {
    ResizeOptions {
        width: 1920,
        height: 1920,
        format: OutputFormat::Jpeg,
        quality: 90,
        gravity: Gravity::Fit,
    }
}

pub fn caption_options() -> ResizeOptions {
    ResizeOptions {
        width: 1024,
        height: 1024,
        format: OutputFormat::Jpeg,
        quality: 85,
        gravity: Gravity::Fit,
    }
}

pub fn face_options() -> ResizeOptions {
    ResizeOptions {
        width: 1920,
        height: 1920,
        format: OutputFormat::Jpeg,
        quality: 90,
        gravity: Gravity::Fit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::new_rgb8(width, height);
        let mut buffer = Vec::new();
        image
            .write_to(&mut std::io::Cursor::new(&mut buffer), image::ImageFormat::Jpeg)
            .unwrap();
        buffer
    }

    #[test]
    fn fan_out_produces_three_sizes() {
        let input = sample_jpeg(3000, 2000);
        let outputs = fan_out_thumbnails(&input);
        assert_eq!(outputs.len(), 3);
        for output in outputs {
            let (_, bytes) = output.expect("resize should succeed for a valid image");
            assert!(!bytes.is_empty());
        }
    }

    #[test]
    fn invalid_input_fails_every_size_without_panicking() {
        let outputs = fan_out_thumbnails(b"not an image");
        assert_eq!(outputs.len(), 3);
        assert!(outputs.iter().all(|o| o.is_err()));
    }

    #[test]
    fn clip_resize_center_crops_to_square() {
        let input = sample_jpeg(400, 200);
        let resized = resize_single(&input, clip_options()).unwrap();
        let decoded = image::load_from_memory(&resized).unwrap();
        assert_eq!(decoded.width(), 224);
        assert_eq!(decoded.height(), 224);
    }
}
