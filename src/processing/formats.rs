//! Image format detection and encoding

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::DynamicImage;

use crate::config::ImageFormat;
use crate::error::Result;

/// Detect image format from a file name suffix.
///
/// Matches on the whole name rather than `Path::extension`, so a file called
/// just `.png` is still picked up.
pub fn detect_format_from_name(file_name: &str) -> Option<ImageFormat> {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        Some(ImageFormat::Jpeg)
    } else if lower.ends_with(".png") {
        Some(ImageFormat::Png)
    } else {
        None
    }
}

/// Map the configured quality onto what the encoder accepts
pub fn encoding_quality(format: ImageFormat, target_quality: u8) -> u8 {
    match format {
        // The JPEG quantizer divides by quality, so 0 is treated as 1
        ImageFormat::Jpeg => target_quality.clamp(1, 100),
        // PNG is lossless and always written at maximum compression
        ImageFormat::Png => 100,
    }
}

/// Encode an image into memory.
///
/// JPEG honours `quality`; images with alpha or 16-bit channels are flattened
/// to 8-bit RGB (or luma) first since baseline JPEG cannot store them. PNG is
/// written with the best compression level and adaptive filtering.
pub fn encode_image(image: &DynamicImage, format: ImageFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());

    match format {
        ImageFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buf, encoding_quality(format, quality));
            match image {
                DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => {
                    image.write_with_encoder(encoder)?
                }
                _ if image.color().has_color() => {
                    DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?
                }
                _ => DynamicImage::ImageLuma8(image.to_luma8()).write_with_encoder(encoder)?,
            }
        }
        ImageFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut buf,
                CompressionType::Best,
                PngFilterType::Adaptive,
            );
            image.write_with_encoder(encoder)?;
        }
    }

    Ok(buf.into_inner())
}
