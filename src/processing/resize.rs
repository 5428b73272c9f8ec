//! Width-limited resize planning and resampling

use std::fmt;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, OptimizerError};

/// Pixel dimensions of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of a decoded image
    pub fn of(image: &DynamicImage) -> Self {
        Self::new(image.width(), image.height())
    }

    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Available resize filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Nearest neighbor (fastest, lowest quality)
    Nearest,
    /// Triangle (linear interpolation)
    Triangle,
    /// Catmull-Rom cubic spline
    CatmullRom,
    /// Gaussian blur
    Gaussian,
    /// Lanczos with radius 3 (high quality, recommended)
    #[default]
    Lanczos3,
}

impl From<FilterType> for image::imageops::FilterType {
    fn from(filter: FilterType) -> Self {
        match filter {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Triangle => image::imageops::FilterType::Triangle,
            FilterType::CatmullRom => image::imageops::FilterType::CatmullRom,
            FilterType::Gaussian => image::imageops::FilterType::Gaussian,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Work out the target size for an image limited to `max_width`.
///
/// Returns `None` when the image is already narrow enough. Otherwise the
/// width becomes `max_width` and the height `floor(height * max_width / width)`,
/// never less than one pixel.
pub fn plan_resize(width: u32, height: u32, max_width: u32) -> Result<Option<Dimensions>> {
    if max_width == 0 {
        return Err(OptimizerError::invalid_parameters(
            "Maximum width must be greater than 0",
        ));
    }
    if width == 0 || height == 0 {
        return Err(OptimizerError::invalid_parameters(format!(
            "Image has no pixels ({}x{})",
            width, height
        )));
    }

    if width <= max_width {
        return Ok(None);
    }

    // Exact integer floor; the result is < height so it always fits in u32
    let new_height = u64::from(height) * u64::from(max_width) / u64::from(width);
    let new_height = u32::try_from(new_height).unwrap_or(height).max(1);

    Ok(Some(Dimensions::new(max_width, new_height)))
}

/// Image resizer bound to one resampling filter
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResizer {
    filter: FilterType,
}

impl ImageResizer {
    /// Create a resizer using Lanczos3
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resizer with custom filter
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> FilterType {
        self.filter
    }

    /// Scale `image` down to `max_width` if it is wider, keeping its aspect ratio.
    ///
    /// Returns `None` when no resize is needed.
    pub fn resize_to_width(
        &self,
        image: &DynamicImage,
        max_width: u32,
    ) -> Result<Option<DynamicImage>> {
        let Some(target) = plan_resize(image.width(), image.height(), max_width)? else {
            debug!(
                "No resize needed: {}x{} is within {}px",
                image.width(),
                image.height(),
                max_width
            );
            return Ok(None);
        };

        Ok(Some(self.resize_exact(image, target)))
    }

    /// Resample to exactly `target`, whatever the source aspect ratio
    pub fn resize_exact(&self, image: &DynamicImage, target: Dimensions) -> DynamicImage {
        debug!(
            "Resizing {}x{} -> {} using {:?}",
            image.width(),
            image.height(),
            target,
            self.filter
        );

        // `DynamicImage::resize` re-derives the height with its own rounding,
        // so the planned size is applied exactly instead.
        image.resize_exact(target.width, target.height, self.filter.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let intensity = ((x + y) % 255) as u8;
            Rgb([intensity, intensity, intensity])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_plan_resize() {
        assert_eq!(
            plan_resize(3000, 2000, 1920).unwrap(),
            Some(Dimensions::new(1920, 1280))
        );
        // floor, not round: 1000 * 1920 / 2001 = 959.52...
        assert_eq!(
            plan_resize(2001, 1000, 1920).unwrap(),
            Some(Dimensions::new(1920, 959))
        );
        assert_eq!(plan_resize(1920, 1080, 1920).unwrap(), None);
        assert_eq!(plan_resize(640, 480, 1920).unwrap(), None);
    }

    #[test]
    fn test_plan_resize_keeps_one_pixel() {
        assert_eq!(
            plan_resize(10_000, 1, 1920).unwrap(),
            Some(Dimensions::new(1920, 1))
        );
    }

    #[test]
    fn test_plan_resize_invalid() {
        assert!(plan_resize(100, 100, 0).is_err());
        assert!(plan_resize(0, 100, 1920).is_err());
    }

    #[test]
    fn test_resizer_creation() {
        assert_eq!(ImageResizer::new().filter(), FilterType::Lanczos3);
        assert_eq!(
            ImageResizer::with_filter(FilterType::Nearest).filter(),
            FilterType::Nearest
        );
    }

    #[test]
    fn test_resize_to_width() {
        let resizer = ImageResizer::new();
        let image = create_test_image(300, 200);

        let resized = resizer.resize_to_width(&image, 120).unwrap().unwrap();
        assert_eq!(Dimensions::of(&resized), Dimensions::new(120, 80));
    }

    #[test]
    fn test_no_resize_needed() {
        let resizer = ImageResizer::new();
        let image = create_test_image(100, 100);

        assert!(resizer.resize_to_width(&image, 100).unwrap().is_none());
        assert!(resizer.resize_to_width(&image, 500).unwrap().is_none());
    }

    #[test]
    fn test_dimensions_display() {
        assert_eq!(Dimensions::new(1920, 1280).to_string(), "1920x1280");
        assert_eq!(Dimensions::new(4, 5).pixel_count(), 20);
    }

    #[test]
    fn test_filter_conversion() {
        let filters = [
            FilterType::Nearest,
            FilterType::Triangle,
            FilterType::CatmullRom,
            FilterType::Gaussian,
            FilterType::Lanczos3,
        ];

        for filter in &filters {
            let _: image::imageops::FilterType = (*filter).into();
        }
    }
}
