//! Image loading and saving.
//!
//! Aerial photographs are often far larger than needed for a color survey, so
//! the loader can cap the largest side at a configurable size. Images are shrunk
//! to fit, keeping their aspect ratio, and are never enlarged.

use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::core_modules::raster::RasterImage;
use crate::error::{Error, Result};

/// Load an image from disk, downscaling it when either side exceeds
/// `max_dimension`.
///
/// # Errors
///
/// Returns `Error::ImageLoad` if the file cannot be opened or decoded.
pub fn load_image<P: AsRef<Path>>(path: P, max_dimension: Option<u32>) -> Result<RasterImage> {
    let path = path.as_ref();
    tracing::info!("Loading file: {}", path.display());

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    let img = match max_dimension {
        Some(max) => downscale(img, max),
        None => img,
    };

    Ok(RasterImage::from_dynamic(&img))
}

/// Shrinks `img` to fit inside `max × max` using Lanczos3 resampling.
pub fn downscale(img: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    match scaled_dimensions(width, height, max_dimension) {
        Some((new_width, new_height)) => {
            tracing::debug!(width, height, new_width, new_height, "downscaling image");
            img.resize_exact(new_width, new_height, FilterType::Lanczos3)
        }
        None => img,
    }
}

/// The size an image of `width × height` is scaled to, or `None` when it
/// already fits.
///
/// The longer side becomes exactly `max_dimension`. The shorter side is scaled
/// by the same factor and rounded down, but never below one pixel.
pub fn scaled_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    if width <= max_dimension && height <= max_dimension {
        return None;
    }

    let longest = u64::from(width.max(height));
    let scale = |side: u32| -> u32 {
        let scaled = u64::from(side) * u64::from(max_dimension) / longest;
        (scaled as u32).max(1)
    };

    Some((scale(width), scale(height)))
}

/// Save a raster to disk. The format follows the file extension.
///
/// Sources without alpha are written as RGB so that formats like JPEG accept them.
pub fn save_image<P: AsRef<Path>>(image: &RasterImage, path: P) -> Result<()> {
    let path = path.as_ref();
    image.to_dynamic().save(path).map_err(|source| Error::ImageSave {
        path: path.to_path_buf(),
        source,
    })
}

/// Get list of all supported file extensions
pub fn supported_extensions() -> &'static [&'static str] {
    &[
        "png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp", "tga", "ico", "pbm", "pgm",
        "ppm", "pnm", "qoi",
    ]
}

/// Check if a file extension is supported
pub fn is_supported_extension(ext: &str) -> bool {
    let ext_lower = ext.to_lowercase();
    supported_extensions().contains(&ext_lower.as_str())
}

pub fn is_supported_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(is_supported_extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color::color::Color;

    #[test]
    fn small_images_are_not_resized() {
        assert_eq!(scaled_dimensions(1024, 1024, 1024), None);
        assert_eq!(scaled_dimensions(10, 700, 1024), None);
    }

    #[test]
    fn longest_side_is_capped_and_aspect_kept() {
        assert_eq!(scaled_dimensions(2048, 1024, 1024), Some((1024, 512)));
        assert_eq!(scaled_dimensions(3000, 2000, 1024), Some((1024, 682)));
        assert_eq!(scaled_dimensions(2000, 3000, 1024), Some((682, 1024)));
    }

    #[test]
    fn thin_images_keep_at_least_one_pixel() {
        assert_eq!(scaled_dimensions(10_000, 1, 1024), Some((1024, 1)));
    }

    #[test]
    fn downscale_produces_expected_dimensions() {
        let img = DynamicImage::new_rgb8(300, 150);
        assert_eq!(downscale(img, 100).dimensions(), (100, 50));
    }

    #[test]
    fn missing_file_is_an_image_load_error() {
        let err = load_image("definitely/not/here.png", None).unwrap_err();
        assert!(matches!(err, Error::ImageLoad { .. }));
    }

    #[test]
    fn saved_png_loads_back_unchanged() {
        let path = std::env::temp_dir().join(format!("avian_raster_loader_{}.png", std::process::id()));
        let raster = RasterImage::from_fn(4, 3, |x, y| Color::rgb(x as u8 * 60, y as u8 * 80, 7));
        save_image(&raster, &path).unwrap();

        let loaded = load_image(&path, Some(1024)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.dimensions(), (4, 3));
        assert!(!loaded.has_alpha());
        assert_eq!(loaded.pixel(3, 2), Color::rgb(180, 160, 7));
    }

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported_extension("png"));
        assert!(is_supported_extension("JPG"));
        assert!(is_supported_extension("jpeg"));
        assert!(!is_supported_extension("pdf"));
        assert!(is_supported_path(Path::new("survey/field.PNG")));
        assert!(!is_supported_path(Path::new("survey/notes")));
    }
}
