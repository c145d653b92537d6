// THEORY:
// A `Band` is the unit of parallel work: a horizontal slice of the image,
// `[top, bottom)` in rows, always spanning the full width. It plays the role
// a chunk plays in a grid, but sliced along one axis only, because a full-width
// row range is a single contiguous run of bytes in the raster.
//
// Key architectural principles:
// 1.  **Exact partition**: `partition` cuts `height` into `band_count` bands.
//     Every band but the last gets `height / band_count` rows; the last absorbs
//     the remainder. Together they cover `[0, height)` exactly once.
// 2.  **Degenerate bands are legal**: When the image is shorter than the band
//     count, leading bands are zero rows tall. Counting one yields an empty
//     table instead of failing.
// 3.  **Private state**: `count_colors` reads the shared image and writes only to
//     its own `ColorCount`. It checks the cancel token once per row.

pub mod band {
    use crate::core_modules::color::color::{CHANNELS, Color};
    use crate::core_modules::color_count::ColorCount;
    use crate::core_modules::raster::RasterImage;
    use crate::error::{Error, Result};
    use crate::parallel_aggregator::CancelToken;

    pub const DEFAULT_BAND_COUNT: usize = 10;

    /// A contiguous, full-width range of image rows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Band {
        /// Position of this band in the partition, top to bottom.
        pub index: usize,
        /// First row of the band (inclusive).
        pub top: u32,
        /// Row after the last row of the band (exclusive).
        pub bottom: u32,
    }

    impl Band {
        pub fn rows(&self) -> u32 {
            self.bottom - self.top
        }

        pub fn is_empty(&self) -> bool {
            self.top >= self.bottom
        }

        /// Counts every color in this band of `image`. Rows past the bottom of
        /// the image are ignored.
        ///
        /// Returns `Error::Cancelled` as soon as `cancel` is observed between rows.
        pub fn count_colors(&self, image: &RasterImage, cancel: &CancelToken) -> Result<ColorCount> {
            let mut counts = ColorCount::new();
            let stride = image.stride();
            let bottom = self.bottom.min(image.height());
            let top = self.top.min(bottom);
            if top == bottom || stride == 0 {
                return Ok(counts);
            }

            for row in image.row_bytes(top, bottom).chunks_exact(stride) {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                for pixel in row.chunks_exact(CHANNELS) {
                    counts.increment(Color::from_bytes(pixel));
                }
            }

            Ok(counts)
        }
    }

    /// Splits `height` rows into `band_count` contiguous bands.
    pub fn partition(height: u32, band_count: usize) -> Vec<Band> {
        if band_count == 0 {
            return Vec::new();
        }

        let band_height = u64::from(height) / band_count as u64;
        (0..band_count)
            .map(|index| {
                // index * band_height never exceeds height, so these fit in u32.
                let top = (index as u64 * band_height) as u32;
                let bottom = if index + 1 < band_count {
                    (top as u64 + band_height) as u32
                } else {
                    height
                };
                Band { index, top, bottom }
            })
            .collect()
    }
}
