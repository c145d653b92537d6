// THEORY:
// The `parallel_aggregator` is the engine: a static map-reduce over horizontal
// bands of one image.
//
//   1. Partition the image height into `band_count` bands.
//   2. Count colors in every band on a fixed-size worker pool.
//   3. Wait for all of them, then merge the per-band tables on the calling
//      thread in band order.
//   4. Turn the merged counts into a ranked `ColorPercentage`.
//
// The pool is a dedicated tokio runtime. Band tasks run as blocking tasks with
// `max_blocking_threads` capped at the worker count, so CPU-bound counting never
// starves the runtime and the thread count stays fixed. The image is shared as
// an `Arc`; every worker writes only to its own table, and only the caller
// merges, so there is no locking anywhere on the hot path.
//
// `aggregate` blocks its caller and fails with `WorkerFailed` when called from
// inside a tokio runtime. Async callers use `aggregate_async`, which awaits the
// same band tasks instead of blocking on them.

use crate::config::AggregatorConfig;
use crate::core_modules::band::band::{Band, partition};
use crate::core_modules::color_count::ColorCount;
use crate::core_modules::percentage::ColorPercentage;
use crate::core_modules::raster::RasterImage;
use crate::error::{Error, Result};
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::runtime::{Builder, Handle, Runtime};

/// A shared flag that aborts an aggregation in progress.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// A fixed-size pool that counts bands in parallel.
pub struct WorkerPool {
    /// Only `None` while the pool is being dropped.
    runtime: Option<Runtime>,
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .max_blocking_threads(workers.max(1))
            .thread_name("avian-band-worker")
            .build()
            .map_err(Error::Runtime)?;

        Ok(Self {
            runtime: Some(runtime),
            workers,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn runtime(&self) -> Result<&Runtime> {
        self.runtime
            .as_ref()
            .ok_or_else(|| Error::WorkerFailed("worker pool has shut down".to_string()))
    }

    /// Counts every band and returns the tables in band order.
    ///
    /// Blocks until all bands have finished. If any band fails, the first
    /// failure in band order is returned and no counts are. Inside a tokio
    /// runtime this returns `WorkerFailed` without counting; use
    /// `count_bands_async` there.
    pub fn count_bands(&self, image: &RasterImage, bands: Vec<Band>, cancel: &CancelToken) -> Result<Vec<ColorCount>> {
        if Handle::try_current().is_ok() {
            return Err(Error::WorkerFailed(
                "blocking aggregation called from inside an async runtime; use the async variant".to_string(),
            ));
        }
        let runtime = self.runtime()?;
        runtime.block_on(self.count_bands_async(image, bands, cancel))
    }

    /// Counts every band on the pool's threads and awaits the tables in band
    /// order. Usable from any async runtime.
    pub async fn count_bands_async(
        &self,
        image: &RasterImage,
        bands: Vec<Band>,
        cancel: &CancelToken,
    ) -> Result<Vec<ColorCount>> {
        let handle = self.runtime()?.handle();
        let tasks = bands.into_iter().map(|band| {
            let image = image.clone();
            let cancel = cancel.clone();
            handle.spawn_blocking(move || {
                let started = Instant::now();
                let counts = band.count_colors(&image, &cancel);
                tracing::trace!(
                    band = band.index,
                    rows = band.rows(),
                    elapsed_us = started.elapsed().as_micros() as u64,
                    "band counted"
                );
                counts
            })
        });

        join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.map_err(|e| Error::WorkerFailed(e.to_string()))?)
            .collect::<Result<Vec<_>>>()
    }
}

impl Drop for WorkerPool {
    // Dropping a `Runtime` inside another runtime panics; background shutdown
    // does not.
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// The color aggregation engine.
pub struct ColorAggregator {
    config: AggregatorConfig,
    pool: WorkerPool,
}

impl ColorAggregator {
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        config.validate()?;
        let pool = WorkerPool::new(config.workers)?;
        tracing::debug!(bands = config.band_count, workers = config.workers, "worker pool ready");
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Ranks every color in `image` by its share of the pixels.
    pub fn aggregate(&self, image: &RasterImage) -> Result<ColorPercentage> {
        self.aggregate_with_cancel(image, &CancelToken::new())
    }

    pub fn aggregate_with_cancel(&self, image: &RasterImage, cancel: &CancelToken) -> Result<ColorPercentage> {
        let started = Instant::now();
        let counts = self.count_with_cancel(image, cancel)?;
        let ranking = ColorPercentage::from_counts(&counts);
        tracing::info!(
            width = image.width(),
            height = image.height(),
            colors = ranking.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "color percentages calculated"
        );
        Ok(ranking)
    }

    /// Async counterpart of `aggregate_with_cancel`. Band work still runs on
    /// this engine's own worker threads.
    pub async fn aggregate_async(&self, image: &RasterImage, cancel: &CancelToken) -> Result<ColorPercentage> {
        let counts = self.count_async(image, cancel).await?;
        Ok(ColorPercentage::from_counts(&counts))
    }

    /// Merged color counts for `image`, without the percentage step.
    pub fn count(&self, image: &RasterImage) -> Result<ColorCount> {
        self.count_with_cancel(image, &CancelToken::new())
    }

    pub fn count_with_cancel(&self, image: &RasterImage, cancel: &CancelToken) -> Result<ColorCount> {
        let bands = self.plan(image, cancel)?;
        let band_counts = self.pool.count_bands(image, bands, cancel)?;
        Ok(merge_in_order(image, band_counts))
    }

    pub async fn count_async(&self, image: &RasterImage, cancel: &CancelToken) -> Result<ColorCount> {
        let bands = self.plan(image, cancel)?;
        let band_counts = self.pool.count_bands_async(image, bands, cancel).await?;
        Ok(merge_in_order(image, band_counts))
    }

    fn plan(&self, image: &RasterImage, cancel: &CancelToken) -> Result<Vec<Band>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::InvalidImage { width, height });
        }
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let bands = partition(height, self.config.band_count);
        tracing::debug!(width, height, bands = bands.len(), "image partitioned");
        Ok(bands)
    }
}

fn merge_in_order(image: &RasterImage, band_counts: Vec<ColorCount>) -> ColorCount {
    let mut combined = ColorCount::new();
    for counts in band_counts {
        combined.merge(counts);
    }
    debug_assert_eq!(combined.total(), image.pixel_count());
    combined
}

/// Aggregates `image` with the default ten-band, ten-worker engine.
pub fn aggregate(image: &RasterImage) -> Result<ColorPercentage> {
    ColorAggregator::new(AggregatorConfig::default())?.aggregate(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::color::color::Color;
    use image::RgbaImage;

    fn striped(width: u32, height: u32) -> RasterImage {
        RasterImage::from_fn(width, height, |x, y| Color::rgb((x % 3) as u8, (y % 5) as u8, 0))
    }

    #[test]
    fn solid_red_is_one_hundred_percent() {
        let image = RasterImage::from_fn(10, 10, |_, _| Color::rgb(255, 0, 0));
        let ranking = aggregate(&image).unwrap();

        assert_eq!(ranking.len(), 1);
        let share = ranking.get(0).unwrap();
        assert_eq!(share.color, Color::rgb(255, 0, 0));
        assert!((share.percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn black_and_white_pair_split_evenly() {
        let image = RasterImage::from_fn(2, 1, |x, _| {
            if x == 0 { Color::rgb(0, 0, 0) } else { Color::rgb(255, 255, 255) }
        });
        let ranking = aggregate(&image).unwrap();

        assert_eq!(ranking.len(), 2);
        assert!(ranking.iter().all(|s| (s.percentage - 50.0).abs() < 1e-9));
        assert_eq!(ranking.get(0).unwrap().color, Color::rgb(0, 0, 0));
    }

    #[test]
    fn zero_area_images_are_rejected() {
        let aggregator = ColorAggregator::new(AggregatorConfig::default()).unwrap();
        for (w, h) in [(0, 0), (5, 0), (0, 5)] {
            let image = RasterImage::from_rgba(RgbaImage::new(w, h));
            match aggregator.aggregate(&image) {
                Err(Error::InvalidImage { width, height }) => assert_eq!((width, height), (w, h)),
                other => panic!("expected InvalidImage, got {other:?}"),
            }
        }
    }

    #[test]
    fn images_shorter_than_band_count_are_counted_fully() {
        let aggregator = ColorAggregator::new(AggregatorConfig::default()).unwrap();
        for height in 1..10 {
            let image = striped(7, height);
            let counts = aggregator.count(&image).unwrap();
            assert_eq!(counts.total(), image.pixel_count());
        }
    }

    #[test]
    fn band_and_worker_counts_do_not_change_results() {
        let image = striped(31, 47);
        let baseline = ColorAggregator::new(AggregatorConfig::new(1, 1))
            .unwrap()
            .aggregate(&image)
            .unwrap();
        for (bands, workers) in [(10, 10), (3, 1), (47, 4), (100, 8)] {
            let ranking = ColorAggregator::new(AggregatorConfig::new(bands, workers))
                .unwrap()
                .aggregate(&image)
                .unwrap();
            assert_eq!(ranking, baseline, "bands={bands} workers={workers}");
        }
    }

    #[test]
    fn pre_cancelled_token_aborts() {
        let aggregator = ColorAggregator::new(AggregatorConfig::default()).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            aggregator.aggregate_with_cancel(&striped(10, 10), &cancel),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn cancel_token_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[tokio::test]
    async fn blocking_call_inside_a_runtime_fails_cleanly() {
        let image = striped(10, 10);
        match aggregate(&image) {
            Err(Error::WorkerFailed(message)) => assert!(message.contains("async")),
            other => panic!("expected WorkerFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn async_aggregation_matches_blocking_result() {
        let image = striped(23, 17);
        let expected = std::thread::spawn({
            let image = image.clone();
            move || aggregate(&image)
        })
        .join()
        .unwrap()
        .unwrap();

        let aggregator = ColorAggregator::new(AggregatorConfig::new(4, 2)).unwrap();
        let ranking = aggregator.aggregate_async(&image, &CancelToken::new()).await.unwrap();
        assert_eq!(ranking, expected);
        drop(aggregator);
    }

    #[tokio::test]
    async fn async_aggregation_reports_invalid_and_cancelled() {
        let aggregator = ColorAggregator::new(AggregatorConfig::default()).unwrap();
        let empty = RasterImage::from_rgba(RgbaImage::new(0, 3));
        assert!(matches!(
            aggregator.aggregate_async(&empty, &CancelToken::new()).await,
            Err(Error::InvalidImage { .. })
        ));

        let cancel = CancelToken::new();
        cancel.cancel();
        assert!(matches!(
            aggregator.aggregate_async(&striped(4, 4), &cancel).await,
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn invalid_config_is_rejected_before_pool_start() {
        assert!(matches!(
            ColorAggregator::new(AggregatorConfig::new(0, 4)),
            Err(Error::Config { .. })
        ));
    }
}
