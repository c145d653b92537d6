// THEORY:
// This file is the main entry point for the `avian_raster` library crate. It
// exports the `Survey` session and the `ColorAggregator` engine, plus the data
// types they produce, as the public API.
//
// The engine answers one question: what share of an aerial image does each
// exact color cover? It splits the image into horizontal bands, counts colors
// in each band on a fixed worker pool, merges the counts and ranks the colors.
// Everything around it (loading, categories, the habitat estimate) is a thin
// layer over that ranking.
//
// ```no_run
// use avian_raster::{Category, HabitatRequest, Survey, SurveyConfig};
//
// let mut survey = Survey::new(SurveyConfig::default())?;
// survey.load("aerial.png")?;
// survey.assign_rank(0, Category::MixedForest)?;
// let estimate = survey.calculate(&HabitatRequest::new("100", "4", Some(Category::MixedForest)))?;
// println!("{estimate}");
// # Ok::<(), avian_raster::Error>(())
// ```

pub mod config;
pub mod core_modules;
pub mod error;
pub mod image_loader;
pub mod parallel_aggregator;
pub mod pipeline;

pub use config::{AggregatorConfig, SurveyConfig};
pub use core_modules::band::band::{Band, DEFAULT_BAND_COUNT, partition};
pub use core_modules::category::{Category, CategoryAssignments, SPECIES_PLACEHOLDER, TERRAIN_PLACEHOLDER};
pub use core_modules::color::color::Color;
pub use core_modules::color_count::ColorCount;
pub use core_modules::habitat::{HabitatEstimate, HabitatRequest};
pub use core_modules::percentage::{ColorPercentage, ColorShare};
pub use core_modules::raster::RasterImage;
pub use error::{Error, Result};
pub use parallel_aggregator::{CancelToken, ColorAggregator, aggregate};
pub use pipeline::Survey;
