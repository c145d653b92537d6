// THEORY:
// The `pipeline` module is the top-level API for one survey session. It covers
// the whole workflow: load an image, rank its colors, let the user tag colors
// with categories, then estimate habitat and bird count.
//
// All session state lives here as plain data: the image, its ranking, the
// color → category assignments and the last estimate. A front-end (CLI, GUI,
// anything else) reads and writes it through methods. Loading a new image
// resets everything derived from the previous one.

use crate::config::SurveyConfig;
use crate::core_modules::category::{Category, CategoryAssignments};
use crate::core_modules::color::color::Color;
use crate::core_modules::habitat::{self, HabitatEstimate, HabitatRequest};
use crate::core_modules::percentage::ColorPercentage;
use crate::core_modules::raster::RasterImage;
use crate::error::{Error, Result};
use crate::image_loader;
use crate::parallel_aggregator::ColorAggregator;
use std::path::Path;

/// One image, its color ranking, the user's category assignments and the last
/// habitat estimate.
pub struct Survey {
    config: SurveyConfig,
    aggregator: ColorAggregator,
    image: Option<RasterImage>,
    colors: Option<ColorPercentage>,
    assignments: CategoryAssignments,
    last_estimate: Option<HabitatEstimate>,
}

impl Survey {
    pub fn new(config: SurveyConfig) -> Result<Self> {
        config.validate()?;
        let aggregator = ColorAggregator::new(config.aggregator_config())?;
        Ok(Self {
            config,
            aggregator,
            image: None,
            colors: None,
            assignments: CategoryAssignments::new(),
            last_estimate: None,
        })
    }

    pub fn config(&self) -> &SurveyConfig {
        &self.config
    }

    /// Loads `path`, downscaling per the configuration, and ranks its colors.
    ///
    /// Previous results are cleared first, so a failed load leaves an empty
    /// survey rather than a stale one.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<&ColorPercentage> {
        self.clear();
        let image = image_loader::load_image(path, self.config.max_dimension)?;
        self.load_image(image)
    }

    /// Ranks the colors of an image that is already in memory.
    pub fn load_image(&mut self, image: RasterImage) -> Result<&ColorPercentage> {
        self.clear();
        tracing::info!("Calculating color percentages...");
        let colors = self.aggregator.aggregate(&image)?;
        self.image = Some(image);
        Ok(&*self.colors.insert(colors))
    }

    pub fn image(&self) -> Option<&RasterImage> {
        self.image.as_ref()
    }

    pub fn colors(&self) -> Option<&ColorPercentage> {
        self.colors.as_ref()
    }

    pub fn assignments(&self) -> &CategoryAssignments {
        &self.assignments
    }

    pub fn last_estimate(&self) -> Option<&HabitatEstimate> {
        self.last_estimate.as_ref()
    }

    /// Tags `color` with `category`, returning the category it replaced.
    ///
    /// The color must appear in the current ranking.
    pub fn assign(&mut self, color: Color, category: Category) -> Result<Option<Category>> {
        let colors = self
            .colors
            .as_ref()
            .ok_or_else(|| Error::invalid_input("No image has been loaded"))?;
        if colors.rank_of(&color).is_none() {
            return Err(Error::invalid_input(format!(
                "Color {color} is not in the color list"
            )));
        }
        Ok(self.assignments.assign(color, category))
    }

    /// Tags the color at position `rank` of the ranking (0 = most common).
    pub fn assign_rank(&mut self, rank: usize, category: Category) -> Result<Option<Category>> {
        let color = self
            .colors
            .as_ref()
            .and_then(|colors| colors.get(rank))
            .map(|share| share.color)
            .ok_or_else(|| Error::invalid_input(format!("There is no color at position {rank}")))?;
        self.assign(color, category)
    }

    pub fn unassign(&mut self, color: &Color) -> Option<Category> {
        self.assignments.unassign(color)
    }

    /// Estimates habitat and bird count for the requested species.
    ///
    /// On failure the previous estimate is kept.
    pub fn calculate(&mut self, request: &HabitatRequest) -> Result<&HabitatEstimate> {
        let empty = ColorPercentage::default();
        let colors = self.colors.as_ref().unwrap_or(&empty);
        let estimate = habitat::calculate(request, &self.assignments, colors)?;
        tracing::info!("Calculation complete.");
        Ok(&*self.last_estimate.insert(estimate))
    }

    /// Drops the image and everything derived from it.
    pub fn clear(&mut self) {
        self.image = None;
        self.colors = None;
        self.assignments.clear();
        self.last_estimate = None;
    }
}
