// THEORY:
// Categories are the fixed list of eleven habitat/terrain types a user can
// attach to a color. Assignments live in an explicit `CategoryAssignments` map
// that is passed to the habitat calculator, rather than being read back out of
// whatever widget happened to hold the selection.

use crate::core_modules::color::color::Color;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Label shown on a per-color selector before anything is chosen.
pub const TERRAIN_PLACEHOLDER: &str = "Select terrain type";
/// Label shown on the species selector before anything is chosen.
pub const SPECIES_PLACEHOLDER: &str = "Select species";

/// A habitat or terrain type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Field")]
    Field,
    #[serde(rename = "Group of trees, bushes")]
    TreesAndBushes,
    #[serde(rename = "Grassland")]
    Grassland,
    #[serde(rename = "Water bodies")]
    WaterBodies,
    #[serde(rename = "Bogs")]
    Bogs,
    #[serde(rename = "Nutrient-poor grassland")]
    NutrientPoorGrassland,
    #[serde(rename = "Pre-forest")]
    PreForest,
    #[serde(rename = "Mixed forest")]
    MixedForest,
    #[serde(rename = "Deciduous forest")]
    DeciduousForest,
    #[serde(rename = "Coniferous forest")]
    ConiferousForest,
    #[serde(rename = "Settlements")]
    Settlements,
}

impl Category {
    /// Every category, in selector order.
    pub const ALL: [Category; 11] = [
        Category::Field,
        Category::TreesAndBushes,
        Category::Grassland,
        Category::WaterBodies,
        Category::Bogs,
        Category::NutrientPoorGrassland,
        Category::PreForest,
        Category::MixedForest,
        Category::DeciduousForest,
        Category::ConiferousForest,
        Category::Settlements,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Field => "Field",
            Category::TreesAndBushes => "Group of trees, bushes",
            Category::Grassland => "Grassland",
            Category::WaterBodies => "Water bodies",
            Category::Bogs => "Bogs",
            Category::NutrientPoorGrassland => "Nutrient-poor grassland",
            Category::PreForest => "Pre-forest",
            Category::MixedForest => "Mixed forest",
            Category::DeciduousForest => "Deciduous forest",
            Category::ConiferousForest => "Coniferous forest",
            Category::Settlements => "Settlements",
        }
    }

    /// Parses a selector value. The placeholder labels and an empty string mean
    /// "nothing selected" and give `Ok(None)`.
    pub fn parse_selection(label: &str) -> Result<Option<Category>> {
        let trimmed = label.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case(TERRAIN_PLACEHOLDER)
            || trimmed.eq_ignore_ascii_case(SPECIES_PLACEHOLDER)
        {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::invalid_input(format!("Unknown category '{wanted}'")))
    }
}

/// The user's color → category mapping. A color carries at most one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryAssignments {
    by_color: HashMap<Color, Category>,
}

impl CategoryAssignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the category of `color`, returning the one it replaced.
    pub fn assign(&mut self, color: Color, category: Category) -> Option<Category> {
        self.by_color.insert(color, category)
    }

    pub fn unassign(&mut self, color: &Color) -> Option<Category> {
        self.by_color.remove(color)
    }

    pub fn category_of(&self, color: &Color) -> Option<Category> {
        self.by_color.get(color).copied()
    }

    pub fn len(&self) -> usize {
        self.by_color.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_color.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_color.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Color, &Category)> {
        self.by_color.iter()
    }
}
