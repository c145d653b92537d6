// THEORY:
// The habitat calculator turns one category's share of the image into an area
// and a population estimate:
//
//     habitat   = area_size / 100 * percentage
//     birdcount = habitat * number
//
// Inputs arrive as the raw text a user typed, so parsing is part of the job.
// The area size accepts any float. The number must be a whole number, since it
// is a count of birds. Every failure is an `InvalidInput`, which callers report
// and move past.

use crate::core_modules::category::{Category, CategoryAssignments};
use crate::core_modules::percentage::{ColorPercentage, ColorShare};
use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// Raw user input for one habitat calculation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitatRequest {
    /// Size of the surveyed square in hectares, as typed.
    pub area_size: String,
    /// Birds per hectare of habitat, as typed.
    pub number: String,
    /// The species/category to estimate for.
    pub species: Option<Category>,
}

impl HabitatRequest {
    pub fn new(area_size: impl Into<String>, number: impl Into<String>, species: Option<Category>) -> Self {
        Self {
            area_size: area_size.into(),
            number: number.into(),
            species,
        }
    }
}

/// Result of a habitat calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HabitatEstimate {
    pub category: Category,
    /// Share of the image covered by the category's color.
    pub percentage: f64,
    /// Habitat area in hectares.
    pub habitat: f64,
    pub birdcount: f64,
}

impl fmt::Display for HabitatEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Habitat: {:.2} hectares", self.habitat)?;
        write!(f, "Birdcount: {:.2}", self.birdcount)
    }
}

/// Runs a calculation against the current ranking and assignments.
///
/// When several colors carry the selected category, the highest-ranked one
/// supplies the percentage.
pub fn calculate(
    request: &HabitatRequest,
    assignments: &CategoryAssignments,
    ranking: &ColorPercentage,
) -> Result<HabitatEstimate> {
    let area_size = parse_area_size(&request.area_size)?;
    let number = parse_number(&request.number)?;
    let category = request
        .species
        .ok_or_else(|| Error::invalid_input("Please select a species"))?;

    let share = first_share_for(category, assignments, ranking)
        .ok_or_else(|| Error::invalid_input("Selected species not found in color list"))?;

    let (habitat, birdcount) = estimate(area_size, share.percentage, number);
    tracing::debug!(%category, percentage = share.percentage, habitat, birdcount, "habitat estimated");

    Ok(HabitatEstimate {
        category,
        percentage: share.percentage,
        habitat,
        birdcount,
    })
}

pub fn estimate(area_size: f64, percentage: f64, number: i64) -> (f64, f64) {
    let habitat = (area_size / 100.0) * percentage;
    let birdcount = habitat * number as f64;
    (habitat, birdcount)
}

fn first_share_for<'a>(
    category: Category,
    assignments: &CategoryAssignments,
    ranking: &'a ColorPercentage,
) -> Option<&'a ColorShare> {
    ranking
        .iter()
        .find(|share| assignments.category_of(&share.color) == Some(category))
}

fn parse_area_size(raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| Error::invalid_input(format!("Area size must be a number, got '{raw}'")))
}

fn parse_number(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| Error::invalid_input(format!("Number must be a whole number, got '{raw}'")))
}
