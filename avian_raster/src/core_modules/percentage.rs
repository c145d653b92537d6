// THEORY:
// `ColorPercentage` is the final product of the engine: every distinct color,
// its share of the image, ranked from most to least common. It is what the
// presentation layer lists and what the habitat calculator looks percentages up
// in.
//
// Ranking is done on the integer pixel counts rather than the derived floats.
// Both give the same order for a shared total, but integers compare exactly, so
// ties are real ties and the lexicographic color tie-break applies cleanly.

use crate::core_modules::color::color::Color;
use crate::core_modules::color_count::ColorCount;
use serde::{Deserialize, Serialize};
use std::slice;

/// One `(percentage, color)` entry in a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorShare {
    /// Share of the image, 0.0 to 100.0.
    pub percentage: f64,
    pub color: Color,
    /// Raw number of pixels with this color.
    pub pixels: u64,
}

/// All colors of an image, sorted by share descending, then by color ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorPercentage {
    shares: Vec<ColorShare>,
}

impl ColorPercentage {
    /// Converts merged counts into percentages of their total.
    ///
    /// An empty table gives an empty ranking.
    pub fn from_counts(counts: &ColorCount) -> Self {
        let total = counts.total();
        let mut shares: Vec<ColorShare> = counts
            .iter()
            .map(|(color, &pixels)| ColorShare {
                percentage: pixels as f64 / total as f64 * 100.0,
                color: *color,
                pixels,
            })
            .collect();

        shares.sort_by(|a, b| b.pixels.cmp(&a.pixels).then_with(|| a.color.cmp(&b.color)));
        Self { shares }
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn get(&self, rank: usize) -> Option<&ColorShare> {
        self.shares.get(rank)
    }

    pub fn iter(&self) -> slice::Iter<'_, ColorShare> {
        self.shares.iter()
    }

    pub fn as_slice(&self) -> &[ColorShare] {
        &self.shares
    }

    /// The `n` most common colors.
    pub fn top(&self, n: usize) -> &[ColorShare] {
        &self.shares[..n.min(self.shares.len())]
    }

    pub fn percentage_of(&self, color: &Color) -> Option<f64> {
        self.shares
            .iter()
            .find(|share| share.color == *color)
            .map(|share| share.percentage)
    }

    pub fn rank_of(&self, color: &Color) -> Option<usize> {
        self.shares.iter().position(|share| share.color == *color)
    }

    pub fn total_percentage(&self) -> f64 {
        self.shares.iter().map(|share| share.percentage).sum()
    }

    pub fn total_pixels(&self) -> u64 {
        self.shares.iter().map(|share| share.pixels).sum()
    }
}

impl<'a> IntoIterator for &'a ColorPercentage {
    type Item = &'a ColorShare;
    type IntoIter = slice::Iter<'a, ColorShare>;

    fn into_iter(self) -> Self::IntoIter {
        self.shares.iter()
    }
}

impl IntoIterator for ColorPercentage {
    type Item = ColorShare;
    type IntoIter = std::vec::IntoIter<ColorShare>;

    fn into_iter(self) -> Self::IntoIter {
        self.shares.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(entries: &[(Color, u64)]) -> ColorCount {
        let mut counts = ColorCount::new();
        for (color, pixels) in entries {
            counts.add(*color, *pixels);
        }
        counts
    }

    #[test]
    fn ranks_by_share_descending() {
        let ranking = ColorPercentage::from_counts(&counts(&[
            (Color::rgb(1, 1, 1), 10),
            (Color::rgb(2, 2, 2), 60),
            (Color::rgb(3, 3, 3), 30),
        ]));

        let order: Vec<Color> = ranking.iter().map(|s| s.color).collect();
        assert_eq!(order, vec![Color::rgb(2, 2, 2), Color::rgb(3, 3, 3), Color::rgb(1, 1, 1)]);
        assert!((ranking.get(0).unwrap().percentage - 60.0).abs() < 1e-9);
        assert!((ranking.total_percentage() - 100.0).abs() < 1e-9);
        assert_eq!(ranking.total_pixels(), 100);
    }

    #[test]
    fn ties_fall_back_to_color_order() {
        let ranking = ColorPercentage::from_counts(&counts(&[
            (Color::rgb(255, 255, 255), 1),
            (Color::rgb(0, 0, 0), 1),
            (Color::rgb(0, 0, 128), 1),
        ]));
        let order: Vec<Color> = ranking.iter().map(|s| s.color).collect();
        assert_eq!(
            order,
            vec![Color::rgb(0, 0, 0), Color::rgb(0, 0, 128), Color::rgb(255, 255, 255)]
        );
    }

    #[test]
    fn lookups_by_color_and_rank() {
        let ranking = ColorPercentage::from_counts(&counts(&[
            (Color::rgb(9, 9, 9), 3),
            (Color::rgb(8, 8, 8), 1),
        ]));
        assert_eq!(ranking.percentage_of(&Color::rgb(8, 8, 8)), Some(25.0));
        assert_eq!(ranking.rank_of(&Color::rgb(8, 8, 8)), Some(1));
        assert_eq!(ranking.percentage_of(&Color::rgb(7, 7, 7)), None);
        assert_eq!(ranking.top(1).len(), 1);
        assert_eq!(ranking.top(50).len(), 2);
    }

    #[test]
    fn empty_counts_give_empty_ranking() {
        let ranking = ColorPercentage::from_counts(&ColorCount::new());
        assert!(ranking.is_empty());
        assert_eq!(ranking.total_percentage(), 0.0);
    }

    #[test]
    fn serializes_as_a_plain_list() {
        let ranking = ColorPercentage::from_counts(&counts(&[(Color::rgb(1, 2, 3), 4)]));
        let json = serde_json::to_value(&ranking).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["percentage"], 100.0);
        assert_eq!(json[0]["color"]["green"], 2);
    }
}
