// THEORY:
// `ColorCount` is the frequency table each band worker fills privately and the
// calling thread folds together afterwards. Merging is a multiset union, which
// is commutative and associative, so the combined totals are the same no matter
// which band finished first.

use crate::core_modules::color::color::Color;
use std::collections::HashMap;
use std::collections::hash_map;

/// Maps each distinct color to the number of pixels that have it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorCount {
    counts: HashMap<Color, u64>,
}

impl ColorCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, color: Color) {
        self.add(color, 1);
    }

    pub fn add(&mut self, color: Color, pixels: u64) {
        if pixels == 0 {
            return;
        }
        *self.counts.entry(color).or_insert(0) += pixels;
    }

    pub fn get(&self, color: &Color) -> u64 {
        self.counts.get(color).copied().unwrap_or(0)
    }

    /// Number of distinct colors.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of pixels counted.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Adds every count in `other` to this table.
    pub fn merge(&mut self, other: ColorCount) {
        if self.counts.len() < other.counts.len() {
            let smaller = std::mem::replace(&mut self.counts, other.counts);
            for (color, pixels) in smaller {
                self.add(color, pixels);
            }
        } else {
            for (color, pixels) in other.counts {
                self.add(color, pixels);
            }
        }
    }

    pub fn iter(&self) -> hash_map::Iter<'_, Color, u64> {
        self.counts.iter()
    }
}

impl FromIterator<Color> for ColorCount {
    fn from_iter<I: IntoIterator<Item = Color>>(iter: I) -> Self {
        let mut counts = ColorCount::new();
        for color in iter {
            counts.increment(color);
        }
        counts
    }
}

impl IntoIterator for ColorCount {
    type Item = (Color, u64);
    type IntoIter = hash_map::IntoIter<Color, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.into_iter()
    }
}

impl<'a> IntoIterator for &'a ColorCount {
    type Item = (&'a Color, &'a u64);
    type IntoIter = hash_map::Iter<'a, Color, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.iter()
    }
}
