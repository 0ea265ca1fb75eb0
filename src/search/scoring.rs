//! Field-weighted relevance scoring.
//!
//! A record's score for a query is the sum, over distinct query tokens found in
//! the record, of `occurrences × field weight` for each field, plus a small bonus
//! for landing pages. Weights must keep `title > page > text`, and the bonus must
//! stay below the text weight so it only ever separates otherwise equal scores.

use super::index::{Field, FieldCounts};
use crate::error::InvalidWeights;
use crate::record::Category;
use serde::{Deserialize, Serialize};

/// Per-field weights and the landing-page bonus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub title: f64,
    pub page: f64,
    pub text: f64,
    /// Added once to records whose category is [`Category::Page`].
    pub page_bonus: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            title: 10.0,
            page: 4.0,
            text: 1.0,
            page_bonus: 0.5,
        }
    }
}

impl FieldWeights {
    /// Check the ordering constraints.
    pub fn validate(&self) -> Result<(), InvalidWeights> {
        let all_finite = [self.title, self.page, self.text, self.page_bonus]
            .iter()
            .all(|w| w.is_finite());
        if !all_finite {
            return Err(InvalidWeights(
                "weights must be finite numbers".to_string(),
            ));
        }

        if !(self.title > self.page && self.page > self.text && self.text > 0.0) {
            return Err(InvalidWeights(format!(
                "expected title > page > text > 0, got title={}, page={}, text={}",
                self.title, self.page, self.text
            )));
        }

        if !(0.0..self.text).contains(&self.page_bonus) {
            return Err(InvalidWeights(format!(
                "page_bonus must be in [0, text weight), got {}",
                self.page_bonus
            )));
        }

        Ok(())
    }

    pub const fn weight(&self, field: Field) -> f64 {
        match field {
            Field::Title => self.title,
            Field::Page => self.page,
            Field::Text => self.text,
        }
    }

    /// Contribution of one query token to one record.
    pub fn token_score(&self, counts: &FieldCounts) -> f64 {
        Field::ALL
            .iter()
            .map(|&field| f64::from(counts.get(field)) * self.weight(field))
            .sum()
    }

    /// Flat bonus by category, applied once per matched record.
    pub fn category_bonus(&self, category: Category) -> f64 {
        if category == Category::Page {
            self.page_bonus
        } else {
            0.0
        }
    }
}
