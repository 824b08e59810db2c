//! Bottle records produced by the listing and detail extractors.
//!
//! Keys serialize in camelCase to match the JSON output consumers already
//! read. Optional text fields are omitted from the JSON object when absent,
//! and NaN numbers are written as `null` (see [`crate::float`]).

use serde::{Deserialize, Serialize};

use crate::float::nan_as_null;

/// Minimal per-item data available from a listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicBottleRecord {
    /// Absolute URL of the bottle's detail page.
    pub href: String,
    /// Brand name, e.g. `"Oban"`.
    pub brand: String,
    /// Edition name, e.g. `"Oban 14 Year Old"`.
    pub name: String,
    /// Liquor category, e.g. `"Scotch"`.
    pub category: String,
    /// Average user rating out of 10. NaN when the listing value is not numeric.
    #[serde(with = "nan_as_null")]
    pub rating: f64,
    /// Listed price. NaN when unparseable; propagated, never repaired.
    #[serde(with = "nan_as_null")]
    pub price: f64,
}

/// Vote counts and the averaged review score from the aggregate rating payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingStatistics {
    /// Total number of ratings, with or without a written review.
    pub total_ratings: u64,
    /// Number of ratings that include a written review.
    pub review_ratings: u64,
    /// `total_ratings - review_ratings`. Negative when the source data is
    /// inconsistent; never clamped.
    pub non_review_ratings: i64,
    /// Mean of the valid review scores, rounded to 3 significant digits.
    /// NaN when no review carried a usable score.
    #[serde(with = "nan_as_null")]
    pub avg_review_rating_value: f64,
}

/// Intensity tier of a flavor in the flavor spiral graphic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlavorTier {
    Primary,
    Secondary,
    Tertiary,
}

/// Flavor names bucketed by tier, each bucket in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorSpiral {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
    pub tertiary: Vec<String>,
}

impl FlavorSpiral {
    /// Appends `flavor` to the bucket for `tier`.
    pub fn push(&mut self, tier: FlavorTier, flavor: String) {
        self.bucket_mut(tier).push(flavor);
    }

    /// Returns the flavors in `tier`.
    #[must_use]
    pub fn bucket(&self, tier: FlavorTier) -> &[String] {
        match tier {
            FlavorTier::Primary => &self.primary,
            FlavorTier::Secondary => &self.secondary,
            FlavorTier::Tertiary => &self.tertiary,
        }
    }

    /// Total number of bucketed flavors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.primary.len() + self.secondary.len() + self.tertiary.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket_mut(&mut self, tier: FlavorTier) -> &mut Vec<String> {
        match tier {
            FlavorTier::Primary => &mut self.primary,
            FlavorTier::Secondary => &mut self.secondary,
            FlavorTier::Tertiary => &mut self.tertiary,
        }
    }
}

/// The four tasting-note sections. A section is `None` when its heading
/// could not be located on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TastingNotes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish: Option<String>,
}

/// A basic record enriched with everything extracted from its detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailBottleRecord {
    #[serde(flatten)]
    pub basic: BasicBottleRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distillery: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alcohol_percent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_cask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maturation: Option<String>,
    /// `None` when the aggregate rating payload was absent or unparseable;
    /// the statistic keys are then omitted from the JSON object.
    #[serde(flatten)]
    pub ratings: Option<RatingStatistics>,
    pub flavor_spiral: FlavorSpiral,
    pub tasting_notes: TastingNotes,
}

#[cfg(test)]
#[path = "records_test.rs"]
mod tests;
