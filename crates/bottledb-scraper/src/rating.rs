//! Vote counts and the averaged review score from the page's embedded
//! schema.org payload.
//!
//! The payload is the `<script>` block mentioning `aggregateRating`. Counts
//! default to `0` when missing or non-numeric, reviews without a usable
//! `reviewRating.ratingValue` are excluded with a diagnostic, and an average
//! over zero reviews is NaN rather than `0`.

use bottledb_core::RatingStatistics;
use serde_json::Value;

use crate::document::{text_of, LocatorRule, ParsedDocument};
use crate::error::RatingError;

/// Token identifying the structured-data block that carries rating data.
pub const RATING_MARKER: &str = "aggregateRating";

/// Statistics plus the review entries excluded from the average.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingReport {
    pub statistics: RatingStatistics,
    pub dropped_reviews: Vec<DroppedReview>,
}

/// A review entry that had no usable score.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedReview {
    /// Position in the payload's `review` list.
    pub index: usize,
    /// The `reviewRating.ratingValue` found, or `Value::Null` when absent.
    pub value: Value,
}

/// Extracts rating statistics from a detail page.
///
/// Every script block containing [`RATING_MARKER`] is tried in order and the
/// first one that parses as JSON is used.
///
/// # Errors
///
/// - [`RatingError::PayloadMissing`] when no script mentions the marker.
/// - [`RatingError::PayloadUnparseable`] when none of them is valid JSON.
pub fn extract_rating_statistics(doc: &ParsedDocument) -> Result<RatingReport, RatingError> {
    let scripts = doc
        .locate(&LocatorRule::MarkerToken(RATING_MARKER))
        .ok_or(RatingError::PayloadMissing)?
        .into_elements();

    let mut last_err = None;
    for script in scripts {
        match serde_json::from_str::<Value>(text_of(script).trim()) {
            Ok(payload) => return Ok(rating_statistics_from_payload(&payload)),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.map_or(RatingError::PayloadMissing, RatingError::PayloadUnparseable))
}

/// Derives statistics from an already-parsed payload.
///
/// The payload may be the product object itself, an array of objects, or an
/// `@graph` container; the first object carrying `aggregateRating` is used.
#[must_use]
pub fn rating_statistics_from_payload(payload: &Value) -> RatingReport {
    let node = find_rating_node(payload).unwrap_or(payload);
    let aggregate = node.get("aggregateRating");

    let total_ratings = count_field(aggregate, "ratingCount");
    let review_ratings = count_field(aggregate, "reviewCount");
    let non_review_ratings = to_signed(total_ratings) - to_signed(review_ratings);
    if non_review_ratings < 0 {
        tracing::warn!(
            total_ratings,
            review_ratings,
            "review count exceeds rating count; non-review count is negative"
        );
    }

    let mut scores = Vec::new();
    let mut dropped_reviews = Vec::new();
    for (index, review) in review_entries(node).enumerate() {
        let raw = review
            .get("reviewRating")
            .and_then(|r| r.get("ratingValue"));
        match raw.and_then(score) {
            Some(value) => scores.push(value),
            None => {
                let value = raw.cloned().unwrap_or(Value::Null);
                tracing::warn!(index, dropped = %value, "excluding review without a usable rating value");
                dropped_reviews.push(DroppedReview { index, value });
            }
        }
    }

    RatingReport {
        statistics: RatingStatistics {
            total_ratings,
            review_ratings,
            non_review_ratings,
            avg_review_rating_value: average(&scores),
        },
        dropped_reviews,
    }
}

fn find_rating_node(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => {
            if map.contains_key(RATING_MARKER) {
                return Some(value);
            }
            map.get("@graph").and_then(find_rating_node)
        }
        Value::Array(items) => items.iter().find_map(find_rating_node),
        _ => None,
    }
}

/// `review` may be a list or, per schema.org, a single object.
fn review_entries(node: &Value) -> Box<dyn Iterator<Item = &Value> + '_> {
    match node.get("review") {
        Some(Value::Array(items)) => Box::new(items.iter()),
        Some(single @ Value::Object(_)) => Box::new(std::iter::once(single)),
        _ => Box::new(std::iter::empty()),
    }
}

/// Reads a non-negative integer count; numeric strings are accepted.
fn count_field(aggregate: Option<&Value>, key: &str) -> u64 {
    let raw = aggregate.and_then(|a| a.get(key));
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    if parsed.is_none() {
        if let Some(value) = raw {
            tracing::warn!(key, value = %value, "non-numeric rating count; defaulting to 0");
        }
    }
    parsed.unwrap_or(0)
}

fn score(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn to_signed(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Mean rounded to 3 significant digits. An empty slice is `0 / 0`, i.e. NaN.
#[allow(clippy::cast_precision_loss)]
fn average(scores: &[f64]) -> f64 {
    let sum: f64 = scores.iter().sum();
    round_to_significant(sum / scores.len() as f64, 3)
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn round_to_significant(value: f64, digits: i32) -> f64 {
    if !value.is_normal() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32 + 1;
    let factor = 10f64.powi(digits - magnitude);
    (value * factor).round() / factor
}
