//! Listing page: one [`BasicBottleRecord`] per bottle tile.

use std::sync::LazyLock;

use bottledb_core::BasicBottleRecord;
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Selector};

use crate::document::{text_of, Fragment, LocatorRule, ParsedDocument};
use crate::error::ExtractionError;
use crate::selectors::listing;

static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));

/// Extracts every bottle tile in page order. Tiles whose link cannot be
/// resolved against `base_url` are skipped.
///
/// # Errors
///
/// Returns [`ExtractionError::InvalidBaseUrl`] if `base_url` is not an
/// absolute URL.
pub fn extract_listing(
    doc: &ParsedDocument,
    base_url: &str,
) -> Result<Vec<BasicBottleRecord>, ExtractionError> {
    let base = Url::parse(base_url).map_err(|e| ExtractionError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })?;

    let items = doc
        .locate(&LocatorRule::Selector(&listing::ITEM))
        .map(Fragment::into_elements)
        .unwrap_or_default();

    let mut records = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        let Some(href) = item.value().attr("href") else {
            tracing::warn!(position, "listing item has no href; skipping");
            continue;
        };
        let href = match base.join(href.trim()) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!(position, href, error = %e, "unresolvable listing href; skipping");
                continue;
            }
        };

        records.push(BasicBottleRecord {
            href,
            brand: child_text(item, &listing::BRAND).unwrap_or_default(),
            name: clean_name(&child_text(item, &listing::EDITION).unwrap_or_default()),
            category: child_text(item, &listing::CATEGORY).unwrap_or_default(),
            rating: parse_rating(child_text(item, &listing::RATING).as_deref()),
            price: parse_price(&child_text(item, &listing::PRICE).unwrap_or_default()),
        });
    }

    tracing::debug!(count = records.len(), "parsed listing page");
    Ok(records)
}

fn child_text(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    item.select(selector)
        .next()
        .map(|el| text_of(el).trim().to_owned())
}

/// Edition names arrive with embedded newlines, commas and HTML-escaped
/// ampersands.
#[must_use]
pub fn clean_name(raw: &str) -> String {
    let stripped = raw.trim().replace(['\n', '\r', ','], "").replace("&amp;", "&");
    SPACE_RUNS.replace_all(&stripped, " ").into_owned()
}

/// Listing rating: absent or blank is `0`, anything non-numeric is NaN.
#[must_use]
pub fn parse_rating(raw: Option<&str>) -> f64 {
    match raw.map(str::trim) {
        None | Some("") => 0.0,
        Some(text) => text.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// Listing price with currency symbol and thousands separators removed;
/// NaN when what remains is not a non-negative number.
#[must_use]
pub fn parse_price(raw: &str) -> f64 {
    let cleaned = raw.trim().replace(['$', ','], "");
    match cleaned.trim().parse::<f64>() {
        Ok(price) if price >= 0.0 => price,
        _ => f64::NAN,
    }
}
