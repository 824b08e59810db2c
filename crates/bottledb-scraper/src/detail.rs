//! Assembles a [`DetailBottleRecord`] from a basic listing record and its
//! parsed detail page.
//!
//! Single-value lookups degrade to `None`; only a page that carries none of
//! the detail-page fragments at all is rejected.

use bottledb_core::{BasicBottleRecord, DetailBottleRecord};

use crate::diagnostic::Diagnostic;
use crate::document::{non_empty, Fragment, LocatorRule, ParsedDocument};
use crate::error::ExtractionError;
use crate::flavor::parse_flavor_spiral;
use crate::rating::{extract_rating_statistics, RATING_MARKER};
use crate::selectors::detail;
use crate::tasting_notes::extract_tasting_notes;

/// A detail record together with everything that was defaulted or dropped
/// while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailExtraction {
    pub record: DetailBottleRecord,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extracts the detail record, discarding diagnostics.
///
/// # Errors
///
/// Returns [`ExtractionError::NotADetailPage`] when the page has none of the
/// fragments a bottle detail page carries.
pub fn extract_detail(
    doc: &ParsedDocument,
    basic: BasicBottleRecord,
) -> Result<DetailBottleRecord, ExtractionError> {
    extract_detail_with_diagnostics(doc, basic).map(|extraction| extraction.record)
}

/// Extracts the detail record and reports every non-fatal diagnostic.
///
/// # Errors
///
/// Returns [`ExtractionError::NotADetailPage`] when the page has none of the
/// fragments a bottle detail page carries.
pub fn extract_detail_with_diagnostics(
    doc: &ParsedDocument,
    basic: BasicBottleRecord,
) -> Result<DetailExtraction, ExtractionError> {
    if !looks_like_detail_page(doc) {
        return Err(ExtractionError::NotADetailPage { url: basic.href });
    }

    let mut diagnostics = Vec::new();

    let style = labelled(doc, "style", "Style", &mut diagnostics);
    let region = labelled(doc, "region", "Region", &mut diagnostics);
    let country = labelled(doc, "country", "Country", &mut diagnostics);
    let distillery = labelled(doc, "distillery", "Distillery", &mut diagnostics)
        .and_then(|raw| clean_distillery(&raw));
    let alcohol_percent = labelled(doc, "alcoholPercent", "Alcohol", &mut diagnostics);
    let age = labelled(doc, "age", "Age", &mut diagnostics);
    let single_cask = labelled(doc, "singleCask", "Single Cask", &mut diagnostics);
    let maturation = labelled(doc, "maturation", "Maturation", &mut diagnostics);

    let volume = doc
        .raw_text(&detail::VOLUME_ALCOHOL)
        .and_then(|text| volume_from_fragment(&text));
    if volume.is_none() {
        tracing::debug!(url = %basic.href, "volume not found");
        diagnostics.push(Diagnostic::MissingFragment { field: "volume" });
    }

    let ratings = match extract_rating_statistics(doc) {
        Ok(report) => {
            diagnostics.extend(
                report
                    .dropped_reviews
                    .into_iter()
                    .map(|dropped| Diagnostic::DroppedReview {
                        index: dropped.index,
                        value: dropped.value,
                    }),
            );
            Some(report.statistics)
        }
        Err(e) => {
            tracing::warn!(url = %basic.href, error = %e, "rating statistics unavailable");
            diagnostics.push(Diagnostic::MalformedStructuredData {
                reason: e.to_string(),
            });
            None
        }
    };

    let (flavor_spiral, flavor_diagnostics) = parse_flavor_spiral(doc);
    diagnostics.extend(flavor_diagnostics);

    let (tasting_notes, notes_diagnostics) = extract_tasting_notes(doc);
    diagnostics.extend(notes_diagnostics);

    tracing::debug!(
        url = %basic.href,
        diagnostics = diagnostics.len(),
        flavors = flavor_spiral.len(),
        "extracted detail record"
    );

    Ok(DetailExtraction {
        record: DetailBottleRecord {
            basic,
            style,
            region,
            country,
            distillery,
            alcohol_percent,
            volume,
            age,
            single_cask,
            maturation,
            ratings,
            flavor_spiral,
            tasting_notes,
        },
        diagnostics,
    })
}

fn looks_like_detail_page(doc: &ParsedDocument) -> bool {
    doc.contains(&detail::TITLE)
        || doc.contains(&detail::VOLUME_ALCOHOL)
        || doc.contains(&detail::TASTING_NOTES)
        || doc.contains(&detail::FLAVOUR)
        || doc
            .locate(&LocatorRule::MarkerToken(RATING_MARKER))
            .is_some()
}

fn labelled(
    doc: &ParsedDocument,
    field: &'static str,
    label: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<String> {
    let value = doc
        .locate(&LocatorRule::LabelAdjacent {
            label_selector: &detail::TITLE,
            label,
        })
        .and_then(Fragment::into_text);
    if value.is_none() {
        tracing::debug!(field, label, "labelled value not found");
        diagnostics.push(Diagnostic::MissingFragment { field });
    }
    value
}

/// Joins the lines of a distillery value, dropping indentation, blank lines
/// and lines holding only a link arrow such as `>`.
#[must_use]
pub fn clean_distillery(raw: &str) -> Option<String> {
    let cleaned = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.chars().all(is_arrow_or_space))
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(&cleaned)
}

fn is_arrow_or_space(c: char) -> bool {
    matches!(c, '>' | '\u{203a}' | '\u{bb}' | '\u{2192}') || c.is_whitespace()
}

/// Volume part of a `"(0.7l, 43%)"` fragment.
#[must_use]
pub fn volume_from_fragment(text: &str) -> Option<String> {
    let (_, after_paren) = text.split_once('(')?;
    let (volume, _) = after_paren.split_once(',')?;
    non_empty(volume)
}

#[cfg(test)]
#[path = "detail_test.rs"]
mod tests;
