use std::fmt;

use serde_json::Value;

use crate::tasting_notes::TastingSection;

/// A non-fatal observation made while extracting one record.
///
/// Extractors log each diagnostic where it is produced and also hand it back
/// so callers (and tests) can inspect exactly what was defaulted or dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A locator found nothing; the field is left absent.
    MissingFragment { field: &'static str },
    /// The rating payload was absent or not valid JSON; statistics are absent.
    MalformedStructuredData { reason: String },
    /// A review without a usable score was excluded from the average.
    DroppedReview { index: usize, value: Value },
    /// A flavor fragment whose width does not map to a tier.
    UnmappedTier {
        flavor: String,
        width: Option<String>,
    },
    /// The heading for a tasting-notes section was not found.
    SectionBoundaryNotFound { section: TastingSection },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingFragment { field } => write!(f, "missing fragment for {field}"),
            Diagnostic::MalformedStructuredData { reason } => {
                write!(f, "malformed structured data: {reason}")
            }
            Diagnostic::DroppedReview { index, value } => {
                write!(f, "dropped review #{index} with rating value {value}")
            }
            Diagnostic::UnmappedTier {
                flavor,
                width: Some(width),
            } => write!(f, "flavor \"{flavor}\" has unmapped width {width}"),
            Diagnostic::UnmappedTier { flavor, width: None } => {
                write!(f, "flavor \"{flavor}\" has no width")
            }
            Diagnostic::SectionBoundaryNotFound { section } => {
                write!(f, "tasting-notes heading for {section} not found")
            }
        }
    }
}
