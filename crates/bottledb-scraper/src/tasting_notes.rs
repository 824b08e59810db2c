//! Splits the free-text `#tasting-notes` block into its four sections.
//!
//! Each section is matched on its own: it starts after the earliest of its
//! heading variants and ends at the nearest heading of any later section, or
//! at the end of the block. A missing heading therefore only blanks its own
//! section.
//!
//! A heading must stand as whole words. Headings that open a line win over
//! ones found mid-line, so prose such as "the Finish is long" inside an
//! earlier section is not taken for the Finish heading.

use std::fmt;
use std::sync::LazyLock;

use bottledb_core::TastingNotes;
use regex::Regex;

use crate::diagnostic::Diagnostic;
use crate::document::ParsedDocument;
use crate::selectors::detail;

static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TastingSection {
    Appearance,
    Smell,
    Flavor,
    Finish,
}

impl TastingSection {
    /// Page order of the sections.
    pub const ORDER: [TastingSection; 4] = [
        TastingSection::Appearance,
        TastingSection::Smell,
        TastingSection::Flavor,
        TastingSection::Finish,
    ];

    /// Heading wordings the storefront has used for this section.
    #[must_use]
    pub fn headings(self) -> &'static [&'static str] {
        match self {
            TastingSection::Appearance => &["Appearance / Color", "Appearance / Colour"],
            TastingSection::Smell => &["Smell / Nose / Aroma", "Nose / Aroma / Smell"],
            TastingSection::Flavor => &["Flavor / Taste / Palate", "Flavour / Taste / Palate"],
            TastingSection::Finish => &["Finish"],
        }
    }

    fn later(self) -> impl Iterator<Item = TastingSection> {
        Self::ORDER
            .into_iter()
            .skip_while(move |s| *s != self)
            .skip(1)
    }
}

impl fmt::Display for TastingSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TastingSection::Appearance => "appearance",
            TastingSection::Smell => "smell",
            TastingSection::Flavor => "flavor",
            TastingSection::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// Collapses runs of two or more spaces and removes every `.`.
#[must_use]
pub fn normalize_notes(raw: &str) -> String {
    SPACE_RUNS.replace_all(raw, " ").replace('.', "")
}

/// Earliest match of any heading of `section` at or after `from`, as
/// `(heading_start, heading_end)`. Line-opening matches are preferred; a
/// mid-line match is used only when the section has none.
fn find_heading(text: &str, section: TastingSection, from: usize) -> Option<(usize, usize)> {
    let haystack = text.get(from..)?;
    let candidates = || {
        section
            .headings()
            .iter()
            .flat_map(|heading| haystack.match_indices(heading))
            .map(|(at, heading)| (from + at, from + at + heading.len()))
            .filter(|&(_, end)| text[end..].chars().next().is_none_or(char::is_whitespace))
    };

    candidates()
        .filter(|&(start, _)| opens_line(text, start))
        .min_by_key(|(start, _)| *start)
        .or_else(|| {
            candidates()
                .filter(|&(start, _)| {
                    text[..start]
                        .chars()
                        .next_back()
                        .is_none_or(char::is_whitespace)
                })
                .min_by_key(|(start, _)| *start)
        })
}

/// `true` when only whitespace precedes `at` on its line.
fn opens_line(text: &str, at: usize) -> bool {
    let line_prefix = text[..at].rsplit_once('\n').map_or(&text[..at], |(_, tail)| tail);
    line_prefix.trim().is_empty()
}

fn section_span(text: &str, section: TastingSection) -> Option<String> {
    let (_, content_start) = find_heading(text, section, 0)?;
    let content_end = section
        .later()
        .filter_map(|later| find_heading(text, later, content_start))
        .map(|(start, _)| start)
        .min()
        .unwrap_or(text.len());

    let span = text[content_start..content_end].trim();
    Some(if section == TastingSection::Flavor {
        span.replace(['\n', '\r'], "")
    } else {
        span.to_owned()
    })
}

/// Segments an already-normalized tasting-notes block.
#[must_use]
pub fn segment_tasting_notes(text: &str) -> (TastingNotes, Vec<Diagnostic>) {
    let mut notes = TastingNotes::default();
    let mut diagnostics = Vec::new();

    for section in TastingSection::ORDER {
        let span = section_span(text, section);
        if span.is_none() {
            tracing::debug!(%section, "tasting-notes heading not found");
            diagnostics.push(Diagnostic::SectionBoundaryNotFound { section });
        }
        let slot = match section {
            TastingSection::Appearance => &mut notes.appearance,
            TastingSection::Smell => &mut notes.smell,
            TastingSection::Flavor => &mut notes.flavor,
            TastingSection::Finish => &mut notes.finish,
        };
        *slot = span;
    }

    (notes, diagnostics)
}

/// Locates, normalizes and segments the page's tasting notes.
#[must_use]
pub fn extract_tasting_notes(doc: &ParsedDocument) -> (TastingNotes, Vec<Diagnostic>) {
    match doc.raw_text(&detail::TASTING_NOTES) {
        Some(raw) => segment_tasting_notes(&normalize_notes(&raw)),
        None => {
            tracing::debug!("page has no tasting-notes block");
            (
                TastingNotes::default(),
                vec![Diagnostic::MissingFragment {
                    field: "tastingNotes",
                }],
            )
        }
    }
}
