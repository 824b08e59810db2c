//! Flavor spiral: each `div.flavour.lazy` segment names a flavor and encodes
//! its intensity tier in the inline `width` style.

use std::sync::LazyLock;

use bottledb_core::{FlavorSpiral, FlavorTier};
use regex::Regex;
use scraper::ElementRef;

use crate::diagnostic::Diagnostic;
use crate::document::{text_of, Fragment, LocatorRule, ParsedDocument};
use crate::selectors::detail;

static WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[;\s])width:\s*([0-9.]+%)").expect("valid width regex")
});

/// Width encodings the storefront renders, one per tier. Anything else has
/// no tier; nearest-width guessing is deliberately absent.
const TIER_TABLE: [(&str, FlavorTier); 3] = [
    ("50%", FlavorTier::Primary),
    ("32.5%", FlavorTier::Secondary),
    ("21.125%", FlavorTier::Tertiary),
];

/// One segment as found on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavorFragment {
    pub flavor: String,
    pub width: Option<String>,
}

impl FlavorFragment {
    fn from_element(element: ElementRef<'_>) -> Self {
        let width = element
            .value()
            .attr("style")
            .and_then(|style| WIDTH.captures(style))
            .map(|caps| caps[1].to_owned());
        Self {
            flavor: text_of(element).trim().to_owned(),
            width,
        }
    }
}

/// Exact lookup of a width string such as `"32.5%"`.
#[must_use]
pub fn tier_for_width(width: &str) -> Option<FlavorTier> {
    TIER_TABLE
        .iter()
        .find(|(w, _)| *w == width)
        .map(|(_, tier)| *tier)
}

/// Buckets fragments by tier, keeping source order within each tier.
#[must_use]
pub fn bucket_fragments(fragments: Vec<FlavorFragment>) -> (FlavorSpiral, Vec<Diagnostic>) {
    let mut spiral = FlavorSpiral::default();
    let mut diagnostics = Vec::new();

    for FlavorFragment { flavor, width } in fragments {
        if flavor.is_empty() {
            continue;
        }
        match width.as_deref().and_then(tier_for_width) {
            Some(tier) => spiral.push(tier, flavor),
            None => {
                tracing::debug!(%flavor, width = ?width, "dropping flavor with unmapped tier");
                diagnostics.push(Diagnostic::UnmappedTier { flavor, width });
            }
        }
    }

    (spiral, diagnostics)
}

/// Reads every flavor segment on a detail page. A page without segments
/// yields an empty spiral.
#[must_use]
pub fn parse_flavor_spiral(doc: &ParsedDocument) -> (FlavorSpiral, Vec<Diagnostic>) {
    let fragments = doc
        .locate(&LocatorRule::Selector(&detail::FLAVOUR))
        .map(Fragment::into_elements)
        .unwrap_or_default()
        .into_iter()
        .map(FlavorFragment::from_element)
        .collect();
    bucket_fragments(fragments)
}
