//! Parsed page wrapper and the structural lookups the extractors share.
//!
//! Every lookup returns an `Option`: a page that lacks a fragment is normal,
//! and callers decide what absence means for their field.

use scraper::{ElementRef, Html, Selector};

/// An immutable parsed HTML page.
///
/// Owned by the extraction call that parsed it and dropped once the record is
/// assembled. `Html` is not `Send`, so a document must not be held across an
/// `.await`.
pub struct ParsedDocument {
    html: Html,
}

/// A structural rule understood by [`ParsedDocument::locate`].
#[derive(Debug, Clone, Copy)]
pub enum LocatorRule<'r> {
    /// Element matching `label_selector` whose text equals (or, failing that,
    /// contains) `label`; yields the trimmed text of its next element sibling.
    LabelAdjacent {
        label_selector: &'r Selector,
        label: &'r str,
    },
    /// All elements matching the selector.
    Selector(&'r Selector),
    /// Every `<script>` element whose text contains the token.
    MarkerToken(&'r str),
}

/// What a [`LocatorRule`] found.
#[derive(Debug)]
pub enum Fragment<'a> {
    Text(String),
    Elements(Vec<ElementRef<'a>>),
}

impl<'a> Fragment<'a> {
    /// The located text, if this fragment is textual.
    #[must_use]
    pub fn into_text(self) -> Option<String> {
        match self {
            Fragment::Text(text) => Some(text),
            Fragment::Elements(_) => None,
        }
    }

    /// The located elements; empty for a textual fragment.
    #[must_use]
    pub fn into_elements(self) -> Vec<ElementRef<'a>> {
        match self {
            Fragment::Elements(elements) => elements,
            Fragment::Text(_) => Vec::new(),
        }
    }
}

impl ParsedDocument {
    /// Parses a full HTML document. Parsing never fails; malformed markup is
    /// repaired the way a browser would.
    #[must_use]
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Resolves `rule` against the document. `None` means nothing matched.
    #[must_use]
    pub fn locate(&self, rule: &LocatorRule<'_>) -> Option<Fragment<'_>> {
        match *rule {
            LocatorRule::LabelAdjacent {
                label_selector,
                label,
            } => self
                .label_adjacent_text(label_selector, label)
                .map(Fragment::Text),
            LocatorRule::Selector(selector) => elements(self.html.select(selector).collect()),
            LocatorRule::MarkerToken(marker) => elements(
                self.html
                    .select(&crate::selectors::detail::SCRIPT)
                    .filter(|script| text_of(*script).contains(marker))
                    .collect(),
            ),
        }
    }

    /// `true` when at least one element matches `selector`.
    #[must_use]
    pub fn contains(&self, selector: &Selector) -> bool {
        self.html.select(selector).next().is_some()
    }

    /// Untrimmed text of the first element matching `selector`.
    #[must_use]
    pub fn raw_text(&self, selector: &Selector) -> Option<String> {
        self.html.select(selector).next().map(text_of)
    }

    /// Trimmed text of the element following a label.
    ///
    /// An exact label match wins over a substring match so that, for example,
    /// `"Age"` does not resolve to an `"Average rating"` label when both exist.
    #[must_use]
    pub fn label_adjacent_text(&self, label_selector: &Selector, label: &str) -> Option<String> {
        let labels: Vec<(ElementRef<'_>, String)> = self
            .html
            .select(label_selector)
            .map(|el| (el, text_of(el)))
            .collect();

        let (label_el, _) = labels
            .iter()
            .find(|(_, text)| text.trim() == label)
            .or_else(|| labels.iter().find(|(_, text)| text.contains(label)))?;

        let value_el = label_el.next_siblings().find_map(ElementRef::wrap)?;
        non_empty(&text_of(value_el))
    }
}

fn elements(matches: Vec<ElementRef<'_>>) -> Option<Fragment<'_>> {
    if matches.is_empty() {
        None
    } else {
        Some(Fragment::Elements(matches))
    }
}

/// Concatenated text of an element and all its descendants.
#[must_use]
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Trimmed copy of `text`, or `None` when it is blank.
pub(crate) fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
