//! CSS selectors for the storefront's listing and detail pages.
//!
//! Update this file when the storefront markup changes, and add a fixture
//! covering the new shape to the matching test module.

use std::sync::LazyLock;

use scraper::Selector;

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Bottle detail page.
pub(crate) mod detail {
    use super::{selector, LazyLock, Selector};

    /// Attribute labels; the value is the label's next element sibling.
    pub(crate) static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("div.title"));

    /// Combined fragment such as `"(0.7l, 43%)"`.
    pub(crate) static VOLUME_ALCOHOL: LazyLock<Selector> = LazyLock::new(|| selector(".vol-alc"));

    /// Flavor spiral segments; intensity is encoded in the inline `width`.
    pub(crate) static FLAVOUR: LazyLock<Selector> =
        LazyLock::new(|| selector("div.flavour.lazy"));

    pub(crate) static TASTING_NOTES: LazyLock<Selector> =
        LazyLock::new(|| selector("#tasting-notes"));

    pub(crate) static SCRIPT: LazyLock<Selector> = LazyLock::new(|| selector("script"));
}

/// Listing page.
pub(crate) mod listing {
    use super::{selector, LazyLock, Selector};

    pub(crate) static ITEM: LazyLock<Selector> = LazyLock::new(|| selector("div.col-lg-3 > a"));
    pub(crate) static BRAND: LazyLock<Selector> = LazyLock::new(|| selector("div.name"));
    pub(crate) static EDITION: LazyLock<Selector> = LazyLock::new(|| selector("div.edition"));
    pub(crate) static CATEGORY: LazyLock<Selector> = LazyLock::new(|| selector("div.type"));
    pub(crate) static RATING: LazyLock<Selector> = LazyLock::new(|| selector("span.valueRating"));
    pub(crate) static PRICE: LazyLock<Selector> = LazyLock::new(|| selector("div.price"));
}
