pub mod cache;
pub mod client;
pub mod detail;
pub mod diagnostic;
pub mod document;
pub mod error;
pub mod flavor;
pub mod listing;
pub(crate) mod rate_limit;
pub mod rating;
pub(crate) mod selectors;
pub mod source;
pub mod tasting_notes;

pub use cache::{cache_key, CachedPageSource};
pub use client::HttpPageSource;
pub use detail::{extract_detail, extract_detail_with_diagnostics, DetailExtraction};
pub use diagnostic::Diagnostic;
pub use document::ParsedDocument;
pub use error::{ExtractionError, FetchError, RatingError};
pub use listing::extract_listing;
pub use rating::{extract_rating_statistics, RatingReport};
pub use source::{LocalPageSource, PageSource};
pub use tasting_notes::{segment_tasting_notes, TastingSection};
