//! Source adapters: rendered-page extraction and search-engine insight collection.

pub mod insights;
pub mod landing;
pub mod listing;
pub mod render;
pub mod strategy;

use thiserror::Error;
use ycs_storage::FetchError;

pub use insights::{
    hits_from_response, query_variants, GoogleCustomSearch, InsightCollector, SearchApi,
    SearchHit,
};
pub use landing::extract_landing;
pub use listing::{extract_listing, ListingHints};
pub use render::{is_listing_url, normalize_url, HttpRenderer, PageRenderer, PageScraper};
#[cfg(feature = "webdriver")]
pub use render::WebDriverRenderer;

pub const CRATE_NAME: &str = "ycs-adapters";

/// Which kind of page a render/extract call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Listing,
    Landing,
}

impl PageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Landing => "landing",
        }
    }
}

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("render failed for {url}: {reason}")]
    Render { url: String, reason: String },
}
