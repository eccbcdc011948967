//! Per-candidate collection: listing page, landing page, search insights.

use tracing::{info, info_span, Instrument};
use ycs_adapters::{InsightCollector, ListingHints, PageScraper};
use ycs_core::{Candidate, CompanyRecord, ExtractedPage};

pub const INSIGHTS_PER_COMPANY: usize = 5;

#[derive(Clone)]
pub struct CompanyCollector {
    scraper: PageScraper,
    insights: InsightCollector,
    insight_count: usize,
}

impl CompanyCollector {
    pub fn new(scraper: PageScraper, insights: InsightCollector) -> Self {
        Self {
            scraper,
            insights,
            insight_count: INSIGHTS_PER_COMPANY,
        }
    }

    pub fn with_insight_count(mut self, count: usize) -> Self {
        self.insight_count = count;
        self
    }

    /// Each source fills its own part of the record. The landing page is only requested
    /// when the listing resolved a website.
    pub async fn collect(&self, candidate: Candidate) -> CompanyRecord {
        let span = info_span!("company", name = %candidate.name);
        async {
            let listing = if candidate.url.trim().is_empty() {
                ExtractedPage::failed("", "candidate has no listing URL")
            } else {
                let hints = ListingHints::from_candidate(&candidate);
                self.scraper.scrape_listing(&candidate.url, Some(&hints)).await
            };

            let landing_page = if listing.website.is_empty() {
                info!("no website resolved; skipping landing page");
                None
            } else {
                Some(self.scraper.scrape_landing(&listing.website).await)
            };

            let name = if candidate.name.is_empty() {
                listing.name.clone()
            } else {
                candidate.name.clone()
            };
            let insights = self.insights.collect(&name, self.insight_count).await;

            CompanyRecord {
                candidate,
                listing,
                landing_page,
                insights,
            }
        }
        .instrument(span)
        .await
    }
}
