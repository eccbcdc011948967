//! Page rendering seam and the scraper that turns rendered HTML into `ExtractedPage`s.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info_span, warn, Instrument};
use url::Url;
use ycs_core::ExtractedPage;
use ycs_storage::{ArtifactStore, HttpClient};

use crate::landing::extract_landing;
use crate::listing::{extract_listing, ListingHints};
use crate::{AdapterError, PageKind};

pub const LISTING_HOST: &str = "ycombinator.com";
pub const LISTING_PATH_PREFIX: &str = "/companies/";

/// Produces the fully rendered HTML of a page.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &str, kind: PageKind) -> Result<String, AdapterError>;
}

/// Plain GET renderer. Enough for pages that ship their content (or a structured payload)
/// in the initial HTML.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    http: HttpClient,
}

impl HttpRenderer {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str, _kind: PageKind) -> Result<String, AdapterError> {
        let response = self.http.get_text(url).await?;
        Ok(response.text())
    }
}

#[cfg(feature = "webdriver")]
mod webdriver {
    use std::time::Duration;

    use async_trait::async_trait;
    use thirtyfour::{ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};

    use super::PageRenderer;
    use crate::{AdapterError, PageKind};

    const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

    /// Headless Chrome through a WebDriver server. One browser session per render.
    #[derive(Debug, Clone)]
    pub struct WebDriverRenderer {
        server_url: String,
    }

    impl WebDriverRenderer {
        pub fn new(server_url: impl Into<String>) -> Self {
            Self {
                server_url: server_url.into(),
            }
        }

        /// Client-side rendering settle time after navigation.
        fn settle_delay(kind: PageKind) -> Duration {
            match kind {
                PageKind::Listing => Duration::from_secs(3),
                PageKind::Landing => Duration::from_secs(2),
            }
        }
    }

    fn render_error(url: &str, err: impl std::fmt::Display) -> AdapterError {
        AdapterError::Render {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }

    #[async_trait]
    impl PageRenderer for WebDriverRenderer {
        async fn render(&self, url: &str, kind: PageKind) -> Result<String, AdapterError> {
            let mut caps = DesiredCapabilities::chrome();
            caps.set_headless().map_err(|err| render_error(url, err))?;
            caps.set_no_sandbox().map_err(|err| render_error(url, err))?;
            caps.set_disable_dev_shm_usage()
                .map_err(|err| render_error(url, err))?;

            let driver = WebDriver::new(&self.server_url, caps)
                .await
                .map_err(|err| render_error(url, err))?;

            let result = async {
                driver.set_page_load_timeout(PAGE_LOAD_TIMEOUT).await?;
                driver.goto(url).await?;
                tokio::time::sleep(Self::settle_delay(kind)).await;
                driver.source().await
            }
            .await;

            if let Err(err) = driver.quit().await {
                tracing::debug!(error = %err, "webdriver session did not quit cleanly");
            }
            result.map_err(|err| render_error(url, err))
        }
    }
}

#[cfg(feature = "webdriver")]
pub use webdriver::WebDriverRenderer;

/// Prefix `https://` when `url` carries no scheme.
pub fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// `ycombinator.com/companies/<slug>` on the apex or any subdomain.
pub fn is_listing_url(url: &str) -> bool {
    let Ok(parsed) = Url::parse(&normalize_url(url)) else {
        return false;
    };
    let host_ok = parsed
        .host_str()
        .is_some_and(|host| host == LISTING_HOST || host.ends_with(&format!(".{LISTING_HOST}")));
    let slug = parsed.path().strip_prefix(LISTING_PATH_PREFIX).unwrap_or_default();
    host_ok && !slug.trim_matches('/').is_empty()
}

/// Renders and extracts pages. Never fails: render errors come back as error-marked pages.
#[derive(Clone)]
pub struct PageScraper {
    renderer: Arc<dyn PageRenderer>,
    snapshots: Option<ArtifactStore>,
}

impl PageScraper {
    pub fn new(renderer: Arc<dyn PageRenderer>) -> Self {
        Self {
            renderer,
            snapshots: None,
        }
    }

    /// Keep every rendered page as a hash-addressed raw artifact.
    pub fn with_snapshots(mut self, store: ArtifactStore) -> Self {
        self.snapshots = Some(store);
        self
    }

    pub async fn scrape_listing(&self, url: &str, hints: Option<&ListingHints>) -> ExtractedPage {
        match self.render(url, PageKind::Listing).await {
            Ok(html) => extract_listing(url, &html, hints),
            Err(err) => {
                warn!(url, error = %err, "listing scrape failed");
                ExtractedPage::failed(url, err.to_string())
            }
        }
    }

    pub async fn scrape_landing(&self, url: &str) -> ExtractedPage {
        let url = normalize_url(url);
        match self.render(&url, PageKind::Landing).await {
            Ok(html) => extract_landing(&url, &html),
            Err(err) => {
                warn!(url = %url, error = %err, "landing page scrape failed");
                ExtractedPage::failed(url, err.to_string())
            }
        }
    }

    async fn render(&self, url: &str, kind: PageKind) -> Result<String, AdapterError> {
        let span = info_span!("render", url, kind = kind.as_str());
        async {
            let html = self.renderer.render(url, kind).await?;
            debug!(bytes = html.len(), "rendered");
            if let Some(store) = &self.snapshots {
                match store
                    .store_bytes(Utc::now(), kind.as_str(), "html", html.as_bytes())
                    .await
                {
                    Ok(stored) => debug!(
                        path = %stored.relative_path.display(),
                        deduplicated = stored.deduplicated,
                        "stored raw snapshot"
                    ),
                    Err(err) => warn!(error = %err, "could not store raw snapshot"),
                }
            }
            Ok(html)
        }
        .instrument(span)
        .await
    }
}
