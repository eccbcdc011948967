//! Insight collection through a web-search API.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};
use ycs_core::Insight;
use ycs_storage::HttpClient;

use crate::AdapterError;

pub const GOOGLE_CUSTOM_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// The search API returns at most this many items per request.
pub const MAX_RESULTS_PER_QUERY: usize = 10;

/// Query variants issued per company. Bounded by the search API's rate limits.
pub const MAX_QUERY_VARIANTS: usize = 3;

pub const QUERY_TEMPLATES: &[&str] = &[
    "go-to-market strategy",
    "growth strategy",
    "how they started",
    "launch story",
    "business model",
];

pub const DEFAULT_PACING: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchHit>, AdapterError>;
}

/// Google Programmable Search (Custom Search JSON API).
#[derive(Debug, Clone)]
pub struct GoogleCustomSearch {
    http: HttpClient,
    api_key: String,
    engine_id: String,
    endpoint: String,
}

impl GoogleCustomSearch {
    pub fn new(http: HttpClient, api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            endpoint: GOOGLE_CUSTOM_SEARCH_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SearchApi for GoogleCustomSearch {
    async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchHit>, AdapterError> {
        let num = num.clamp(1, MAX_RESULTS_PER_QUERY).to_string();
        let body: JsonValue = self
            .http
            .execute_json("google-custom-search", |client| {
                client.get(&self.endpoint).query(&[
                    ("key", self.api_key.as_str()),
                    ("cx", self.engine_id.as_str()),
                    ("q", query),
                    ("num", num.as_str()),
                ])
            })
            .await?;
        Ok(hits_from_response(&body))
    }
}

/// Map a Custom Search response body to hits. No `items` means no hits; items without a
/// link are skipped.
pub fn hits_from_response(body: &JsonValue) -> Vec<SearchHit> {
    let Some(items) = body.get("items").and_then(JsonValue::as_array) else {
        return Vec::new();
    };
    let field = |item: &JsonValue, key: &str| {
        item.get(key)
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_string()
    };
    items
        .iter()
        .filter_map(|item| {
            let url = field(item, "link");
            if url.trim().is_empty() {
                return None;
            }
            Some(SearchHit {
                title: field(item, "title"),
                url,
                snippet: field(item, "snippet"),
            })
        })
        .collect()
}

/// The query variants issued for `company`, in order.
pub fn query_variants(company: &str) -> Vec<String> {
    QUERY_TEMPLATES
        .iter()
        .take(MAX_QUERY_VARIANTS)
        .map(|template| format!("\"{company}\" {template}"))
        .collect()
}

#[derive(Clone)]
pub struct InsightCollector {
    api: Arc<dyn SearchApi>,
    pacing: Duration,
}

impl InsightCollector {
    pub fn new(api: Arc<dyn SearchApi>) -> Self {
        Self {
            api,
            pacing: DEFAULT_PACING,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Search every query variant, dedupe by URL (first occurrence wins) and keep at most
    /// `count` insights. A failing variant is logged and skipped.
    pub async fn collect(&self, company: &str, count: usize) -> Vec<Insight> {
        let mut seen = HashSet::new();
        let mut insights = Vec::new();

        for (index, query) in query_variants(company).into_iter().enumerate() {
            if index > 0 && !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
            match self.api.search(&query, count).await {
                Ok(hits) => {
                    debug!(query = %query, hits = hits.len(), "search variant done");
                    for hit in hits {
                        if seen.insert(hit.url.clone()) {
                            insights.push(Insight {
                                title: hit.title,
                                url: hit.url,
                                snippet: hit.snippet,
                                query: query.clone(),
                            });
                        }
                    }
                }
                Err(err) => warn!(query = %query, error = %err, "search variant failed"),
            }
        }

        insights.truncate(count);
        info!(company, insights = insights.len(), "collected insights");
        insights
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    struct ScriptedSearch {
        calls: Mutex<Vec<(String, usize)>>,
    }

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            title: format!("title {url}"),
            url: url.to_string(),
            snippet: String::new(),
        }
    }

    #[async_trait]
    impl SearchApi for ScriptedSearch {
        async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchHit>, AdapterError> {
            self.calls.lock().unwrap().push((query.to_string(), num));
            if query.ends_with("growth strategy") {
                return Err(AdapterError::Message("quota exceeded".into()));
            }
            if query.ends_with("go-to-market strategy") {
                Ok(vec![hit("https://a.example"), hit("https://b.example")])
            } else {
                Ok(vec![hit("https://b.example"), hit("https://c.example"), hit("https://d.example")])
            }
        }
    }

    fn collector() -> (Arc<ScriptedSearch>, InsightCollector) {
        let api = Arc::new(ScriptedSearch {
            calls: Mutex::new(Vec::new()),
        });
        let collector = InsightCollector::new(api.clone()).with_pacing(Duration::ZERO);
        (api, collector)
    }

    #[test]
    fn three_quoted_variants_are_issued() {
        assert_eq!(
            query_variants("Acme"),
            vec![
                "\"Acme\" go-to-market strategy",
                "\"Acme\" growth strategy",
                "\"Acme\" how they started",
            ]
        );
    }

    #[tokio::test]
    async fn failed_variant_is_skipped_and_first_occurrence_wins() {
        let (api, collector) = collector();
        let insights = collector.collect("Acme", 10).await;

        assert_eq!(api.calls.lock().unwrap().len(), MAX_QUERY_VARIANTS);
        let urls = insights.iter().map(|i| i.url.as_str()).collect::<Vec<_>>();
        assert_eq!(
            urls,
            ["https://a.example", "https://b.example", "https://c.example", "https://d.example"]
        );
        assert_eq!(insights[1].query, "\"Acme\" go-to-market strategy");
        assert_eq!(insights[2].query, "\"Acme\" how they started");
    }

    #[tokio::test]
    async fn results_are_truncated_to_requested_count() {
        let (_, collector) = collector();
        let insights = collector.collect("Acme", 3).await;
        assert_eq!(insights.len(), 3);
    }

    struct ClockedSearch {
        started: tokio::time::Instant,
        offsets: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl SearchApi for ClockedSearch {
        async fn search(&self, query: &str, _num: usize) -> Result<Vec<SearchHit>, AdapterError> {
            self.offsets.lock().unwrap().push(self.started.elapsed());
            Ok(vec![hit(&format!("https://{}.example", query.len()))])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn variants_are_paced_with_no_pause_before_the_first() {
        let started = tokio::time::Instant::now();
        let api = Arc::new(ClockedSearch {
            started,
            offsets: Mutex::new(Vec::new()),
        });
        let pacing = Duration::from_secs(1);
        let collector = InsightCollector::new(api.clone()).with_pacing(pacing);

        collector.collect("Acme", 5).await;

        assert_eq!(started.elapsed(), pacing * 2);
        assert_eq!(
            api.offsets.lock().unwrap().as_slice(),
            [Duration::ZERO, pacing, pacing * 2]
        );
    }

    #[test]
    fn response_without_items_or_links() {
        assert!(hits_from_response(&json!({"searchInformation": {"totalResults": "0"}})).is_empty());

        let hits = hits_from_response(&json!({"items": [
            {"title": "No link", "snippet": "x"},
            {"title": "Blank", "link": "  "},
            {"title": "Kept", "link": "https://kept.example", "snippet": "s"}
        ]}));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Kept");
        assert_eq!(hits[0].snippet, "s");
    }
}
