//! Core domain model for YC Strategy Scout.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const CRATE_NAME: &str = "ycs-core";

/// A company surfaced by similarity search against the user's idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Candidate {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub main_industry: String,
    #[serde(default)]
    pub sub_industry: String,
    #[serde(default)]
    pub batch: String,
    /// Canonical listing URL on the source platform.
    #[serde(default)]
    pub url: String,
    /// Higher means more similar.
    #[serde(default)]
    pub similarity_score: f32,
}

/// Fields extracted from one rendered page.
///
/// Listing pages populate the identity fields (name through website), landing pages the
/// marketing fields (hero text through main text). Unresolved fields stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExtractedPage {
    pub source_url: String,
    pub name: String,
    pub short_description: String,
    pub full_description: String,
    pub founders: Vec<String>,
    pub batch: String,
    /// Deduplicated; order carries no meaning.
    pub tags: Vec<String>,
    pub website: String,
    pub hero_text: String,
    pub value_proposition: String,
    pub headlines: Vec<String>,
    pub features: Vec<String>,
    pub pricing: String,
    pub main_text: String,
    /// Field name -> label of the extraction strategy that produced it.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub provenance: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractedPage {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Default::default()
        }
    }

    /// Error-marked page: only the source URL and a description of what went wrong.
    pub fn failed(source_url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn record_provenance(&mut self, field: &str, strategy: &str) {
        self.provenance.insert(field.to_string(), strategy.to_string());
    }

    pub fn provenance_of(&self, field: &str) -> Option<&str> {
        self.provenance.get(field).map(String::as_str)
    }
}

/// One search-engine result about a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// The query variant that first produced this URL.
    pub query: String,
}

/// Merged per-candidate record. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub candidate: Candidate,
    pub listing: ExtractedPage,
    /// `None` when the listing resolved no website and no landing request was made.
    #[serde(default)]
    pub landing_page: Option<ExtractedPage>,
    #[serde(default)]
    pub insights: Vec<Insight>,
}

impl CompanyRecord {
    pub fn name(&self) -> &str {
        if self.candidate.name.is_empty() {
            &self.listing.name
        } else {
            &self.candidate.name
        }
    }
}

/// Intermediate artifact handed to the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedCorpus {
    pub user_idea: String,
    pub collected_at: DateTime<Utc>,
    pub companies: Vec<CompanyRecord>,
}

/// Parsed but unvalidated model output. Keys and nesting may vary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawAnalysis(pub JsonValue);

impl RawAnalysis {
    pub fn empty() -> Self {
        Self(JsonValue::Object(Default::default()))
    }

    pub fn as_object(&self) -> Option<&serde_json::Map<String, JsonValue>> {
        self.0.as_object()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VisionSection {
    pub problem: String,
    pub solution: String,
    pub unique_value: String,
    pub target_audience: String,
    pub positioning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketSection {
    pub market_size: String,
    pub direct_competitors: Vec<String>,
    pub competitor_weaknesses: String,
    pub trends: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessModelSection {
    pub revenue_model: String,
    pub pricing: String,
    pub initial_costs: String,
    pub break_even_point: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductSection {
    pub core_features: Vec<String>,
    pub user_flow: Vec<String>,
    pub design: String,
    pub tech_stack: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanningSection {
    pub step1: String,
    pub step2: String,
    pub step3: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AcquisitionSection {
    pub social_media: String,
    pub seo: String,
    pub partnerships: String,
    pub advertising: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsSection {
    pub key_metrics: Vec<String>,
    pub tools: Vec<String>,
    pub success_thresholds: String,
}

/// Canonical, fully keyed report. Every field is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StrategyReport {
    pub vision: VisionSection,
    pub market: MarketSection,
    pub business_model: BusinessModelSection,
    pub product: ProductSection,
    pub planning: PlanningSection,
    pub acquisition: AcquisitionSection,
    pub metrics: MetricsSection,
    /// Passed through from the model output as-is.
    pub similar_companies: Vec<JsonValue>,
}

/// Persisted wrapper around the final report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    pub generated_at: DateTime<Utc>,
    pub report: StrategyReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_report_serializes_every_canonical_key() {
        let value = serde_json::to_value(StrategyReport::default()).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "vision",
            "market",
            "businessModel",
            "product",
            "planning",
            "acquisition",
            "metrics",
            "similarCompanies",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(value["vision"]["uniqueValue"], "");
        assert_eq!(value["market"]["directCompetitors"], serde_json::json!([]));
        assert_eq!(value["businessModel"]["breakEvenPoint"], "");
        assert_eq!(value["planning"]["step3"], "");
    }

    #[test]
    fn failed_page_carries_only_url_and_error() {
        let page = ExtractedPage::failed("https://example.com", "timeout");
        assert!(page.is_error());
        assert!(page.name.is_empty());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["error"], "timeout");
        assert!(json.get("provenance").is_none());
    }

    #[test]
    fn record_name_falls_back_to_listing() {
        let mut listing = ExtractedPage::new("https://www.ycombinator.com/companies/acme");
        listing.name = "Acme".into();
        let record = CompanyRecord {
            candidate: Candidate::default(),
            listing,
            landing_page: None,
            insights: vec![],
        };
        assert_eq!(record.name(), "Acme");
    }
}
