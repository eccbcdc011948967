//! Prompt construction for the strategy report.

use std::fmt::Write as _;

use ycs_core::{CollectedCorpus, CompanyRecord, ExtractedPage};

/// Target structure the model is asked to fill. Keys match the canonical report schema.
pub const SCHEMA_TEMPLATE: &str = r#"{
  "vision": {
    "problem": "Problem solved (15-20 words)",
    "solution": "Proposed solution (15-20 words)",
    "uniqueValue": "Unique value proposition (15-20 words)",
    "targetAudience": "Target audience (15-20 words)",
    "positioning": "Positioning vs competition (15-20 words)"
  },
  "market": {
    "marketSize": "Estimated market size (1-2 sentences)",
    "directCompetitors": ["Competitor 1", "Competitor 2", "Competitor 3"],
    "competitorWeaknesses": "Weaknesses of identified competitors (2-3 sentences)",
    "trends": "Relevant market trends (2-3 sentences)"
  },
  "businessModel": {
    "revenueModel": "Proposed revenue model (1-2 sentences)",
    "pricing": "Proposed pricing with justification (1-2 sentences)",
    "initialCosts": "Estimated initial costs (1-2 sentences)",
    "breakEvenPoint": "Estimated break-even point (1-2 sentences)"
  },
  "product": {
    "coreFeatures": ["Feature 1", "Feature 2", "Feature 3"],
    "userFlow": ["Step 1", "Step 2", "Step 3"],
    "design": "Design approach (1-2 sentences)",
    "techStack": "Recommended tech stack (1-2 sentences)"
  },
  "planning": {
    "step1": "First step (10-15 words)",
    "step2": "Second step (10-15 words)",
    "step3": "Third step (10-15 words)"
  },
  "acquisition": {
    "socialMedia": "Social media strategy (2-3 sentences)",
    "seo": "SEO strategy (2-3 sentences)",
    "partnerships": "Partnership strategy (2-3 sentences)",
    "advertising": "Advertising strategy (2-3 sentences)"
  },
  "metrics": {
    "keyMetrics": ["Metric 1", "Metric 2", "Metric 3"],
    "tools": ["Tool 1", "Tool 2"],
    "successThresholds": "Success thresholds defined (2-3 sentences)"
  },
  "similarCompanies": [
    {
      "name": "Name of similar YC company",
      "insights": "Key insights from this company (2-3 sentences)",
      "lessonsLearned": "Lessons learned applicable to our idea (2-3 sentences)"
    }
  ]
}"#;

const MISSING: &str = "N/A";
const INSIGHT_TITLES_PER_COMPANY: usize = 3;

fn or_missing(value: &str) -> &str {
    if value.trim().is_empty() {
        MISSING
    } else {
        value
    }
}

fn page_ok(page: Option<&ExtractedPage>) -> Option<&ExtractedPage> {
    page.filter(|page| !page.is_error())
}

fn describe_company(out: &mut String, record: &CompanyRecord) {
    let listing = page_ok(Some(&record.listing));
    let landing = page_ok(record.landing_page.as_ref());

    let description = listing
        .map(|page| {
            if page.short_description.is_empty() {
                page.full_description.as_str()
            } else {
                page.short_description.as_str()
            }
        })
        .filter(|text| !text.is_empty())
        .unwrap_or(record.candidate.description.as_str());
    let batch = listing
        .map(|page| page.batch.as_str())
        .filter(|batch| !batch.is_empty())
        .unwrap_or(record.candidate.batch.as_str());
    let tags = listing.map(|page| page.tags.join(", ")).unwrap_or_default();

    let _ = writeln!(out);
    let _ = writeln!(out, "Company: {}", or_missing(record.name()));
    let _ = writeln!(out, "YC Description: {}", or_missing(description));
    let _ = writeln!(out, "Batch: {}", or_missing(batch));
    let _ = writeln!(out, "Tags: {}", or_missing(&tags));
    let _ = writeln!(
        out,
        "Landing Page Hero: {}",
        or_missing(landing.map(|page| page.hero_text.as_str()).unwrap_or_default())
    );
    let _ = writeln!(
        out,
        "Value Proposition: {}",
        or_missing(landing.map(|page| page.value_proposition.as_str()).unwrap_or_default())
    );
    let _ = writeln!(out, "Strategic Insights: {} articles found", record.insights.len());
    for insight in record.insights.iter().take(INSIGHT_TITLES_PER_COMPANY) {
        let _ = writeln!(out, "  - {}: {}", insight.title, insight.snippet);
    }
}

/// Single prompt carrying the idea, a digest of every collected company and the target schema.
pub fn build_prompt(corpus: &CollectedCorpus) -> String {
    let mut companies = String::new();
    for record in &corpus.companies {
        describe_company(&mut companies, record);
    }

    format!(
        r#"You are an expert in business strategy and startup creation.

USER'S IDEA: "{idea}"

SIMILAR YC COMPANIES ANALYZED:
{companies}
Based on this information about similar YC startups, generate a complete strategy in JSON format for the user's idea.

You must return ONLY a valid JSON object with this EXACT structure:

{schema}

IMPORTANT:
- Return ONLY the JSON, nothing else
- Be concrete, actionable and professional
- Draw inspiration from similar YC companies but adapt to the specific idea
- The similarCompanies array must contain all {count} analyzed companies
- Write all content in English
"#,
        idea = corpus.user_idea,
        companies = companies,
        schema = SCHEMA_TEMPLATE,
        count = corpus.companies.len(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ycs_core::{Candidate, Insight};

    use super::*;

    fn corpus() -> CollectedCorpus {
        let mut listing = ExtractedPage::new("https://www.ycombinator.com/companies/acme");
        listing.name = "Acme".into();
        listing.short_description = "Robots that fold laundry".into();
        listing.batch = "W21".into();
        listing.tags = vec!["Robotics".into(), "Consumer".into()];

        let mut landing = ExtractedPage::new("https://acme.example");
        landing.hero_text = "Never fold again".into();

        CollectedCorpus {
            user_idea: "Laundry folding as a service".into(),
            collected_at: Utc::now(),
            companies: vec![
                CompanyRecord {
                    candidate: Candidate {
                        name: "Acme".into(),
                        description: "Home robotics".into(),
                        ..Default::default()
                    },
                    listing,
                    landing_page: Some(landing),
                    insights: vec![Insight {
                        title: "How Acme launched".into(),
                        url: "https://blog.example/acme".into(),
                        snippet: "They started in dorms".into(),
                        query: "\"Acme\" how they started".into(),
                    }],
                },
                CompanyRecord {
                    candidate: Candidate {
                        name: "Beta".into(),
                        description: "Bookkeeping".into(),
                        batch: "S22".into(),
                        ..Default::default()
                    },
                    listing: ExtractedPage::failed("https://www.ycombinator.com/companies/beta", "timeout"),
                    landing_page: None,
                    insights: vec![],
                },
            ],
        }
    }

    #[test]
    fn prompt_embeds_idea_companies_and_schema() {
        let prompt = build_prompt(&corpus());
        assert!(prompt.contains(r#"USER'S IDEA: "Laundry folding as a service""#));
        assert!(prompt.contains("Company: Acme"));
        assert!(prompt.contains("YC Description: Robots that fold laundry"));
        assert!(prompt.contains("Tags: Robotics, Consumer"));
        assert!(prompt.contains("Landing Page Hero: Never fold again"));
        assert!(prompt.contains("Value Proposition: N/A"));
        assert!(prompt.contains("  - How Acme launched: They started in dorms"));
        assert!(prompt.contains("must contain all 2 analyzed companies"));
        assert!(prompt.contains(SCHEMA_TEMPLATE));
    }

    #[test]
    fn failed_listing_falls_back_to_candidate_fields() {
        let prompt = build_prompt(&corpus());
        assert!(prompt.contains("Company: Beta"));
        assert!(prompt.contains("YC Description: Bookkeeping"));
        assert!(prompt.contains("Batch: S22"));
        assert!(prompt.contains("Strategic Insights: 0 articles found"));
    }

    #[test]
    fn schema_template_is_valid_json() {
        let value: serde_json::Value = serde_json::from_str(SCHEMA_TEMPLATE).unwrap();
        assert!(value["vision"]["uniqueValue"].is_string());
    }
}
