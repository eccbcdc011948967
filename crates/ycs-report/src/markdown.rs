//! Markdown rendering of a finished strategy report.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use ycs_core::StrategyReport;

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}

fn field(label: &str, value: &str) -> String {
    format!("- **{label}:** {}\n", or_dash(value))
}

fn list(label: &str, items: &[String]) -> String {
    if items.is_empty() {
        return format!("- **{label}:** -\n");
    }
    let mut out = format!("- **{label}:**\n");
    for item in items {
        out.push_str(&format!("  - {item}\n"));
    }
    out
}

fn similar_company(entry: &JsonValue) -> String {
    let text = |key: &str| entry.get(key).and_then(JsonValue::as_str).unwrap_or_default();
    match entry {
        JsonValue::Object(_) => format!(
            "### {}\n\n{}{}",
            or_dash(text("name")),
            field("Insights", text("insights")),
            field("Lessons learned", text("lessonsLearned")),
        ),
        JsonValue::String(name) => format!("### {}\n", or_dash(name)),
        other => format!("- {other}\n"),
    }
}

pub fn render_markdown(report: &StrategyReport, idea: &str, generated_at: DateTime<Utc>) -> String {
    let v = &report.vision;
    let m = &report.market;
    let b = &report.business_model;
    let p = &report.product;
    let pl = &report.planning;
    let a = &report.acquisition;
    let me = &report.metrics;

    let mut out = format!(
        "# Strategy Report\n\n- Idea: {}\n- Generated: {}\n\n",
        or_dash(idea),
        generated_at.to_rfc3339()
    );

    out.push_str("## Vision\n\n");
    out.push_str(&field("Problem", &v.problem));
    out.push_str(&field("Solution", &v.solution));
    out.push_str(&field("Unique value", &v.unique_value));
    out.push_str(&field("Target audience", &v.target_audience));
    out.push_str(&field("Positioning", &v.positioning));

    out.push_str("\n## Market\n\n");
    out.push_str(&field("Market size", &m.market_size));
    out.push_str(&list("Direct competitors", &m.direct_competitors));
    out.push_str(&field("Competitor weaknesses", &m.competitor_weaknesses));
    out.push_str(&field("Trends", &m.trends));

    out.push_str("\n## Business Model\n\n");
    out.push_str(&field("Revenue model", &b.revenue_model));
    out.push_str(&field("Pricing", &b.pricing));
    out.push_str(&field("Initial costs", &b.initial_costs));
    out.push_str(&field("Break-even point", &b.break_even_point));

    out.push_str("\n## Product\n\n");
    out.push_str(&list("Core features", &p.core_features));
    out.push_str(&list("User flow", &p.user_flow));
    out.push_str(&field("Design", &p.design));
    out.push_str(&field("Tech stack", &p.tech_stack));

    out.push_str("\n## Planning\n\n");
    out.push_str(&format!("1. {}\n", or_dash(&pl.step1)));
    out.push_str(&format!("2. {}\n", or_dash(&pl.step2)));
    out.push_str(&format!("3. {}\n", or_dash(&pl.step3)));

    out.push_str("\n## Acquisition\n\n");
    out.push_str(&field("Social media", &a.social_media));
    out.push_str(&field("SEO", &a.seo));
    out.push_str(&field("Partnerships", &a.partnerships));
    out.push_str(&field("Advertising", &a.advertising));

    out.push_str("\n## Metrics\n\n");
    out.push_str(&list("Key metrics", &me.key_metrics));
    out.push_str(&list("Tools", &me.tools));
    out.push_str(&field("Success thresholds", &me.success_thresholds));

    out.push_str("\n## Similar Companies\n\n");
    if report.similar_companies.is_empty() {
        out.push_str("No similar companies listed.\n");
    }
    for entry in &report.similar_companies {
        out.push_str(&similar_company(entry));
        out.push('\n');
    }
    out
}
