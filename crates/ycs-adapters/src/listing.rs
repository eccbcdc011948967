//! Listing-page extraction (the company's page on the source platform).

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use ycs_core::{Candidate, ExtractedPage};

use crate::strategy::{
    class_contains, element_text, first_match, select_first_text, static_selector,
    static_selectors, text_or_none, visible_text_nodes, PageContext, Strategy,
};

/// Fallback record carried over from the bulk source (batch label, industry taxonomy).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingHints {
    pub batch: Option<String>,
    pub industries: Vec<String>,
}

impl ListingHints {
    pub fn from_candidate(candidate: &Candidate) -> Self {
        let mut industries = Vec::new();
        if let Some(main) = text_or_none(&candidate.main_industry) {
            industries.push(main);
            if let Some(sub) = text_or_none(&candidate.sub_industry) {
                if !sub.eq_ignore_ascii_case("N/A") {
                    industries.push(sub);
                }
            }
        }
        Self {
            batch: text_or_none(&candidate.batch),
            industries,
        }
    }
}

/// Domains (and substrings) that never count as the company's own website.
pub const EXCLUDED_LINK_DOMAINS: &[&str] = &[
    "ycombinator.com",
    "startupschool.org",
    "bookface.com",
    "twitter.com",
    "linkedin.com",
    "github.com",
    "facebook.com",
    "instagram.com",
    "youtube.com",
    "medium.com",
    "blog",
];

const SOCIAL_PATH_MARKERS: &[&str] = &["/twitter", "/linkedin", "/github", "/facebook", "/blog", "/post"];

const MIN_FULL_DESCRIPTION_CHARS: usize = 50;
pub const MAX_TAGS: usize = 10;
const MAX_BADGE_ELEMENTS: usize = 5;

/// Class fragments marking a badge-like element (case-insensitive).
const BADGE_CLASS_MARKERS: &[&str] = &["badge", "pill", "batch"];

pub const TAG_SELECTORS: &[&str] = &[
    r#"span[class*="tag"]"#,
    r#"div[class*="tag"]"#,
    r#"span[class*="badge"]"#,
    r#"div[class*="badge"]"#,
    r#"a[class*="tag"]"#,
    r#"[class*="category"]"#,
    r#"[class*="industry"]"#,
];

const FULL_DESCRIPTION_SELECTORS: &[&str] = &[
    r#"div[class*="long-description"]"#,
    r#"div[class*="description"] p"#,
    r#"section[class*="about"]"#,
    r#"div[class*="about"]"#,
];

static HEADING: Lazy<Selector> = Lazy::new(|| static_selector("h1"));
static TITLE: Lazy<Selector> = Lazy::new(|| static_selector("title"));
static META_DESCRIPTION: Lazy<Selector> = Lazy::new(|| {
    static_selector(r#"meta[property="og:description"], meta[name="description"]"#)
});
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| static_selector("p"));
static LINK: Lazy<Selector> = Lazy::new(|| static_selector("a[href]"));
static BADGE_CANDIDATE: Lazy<Selector> = Lazy::new(|| static_selector("span, div, p"));
static TAG: Lazy<Vec<Selector>> = Lazy::new(|| static_selectors(TAG_SELECTORS));
static FULL_DESCRIPTION: Lazy<Vec<Selector>> =
    Lazy::new(|| static_selectors(FULL_DESCRIPTION_SELECTORS));

static BATCH_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\b(Summer|Winter|Fall|Spring)\s+\d{4}\b",
        r"(?i)\b[SWF]\d{2}\b",
        r"(?i)\b(Summer|Winter|Fall|Spring)\s+\d{2}\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("static batch pattern"))
    .collect()
});

static BADGE_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Summer|Winter|Fall|Spring|[SWF]\d{2})\b").expect("static badge pattern")
});

static BADGE_BATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(Summer|Winter|Fall|Spring)\s+\d{4}\b|\b[SWF]\d{2}\b")
        .expect("static badge batch pattern")
});

pub const NAME_STRATEGIES: &[Strategy<String>] = &[
    Strategy::new("structured-data", name_from_structured),
    Strategy::new("heading", name_from_heading),
    Strategy::new("document-title", name_from_title),
];

pub const SHORT_DESCRIPTION_STRATEGIES: &[Strategy<String>] = &[
    Strategy::new("structured-data", short_description_from_structured),
    Strategy::new("meta-description", description_from_meta),
    Strategy::new("class-matched-paragraph", description_from_paragraph),
];

pub const FULL_DESCRIPTION_STRATEGIES: &[Strategy<String>] = &[
    Strategy::new("structured-data", full_description_from_structured),
    Strategy::new("meta-description", full_description_from_meta),
    Strategy::new("class-matched-section", full_description_from_sections),
];

pub const WEBSITE_STRATEGIES: &[Strategy<String>] = &[
    Strategy::new("structured-data", website_from_structured),
    Strategy::new("labelled-link", website_from_labelled_link),
    Strategy::new("first-external-link", website_from_first_external_link),
];

pub const FOUNDER_STRATEGIES: &[Strategy<Vec<String>>] =
    &[Strategy::new("structured-data", founders_from_structured)];

pub const BATCH_STRATEGIES: &[Strategy<String>] = &[
    Strategy::new("structured-data", batch_from_structured),
    Strategy::new("page-text-pattern", batch_from_page_text),
    Strategy::new("badge-element", batch_from_badges),
    Strategy::new("fallback-record", batch_from_hints),
];

pub const TAG_STRATEGIES: &[Strategy<Vec<String>>] = &[
    Strategy::new("structured-data", tags_from_structured),
    Strategy::new("tag-selector", tags_from_selectors),
    Strategy::new("fallback-record", tags_from_hints),
];

/// Extract identity fields from a rendered listing page.
pub fn extract_listing(source_url: &str, html: &str, hints: Option<&ListingHints>) -> ExtractedPage {
    let document = Html::parse_document(html);
    let ctx = PageContext::new(&document, hints);
    let mut page = ExtractedPage::new(source_url);

    if let Some(name) = resolve(&mut page, "name", &ctx, NAME_STRATEGIES) {
        page.name = strip_title_suffix(&name);
    }
    if let Some(value) = resolve(&mut page, "short_description", &ctx, SHORT_DESCRIPTION_STRATEGIES) {
        page.short_description = value;
    }
    if let Some(value) = resolve(&mut page, "full_description", &ctx, FULL_DESCRIPTION_STRATEGIES) {
        page.full_description = value;
    }
    if let Some(value) = resolve(&mut page, "website", &ctx, WEBSITE_STRATEGIES) {
        page.website = value;
    }
    if let Some(value) = resolve(&mut page, "founders", &ctx, FOUNDER_STRATEGIES) {
        page.founders = value;
    }
    if let Some(value) = resolve(&mut page, "batch", &ctx, BATCH_STRATEGIES) {
        page.batch = value;
    }
    if let Some(value) = resolve(&mut page, "tags", &ctx, TAG_STRATEGIES) {
        page.tags = value;
    }
    page
}

fn resolve<T>(
    page: &mut ExtractedPage,
    field: &str,
    ctx: &PageContext<'_>,
    strategies: &[Strategy<T>],
) -> Option<T> {
    let (value, label) = first_match(ctx, strategies)?;
    page.record_provenance(field, label);
    Some(value)
}

/// `"Acme | Y Combinator"` -> `"Acme"`.
pub fn strip_title_suffix(value: &str) -> String {
    value.split('|').next().unwrap_or_default().trim().to_string()
}

fn name_from_structured(ctx: &PageContext<'_>) -> Option<String> {
    ctx.structured_str(&["name"])
}

fn name_from_heading(ctx: &PageContext<'_>) -> Option<String> {
    select_first_text(ctx.document, &HEADING).and_then(|t| text_or_none(strip_title_suffix(&t)))
}

fn name_from_title(ctx: &PageContext<'_>) -> Option<String> {
    select_first_text(ctx.document, &TITLE).and_then(|t| text_or_none(strip_title_suffix(&t)))
}

fn short_description_from_structured(ctx: &PageContext<'_>) -> Option<String> {
    ctx.structured_str(&["one_liner", "description"])
}

fn meta_description(ctx: &PageContext<'_>) -> Option<String> {
    ctx.document
        .select(&META_DESCRIPTION)
        .filter_map(|meta| meta.value().attr("content"))
        .find_map(text_or_none)
}

fn description_from_meta(ctx: &PageContext<'_>) -> Option<String> {
    meta_description(ctx)
}

fn description_from_paragraph(ctx: &PageContext<'_>) -> Option<String> {
    ctx.document
        .select(&PARAGRAPH)
        .filter(|p| class_contains(*p, &["description", "tagline"]))
        .find_map(|p| text_or_none(element_text(p)))
}

fn long_enough(value: String) -> Option<String> {
    (value.chars().count() > MIN_FULL_DESCRIPTION_CHARS).then_some(value)
}

fn full_description_from_structured(ctx: &PageContext<'_>) -> Option<String> {
    ctx.structured_str(&["long_description", "description"])
}

fn full_description_from_meta(ctx: &PageContext<'_>) -> Option<String> {
    meta_description(ctx).and_then(long_enough)
}

fn full_description_from_sections(ctx: &PageContext<'_>) -> Option<String> {
    FULL_DESCRIPTION.iter().find_map(|sel| {
        let first = ctx.document.select(sel).next()?;
        text_or_none(element_text(first)).and_then(long_enough)
    })
}

fn is_excluded_link(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    EXCLUDED_LINK_DOMAINS.iter().any(|domain| lower.contains(domain))
}

fn is_social_path(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    SOCIAL_PATH_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn external_links(ctx: &PageContext<'_>) -> Vec<(String, String)> {
    ctx.document
        .select(&LINK)
        .filter_map(|a| {
            let href = a.value().attr("href")?.trim();
            href.starts_with("http")
                .then(|| (href.to_string(), element_text(a).to_ascii_lowercase()))
        })
        .collect()
}

fn website_from_structured(ctx: &PageContext<'_>) -> Option<String> {
    ctx.structured_str(&["website", "url"])
}

fn website_from_labelled_link(ctx: &PageContext<'_>) -> Option<String> {
    external_links(ctx)
        .into_iter()
        .find(|(href, text)| {
            (text.contains("website") || text.contains("visit")) && !is_excluded_link(href)
        })
        .map(|(href, _)| href)
}

fn website_from_first_external_link(ctx: &PageContext<'_>) -> Option<String> {
    external_links(ctx)
        .into_iter()
        .find(|(href, _)| !is_excluded_link(href) && !is_social_path(href))
        .map(|(href, _)| href)
}

fn founders_from_structured(ctx: &PageContext<'_>) -> Option<Vec<String>> {
    let founders = ctx
        .structured_field("founders")?
        .as_array()?
        .iter()
        .filter_map(|founder| match founder {
            JsonValue::Object(obj) => ["name", "full_name"]
                .iter()
                .filter_map(|key| obj.get(*key).and_then(JsonValue::as_str))
                .find_map(text_or_none),
            JsonValue::String(name) => text_or_none(name),
            _ => None,
        })
        .collect::<Vec<_>>();
    (!founders.is_empty()).then_some(founders)
}

fn batch_from_structured(ctx: &PageContext<'_>) -> Option<String> {
    ctx.structured_str(&["batch", "batch_name"])
}

fn is_badge(element: ElementRef<'_>) -> bool {
    class_contains(element, BADGE_CLASS_MARKERS)
}

/// True when `element` or any ancestor is badge-classed.
fn within_badge(element: ElementRef<'_>) -> bool {
    is_badge(element) || element.ancestors().filter_map(ElementRef::wrap).any(is_badge)
}

/// Batch patterns over the running page text. Badge text is left to the badge strategy.
fn batch_from_page_text(ctx: &PageContext<'_>) -> Option<String> {
    let text = visible_text_nodes(ctx.document)
        .into_iter()
        .filter(|(_, parent)| !parent.is_some_and(within_badge))
        .map(|(text, _)| text)
        .collect::<Vec<_>>()
        .join(" ");
    BATCH_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(&text))
        .map(|m| m.as_str().trim().to_string())
}

fn batch_from_badges(ctx: &PageContext<'_>) -> Option<String> {
    ctx.document
        .select(&BADGE_CANDIDATE)
        .filter(|el| is_badge(*el))
        .filter_map(|el| {
            let text = text_or_none(element_text(el))?;
            BADGE_TEXT.is_match(&text).then_some(text)
        })
        .take(MAX_BADGE_ELEMENTS)
        .find_map(|text| BADGE_BATCH.find(&text).map(|m| m.as_str().trim().to_string()))
}

fn batch_from_hints(ctx: &PageContext<'_>) -> Option<String> {
    ctx.hints?.batch.clone().and_then(text_or_none)
}

/// Keep meaningful tag texts: longer than one character, not purely numeric, deduplicated,
/// at most [`MAX_TAGS`].
pub fn clean_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: Vec<String> = Vec::new();
    for text in raw {
        let Some(text) = text_or_none(text) else {
            continue;
        };
        if text.chars().count() <= 1 || text.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        if !tags.contains(&text) {
            tags.push(text);
        }
        if tags.len() == MAX_TAGS {
            break;
        }
    }
    tags
}

fn tags_from_structured(ctx: &PageContext<'_>) -> Option<Vec<String>> {
    let raw = ctx.structured_field("tags")?.as_array()?;
    let tags = clean_tags(raw.iter().filter_map(JsonValue::as_str));
    (!tags.is_empty()).then_some(tags)
}

fn tags_from_selectors(ctx: &PageContext<'_>) -> Option<Vec<String>> {
    TAG.iter().find_map(|sel| {
        let tags = clean_tags(ctx.document.select(sel).map(element_text));
        (!tags.is_empty()).then_some(tags)
    })
}

fn tags_from_hints(ctx: &PageContext<'_>) -> Option<Vec<String>> {
    let tags = clean_tags(&ctx.hints?.industries);
    (!tags.is_empty()).then_some(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXT_DATA_PAGE: &str = r#"<html><head>
        <title>Ignored Title | Y Combinator</title>
        <script id="__NEXT_DATA__" type="application/json">
        {"props":{"pageProps":{"company":{
            "name":"Acme Robotics",
            "one_liner":"Robots that fold laundry",
            "long_description":"Acme builds home robots that fold laundry and tidy rooms so families get their weekends back.",
            "batch":"Winter 2023",
            "website":"https://acme.example",
            "founders":[{"name":"Ada Lovelace"},{"name":"Alan Turing"}],
            "tags":["Robotics","Consumer","Robotics","7"]
        }}}}
        </script></head>
        <body><h1>Heading Name</h1><a href="https://other.example">Visit website</a></body></html>"#;

    #[test]
    fn structured_data_wins_and_lower_strategies_do_not_override() {
        let page = extract_listing("https://www.ycombinator.com/companies/acme", NEXT_DATA_PAGE, None);
        assert_eq!(page.name, "Acme Robotics");
        assert_eq!(page.provenance_of("name"), Some("structured-data"));
        assert_eq!(page.short_description, "Robots that fold laundry");
        assert!(page.full_description.starts_with("Acme builds home robots"));
        assert_eq!(page.website, "https://acme.example");
        assert_eq!(page.batch, "Winter 2023");
        assert_eq!(page.founders, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(page.tags, vec!["Robotics", "Consumer"]);
        assert!(page.error.is_none());
    }

    #[test]
    fn name_falls_back_to_heading_then_title_without_suffix() {
        let from_heading = extract_listing("u", "<html><body><h1>Beta | YC</h1></body></html>", None);
        assert_eq!(from_heading.name, "Beta");
        assert_eq!(from_heading.provenance_of("name"), Some("heading"));

        let from_title = extract_listing(
            "u",
            "<html><head><title>Gamma | Y Combinator</title></head><body></body></html>",
            None,
        );
        assert_eq!(from_title.name, "Gamma");
        assert_eq!(from_title.provenance_of("name"), Some("document-title"));
    }

    #[test]
    fn short_description_uses_meta_before_paragraph() {
        let html = r#"<html><head><meta property="og:description" content="From meta"></head>
            <body><p class="company-Description">From paragraph</p></body></html>"#;
        let page = extract_listing("u", html, None);
        assert_eq!(page.short_description, "From meta");

        let html = r#"<html><body><p class="hero-Tagline">From paragraph</p></body></html>"#;
        let page = extract_listing("u", html, None);
        assert_eq!(page.short_description, "From paragraph");
        assert_eq!(page.provenance_of("short_description"), Some("class-matched-paragraph"));
    }

    #[test]
    fn full_description_requires_more_than_fifty_characters() {
        let html = r#"<html><body>
            <div class="long-description">Too short to count.</div>
            <div class="about">This about section is comfortably longer than fifty characters in total.</div>
            </body></html>"#;
        let page = extract_listing("u", html, None);
        assert_eq!(
            page.full_description,
            "This about section is comfortably longer than fifty characters in total."
        );

        let short_only = r#"<html><body><div class="about">tiny</div></body></html>"#;
        assert!(extract_listing("u", short_only, None).full_description.is_empty());
    }

    #[test]
    fn website_prefers_labelled_link_and_skips_denylisted_domains() {
        let html = r#"<html><body>
            <a href="https://twitter.com/acme">Visit our Twitter</a>
            <a href="https://news.example/story">Press</a>
            <a href="https://acme.example">Website</a>
            </body></html>"#;
        let page = extract_listing("u", html, None);
        assert_eq!(page.website, "https://acme.example");
        assert_eq!(page.provenance_of("website"), Some("labelled-link"));
    }

    #[test]
    fn website_falls_back_to_first_clean_external_link() {
        let html = r#"<html><body>
            <a href="/companies">Companies</a>
            <a href="https://www.ycombinator.com/jobs">Jobs</a>
            <a href="https://acme.example/blog/launch">Launch</a>
            <a href="https://www.linkedin.com/company/acme">LinkedIn</a>
            <a href="https://acme.example">acme.example</a>
            </body></html>"#;
        let page = extract_listing("u", html, None);
        assert_eq!(page.website, "https://acme.example");
        assert_eq!(page.provenance_of("website"), Some("first-external-link"));
    }

    #[test]
    fn batch_patterns_apply_in_order() {
        let page = extract_listing("u", "<html><body><p>Joined in Summer 2024, also S24.</p></body></html>", None);
        assert_eq!(page.batch, "Summer 2024");

        let page = extract_listing("u", "<html><body><span>W21</span></body></html>", None);
        assert_eq!(page.batch, "W21");
        assert_eq!(page.provenance_of("batch"), Some("page-text-pattern"));
    }

    #[test]
    fn badge_elements_are_read_after_running_text() {
        let html = r#"<html><body>
            <p>Acme builds robots that fold laundry.</p>
            <div class="flex"><span class="Pill-Batch"><b>W21</b></span><span class="pill">Active</span></div>
            </body></html>"#;
        let page = extract_listing("u", html, None);
        assert_eq!(page.batch, "W21");
        assert_eq!(page.provenance_of("batch"), Some("badge-element"));

        let html = r#"<html><body>
            <p>Backed since Summer 2022.</p>
            <span class="badge">S24</span>
            </body></html>"#;
        let page = extract_listing("u", html, None);
        assert_eq!(page.batch, "Summer 2022");
        assert_eq!(page.provenance_of("batch"), Some("page-text-pattern"));
    }

    #[test]
    fn hints_are_the_last_resort_for_batch_and_tags() {
        let hints = ListingHints {
            batch: Some("F24".into()),
            industries: vec!["Fintech".into(), "Payments".into()],
        };
        let page = extract_listing("u", "<html><body><h1>Delta</h1></body></html>", Some(&hints));
        assert_eq!(page.batch, "F24");
        assert_eq!(page.provenance_of("batch"), Some("fallback-record"));
        assert_eq!(page.tags, vec!["Fintech", "Payments"]);

        let page = extract_listing(
            "u",
            r#"<html><body><span class="tag">B2B</span><p>Summer 2022</p></body></html>"#,
            Some(&hints),
        );
        assert_eq!(page.batch, "Summer 2022");
        assert_eq!(page.tags, vec!["B2B"]);
    }

    #[test]
    fn numeric_only_tag_selector_falls_through_to_later_selectors() {
        let html = r#"<html><body>
            <span class="tag-count">3</span>
            <span class="tag-count">12</span>
            <span class="tag-count">x</span>
            <div class="badge-list">AI</div>
            <div class="badge-list">42</div>
            <div class="badge-list">AI</div>
            <div class="badge-list">Developer Tools</div>
            <div class="category">Never reached</div>
            </body></html>"#;
        let page = extract_listing("u", html, None);
        assert_eq!(page.tags, vec!["AI", "Developer Tools"]);
        assert_eq!(page.provenance_of("tags"), Some("tag-selector"));
    }

    #[test]
    fn tags_are_capped_at_ten() {
        let tags = clean_tags((0..20).map(|i| format!("tag-{i}")));
        assert_eq!(tags.len(), MAX_TAGS);
    }

    #[test]
    fn hints_from_candidate_ignore_not_applicable_sub_industry() {
        let candidate = Candidate {
            name: "Acme".into(),
            main_industry: "Healthcare".into(),
            sub_industry: "N/A".into(),
            batch: "W22".into(),
            ..Default::default()
        };
        let hints = ListingHints::from_candidate(&candidate);
        assert_eq!(hints.industries, vec!["Healthcare"]);
        assert_eq!(hints.batch.as_deref(), Some("W22"));
    }
}
