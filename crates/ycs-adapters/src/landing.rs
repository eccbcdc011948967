//! Landing-page extraction (the company's own marketing site).

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use ycs_core::ExtractedPage;

use crate::strategy::{
    element_text, first_match, static_selector, static_selectors, text_or_none, truncate_chars,
    visible_text, visible_text_nodes, PageContext, Strategy,
};

pub const MAIN_TEXT_MAX_CHARS: usize = 5000;
pub const MAX_HEADLINES: usize = 10;
pub const MAX_FEATURES: usize = 5;
const MIN_FEATURE_CHARS: usize = 10;

/// Elements dropped before any text is read.
const STRIPPED_ELEMENTS: &str = "script, style, nav, footer";

pub const FEATURE_SELECTORS: &[&str] = &[
    r#"ul[class*="feature"]"#,
    r#"div[class*="feature"]"#,
    r#"section[class*="feature"]"#,
    r#"li[class*="feature"]"#,
];

const PRICE_MARKERS: &[&str] = &["$", "€", "price"];

static STRIPPED: Lazy<Selector> = Lazy::new(|| static_selector(STRIPPED_ELEMENTS));
static LEAD_HEADING: Lazy<Selector> = Lazy::new(|| static_selector("h1"));
static HEADING_OR_PARAGRAPH: Lazy<Selector> = Lazy::new(|| static_selector("h1, p"));
static HEADLINE: Lazy<Selector> = Lazy::new(|| static_selector("h1, h2, h3"));
static FEATURE: Lazy<Vec<Selector>> = Lazy::new(|| static_selectors(FEATURE_SELECTORS));

pub const HERO_STRATEGIES: &[Strategy<String>] = &[Strategy::new("first-heading", hero_from_heading)];

pub const VALUE_PROPOSITION_STRATEGIES: &[Strategy<String>] =
    &[Strategy::new("paragraph-after-heading", value_proposition_after_heading)];

pub const FEATURE_STRATEGIES: &[Strategy<Vec<String>>] =
    &[Strategy::new("feature-selector", features_from_selectors)];

pub const PRICING_STRATEGIES: &[Strategy<String>] =
    &[Strategy::new("currency-text-parent", pricing_from_currency_text)];

/// Extract marketing fields from a rendered landing page.
pub fn extract_landing(source_url: &str, html: &str) -> ExtractedPage {
    let mut document = Html::parse_document(html);
    strip_non_content(&mut document);

    let ctx = PageContext::new(&document, None);
    let mut page = ExtractedPage::new(source_url);

    if let Some((value, label)) = first_match(&ctx, HERO_STRATEGIES) {
        page.hero_text = value;
        page.record_provenance("hero_text", label);
    }
    if let Some((value, label)) = first_match(&ctx, VALUE_PROPOSITION_STRATEGIES) {
        page.value_proposition = value;
        page.record_provenance("value_proposition", label);
    }
    page.headlines = headlines(&document);
    if let Some((value, label)) = first_match(&ctx, FEATURE_STRATEGIES) {
        page.features = value;
        page.record_provenance("features", label);
    }
    if let Some((value, label)) = first_match(&ctx, PRICING_STRATEGIES) {
        page.pricing = value;
        page.record_provenance("pricing", label);
    }
    page.main_text = truncate_chars(&visible_text(&document), MAIN_TEXT_MAX_CHARS);
    page
}

fn strip_non_content(document: &mut Html) {
    let ids = document.select(&STRIPPED).map(|el| el.id()).collect::<Vec<_>>();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// The first `h1` with visible text. Hero and value proposition both hang off it.
fn lead_heading(document: &Html) -> Option<(ElementRef<'_>, String)> {
    document
        .select(&LEAD_HEADING)
        .find_map(|h1| text_or_none(element_text(h1)).map(|text| (h1, text)))
}

fn hero_from_heading(ctx: &PageContext<'_>) -> Option<String> {
    lead_heading(ctx.document).map(|(_, text)| text)
}

fn value_proposition_after_heading(ctx: &PageContext<'_>) -> Option<String> {
    let (anchor, _) = lead_heading(ctx.document)?;
    ctx.document
        .select(&HEADING_OR_PARAGRAPH)
        .skip_while(|el| el.id() != anchor.id())
        .filter(|el| el.value().name() == "p")
        .find_map(|p| text_or_none(element_text(p)))
}

fn headlines(document: &Html) -> Vec<String> {
    document
        .select(&HEADLINE)
        .take(MAX_HEADLINES)
        .filter_map(|el| text_or_none(element_text(el)))
        .collect()
}

fn features_from_selectors(ctx: &PageContext<'_>) -> Option<Vec<String>> {
    let elements = FEATURE.iter().find_map(|sel| {
        let matched = ctx.document.select(sel).collect::<Vec<_>>();
        (!matched.is_empty()).then_some(matched)
    })?;
    let features = elements
        .into_iter()
        .take(MAX_FEATURES)
        .map(element_text)
        .filter(|text| text.chars().count() > MIN_FEATURE_CHARS)
        .collect::<Vec<_>>();
    (!features.is_empty()).then_some(features)
}

fn mentions_price(text: &str) -> bool {
    let lower = text.to_lowercase();
    PRICE_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn pricing_from_currency_text(ctx: &PageContext<'_>) -> Option<String> {
    visible_text_nodes(ctx.document)
        .into_iter()
        .find(|(text, _)| mentions_price(text))
        .and_then(|(text, parent)| match parent {
            Some(parent) => text_or_none(element_text(parent)),
            None => Some(text),
        })
}
