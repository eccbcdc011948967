//! Ordered extraction strategies and the HTML helpers they share.
//!
//! Every field is resolved by walking a fixed list of strategies and keeping the first
//! non-empty result. Strategies after the winner are never run.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value as JsonValue;

use crate::listing::ListingHints;

/// A named extraction step. `run` returns `None` for "nothing usable here".
pub struct Strategy<T> {
    pub label: &'static str,
    pub run: fn(&PageContext<'_>) -> Option<T>,
}

impl<T> Strategy<T> {
    pub const fn new(label: &'static str, run: fn(&PageContext<'_>) -> Option<T>) -> Self {
        Self { label, run }
    }
}

/// Evaluate `strategies` in order and return the first hit with the label that produced it.
pub fn first_match<T>(ctx: &PageContext<'_>, strategies: &[Strategy<T>]) -> Option<(T, &'static str)> {
    strategies
        .iter()
        .find_map(|strategy| (strategy.run)(ctx).map(|value| (value, strategy.label)))
}

/// Everything a strategy may look at: the parsed document, the structured company payload
/// (parsed once up front) and optional fallback hints.
pub struct PageContext<'a> {
    pub document: &'a Html,
    pub structured: Option<JsonValue>,
    pub hints: Option<&'a ListingHints>,
}

impl<'a> PageContext<'a> {
    pub fn new(document: &'a Html, hints: Option<&'a ListingHints>) -> Self {
        Self {
            document,
            structured: structured_company(document),
            hints,
        }
    }

    /// First non-empty string among `keys` of the structured company payload.
    pub fn structured_str(&self, keys: &[&str]) -> Option<String> {
        let company = self.structured.as_ref()?;
        keys.iter()
            .filter_map(|key| company.get(*key).and_then(JsonValue::as_str))
            .find_map(text_or_none)
    }

    pub fn structured_field(&self, key: &str) -> Option<&JsonValue> {
        self.structured.as_ref()?.get(key)
    }
}

static NEXT_DATA_SCRIPT: Lazy<Selector> = Lazy::new(|| static_selector("script#__NEXT_DATA__"));
static DATA_PAGE_ATTR: Lazy<Selector> = Lazy::new(|| static_selector("[data-page]"));

/// Locate framework-embedded company data: a Next.js `__NEXT_DATA__` script
/// (`props.pageProps`) or an Inertia-style `data-page` attribute (`props`).
pub fn structured_company(document: &Html) -> Option<JsonValue> {
    for script in document.select(&NEXT_DATA_SCRIPT) {
        let raw = script.text().collect::<String>();
        let Ok(payload) = serde_json::from_str::<JsonValue>(&raw) else {
            continue;
        };
        if let Some(company) = payload.pointer("/props/pageProps").and_then(company_object) {
            return Some(company);
        }
    }

    document
        .select(&DATA_PAGE_ATTR)
        .filter_map(|el| el.value().attr("data-page"))
        .filter_map(|raw| serde_json::from_str::<JsonValue>(raw).ok())
        .find_map(|payload| payload.get("props").and_then(company_object))
}

fn company_object(props: &JsonValue) -> Option<JsonValue> {
    ["company", "companyData"]
        .iter()
        .filter_map(|key| props.get(*key))
        .find(|value| value.as_object().is_some_and(|obj| !obj.is_empty()))
        .cloned()
}

/// Parse a hardcoded selector. Malformed CSS here is a programming error, not a miss.
pub fn static_selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

pub fn static_selectors(css: &[&str]) -> Vec<Selector> {
    css.iter().map(|css| static_selector(css)).collect()
}

pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn text_or_none(value: impl AsRef<str>) -> Option<String> {
    let collapsed = collapse_whitespace(value.as_ref());
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

pub fn select_first_text(document: &Html, sel: &Selector) -> Option<String> {
    document
        .select(sel)
        .next()
        .and_then(|el| text_or_none(element_text(el)))
}

/// True when any class on `element` contains one of `needles` (case-insensitive).
pub fn class_contains(element: ElementRef<'_>, needles: &[&str]) -> bool {
    element.value().attr("class").is_some_and(|class| {
        let class = class.to_ascii_lowercase();
        needles.iter().any(|needle| class.contains(needle))
    })
}

const HIDDEN_TEXT_PARENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Visible text fragments in document order, each with its parent element.
/// Text inside script/style containers is skipped.
pub fn visible_text_nodes(document: &Html) -> Vec<(String, Option<ElementRef<'_>>)> {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|element| HIDDEN_TEXT_PARENTS.contains(&element.name()))
            });
            if hidden {
                return None;
            }
            let parent = node.parent().and_then(ElementRef::wrap);
            let text: &str = text;
            text_or_none(text).map(|t| (t, parent))
        })
        .collect()
}

pub fn visible_text(document: &Html) -> String {
    visible_text_nodes(document)
        .into_iter()
        .map(|(text, _)| text)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_for(html: &str) -> (Html, Option<JsonValue>) {
        let doc = Html::parse_document(html);
        let structured = structured_company(&doc);
        (doc, structured)
    }

    #[test]
    fn next_data_payload_is_found() {
        let (_, company) = ctx_for(
            r#"<html><head><script id="__NEXT_DATA__" type="application/json">
            {"props":{"pageProps":{"company":{"name":"Acme","batch":"W21"}}}}
            </script></head><body></body></html>"#,
        );
        let company = company.expect("structured company");
        assert_eq!(company["name"], "Acme");
    }

    #[test]
    fn data_page_attribute_is_found_when_next_data_is_absent() {
        let (_, company) = ctx_for(
            r#"<html><body><div id="app" data-page='{"props":{"companyData":{"name":"Beta"}}}'></div></body></html>"#,
        );
        assert_eq!(company.expect("structured")["name"], "Beta");
    }

    #[test]
    fn empty_company_object_is_not_structured_data() {
        let (_, company) = ctx_for(
            r#"<html><head><script id="__NEXT_DATA__">{"props":{"pageProps":{"company":{}}}}</script></head></html>"#,
        );
        assert!(company.is_none());
    }

    #[test]
    fn later_strategies_are_never_run_after_a_hit() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static LATE_CALLS: AtomicUsize = AtomicUsize::new(0);

        fn early(_: &PageContext<'_>) -> Option<String> {
            Some("early".into())
        }
        fn late(_: &PageContext<'_>) -> Option<String> {
            LATE_CALLS.fetch_add(1, Ordering::SeqCst);
            Some("late".into())
        }
        const CASCADE: &[Strategy<String>] =
            &[Strategy::new("early", early), Strategy::new("late", late)];

        let doc = Html::parse_document("<html></html>");
        let ctx = PageContext::new(&doc, None);
        let (value, label) = first_match(&ctx, CASCADE).expect("hit");
        assert_eq!((value.as_str(), label), ("early", "early"));
        assert_eq!(LATE_CALLS.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn visible_text_skips_scripts_and_collapses_whitespace() {
        let doc = Html::parse_document(
            "<html><body><p>Hello\n   world</p><script>var x = 1;</script><style>p{}</style><p>again</p></body></html>",
        );
        assert_eq!(visible_text(&doc), "Hello world again");
    }

    #[test]
    fn selector_lists_parse_every_entry() {
        let parsed = static_selectors(&["h1", "div.hero p", r#"a[class*="tag"]"#]);
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    #[should_panic(expected = "static selector")]
    fn malformed_static_selector_is_loud() {
        static_selector("div[unclosed");
    }
}
