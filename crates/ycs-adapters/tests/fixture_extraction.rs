use std::path::PathBuf;

use ycs_adapters::{extract_landing, extract_listing, ListingHints};

fn fixture(relative: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join("fixtures")
        .join(relative);
    std::fs::read_to_string(&path).unwrap_or_else(|err| panic!("{}: {err}", path.display()))
}

#[test]
fn next_data_listing_is_read_from_structured_payload() {
    let html = fixture("listing/next_data_company.html");
    let page = extract_listing("https://www.ycombinator.com/companies/lumen-ledger", &html, None);

    assert_eq!(page.name, "Lumen Ledger");
    assert_eq!(page.short_description, "Automated bookkeeping for solo founders");
    assert!(page.full_description.contains("closes your books each month"));
    assert_eq!(page.website, "https://lumenledger.example");
    assert_eq!(page.batch, "Summer 2023");
    assert_eq!(page.founders, vec!["Priya Raman", "Jonas Weber"]);
    assert_eq!(page.tags, vec!["Fintech", "SaaS", "B2B"]);
    for field in ["name", "website", "batch", "founders", "tags"] {
        assert_eq!(page.provenance_of(field), Some("structured-data"), "{field}");
    }
}

#[test]
fn rendered_listing_falls_through_html_strategies() {
    let html = fixture("listing/rendered_company.html");
    let hints = ListingHints {
        batch: Some("S19".into()),
        industries: vec!["Hardware".into()],
    };
    let page = extract_listing(
        "https://www.ycombinator.com/companies/orbital-kitchens",
        &html,
        Some(&hints),
    );

    assert_eq!(page.name, "Orbital Kitchens");
    assert_eq!(page.short_description, "Robotic ghost kitchens for late-night delivery.");
    assert!(page.full_description.starts_with("Orbital Kitchens runs compact robotic kitchens"));
    assert_eq!(page.website, "https://orbitalkitchens.example");
    assert_eq!(page.batch, "W24");
    assert_eq!(page.provenance_of("batch"), Some("badge-element"));
    assert!(page.founders.is_empty());

    let mut tags = page.tags.clone();
    tags.sort();
    assert_eq!(tags, vec!["Consumer", "Food and Beverage", "Robotics"]);
    assert_eq!(page.provenance_of("tags"), Some("tag-selector"));
    assert_eq!(page.provenance_of("full_description"), Some("class-matched-section"));
}

#[test]
fn landing_page_fields() {
    let html = fixture("landing/saas_home.html");
    let page = extract_landing("https://lumenledger.example", &html);

    assert_eq!(page.hero_text, "Books closed while you sleep");
    assert!(page.value_proposition.starts_with("Lumen Ledger reconciles every transaction"));
    assert_eq!(
        page.headlines,
        vec![
            "Books closed while you sleep",
            "Everything a solo founder needs",
            "Simple plans",
            "Solo"
        ]
    );
    assert_eq!(
        page.features,
        vec!["Bank and Stripe sync in one click", "Tax-ready reports every quarter"]
    );
    assert_eq!(page.pricing, "€19 per month, billed yearly");
    assert!(!page.main_text.contains("dataLayer"));
    assert!(!page.main_text.contains("Questions about price"));
}
