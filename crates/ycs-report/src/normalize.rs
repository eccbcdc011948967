//! Mapping loosely keyed model output onto the canonical report schema.
//!
//! The lookup is table driven: every section and field names its canonical key and the
//! legacy keys accepted in its place, in priority order. A key holding `null` counts as
//! absent. Anything still missing defaults to `""` or `[]`.

use serde_json::{Map, Value as JsonValue};
use ycs_core::{RawAnalysis, StrategyReport};

use crate::ReportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    List,
}

#[derive(Debug)]
pub struct FieldRule {
    pub key: &'static str,
    pub legacy: &'static [&'static str],
    pub kind: FieldKind,
}

#[derive(Debug)]
pub struct SectionRule {
    pub key: &'static str,
    pub legacy: &'static [&'static str],
    pub fields: &'static [FieldRule],
}

const fn text(key: &'static str, legacy: &'static [&'static str]) -> FieldRule {
    FieldRule {
        key,
        legacy,
        kind: FieldKind::Text,
    }
}

const fn list(key: &'static str, legacy: &'static [&'static str]) -> FieldRule {
    FieldRule {
        key,
        legacy,
        kind: FieldKind::List,
    }
}

pub const SIMILAR_COMPANIES_KEY: &str = "similarCompanies";

pub const REPORT_SCHEMA: &[SectionRule] = &[
    SectionRule {
        key: "vision",
        legacy: &[],
        fields: &[
            text("problem", &["probleme"]),
            text("solution", &[]),
            text("uniqueValue", &["valeurUnique"]),
            text("targetAudience", &["ciblePrincipale"]),
            text("positioning", &["positionnement"]),
        ],
    },
    SectionRule {
        key: "market",
        legacy: &["marche"],
        fields: &[
            text("marketSize", &["tailleMarche"]),
            list("directCompetitors", &["concurrenceDirecte"]),
            text("competitorWeaknesses", &["pointsFaiblesConcurrents"]),
            text("trends", &["tendances"]),
        ],
    },
    SectionRule {
        key: "businessModel",
        legacy: &[],
        fields: &[
            text("revenueModel", &["modeleRevenu"]),
            text("pricing", &["prix"]),
            text("initialCosts", &["coutsInitiaux"]),
            text("breakEvenPoint", &["seuilRentabilite"]),
        ],
    },
    SectionRule {
        key: "product",
        legacy: &["produit"],
        fields: &[
            list("coreFeatures", &["fonctionnalitesCore"]),
            list("userFlow", &[]),
            text("design", &[]),
            text("techStack", &[]),
        ],
    },
    SectionRule {
        key: "planning",
        legacy: &[],
        fields: &[
            text("step1", &["etape1"]),
            text("step2", &["etape2"]),
            text("step3", &["etape3"]),
        ],
    },
    SectionRule {
        key: "acquisition",
        legacy: &[],
        fields: &[
            text("socialMedia", &["reseauxSociaux"]),
            text("seo", &[]),
            text("partnerships", &["partenariats"]),
            text("advertising", &["publicite"]),
        ],
    },
    SectionRule {
        key: "metrics",
        legacy: &["mesure"],
        fields: &[
            list("keyMetrics", &["metriques"]),
            list("tools", &["outils"]),
            text("successThresholds", &["seuilsSucces"]),
        ],
    },
];

/// First non-null value among `key` and then `legacy`, in order.
fn lookup<'a>(
    object: &'a Map<String, JsonValue>,
    key: &str,
    legacy: &[&str],
) -> Option<&'a JsonValue> {
    std::iter::once(key)
        .chain(legacy.iter().copied())
        .filter_map(|candidate| object.get(candidate))
        .find(|value| !value.is_null())
}

/// First section under `key` or a legacy key that is actually an object.
fn lookup_section<'a>(
    object: &'a Map<String, JsonValue>,
    key: &str,
    legacy: &[&str],
) -> Option<&'a Map<String, JsonValue>> {
    std::iter::once(key)
        .chain(legacy.iter().copied())
        .filter_map(|candidate| object.get(candidate))
        .find_map(JsonValue::as_object)
}

fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

fn coerce_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => scalar_text(other).unwrap_or_default(),
    }
}

fn coerce_list(value: &JsonValue) -> Vec<JsonValue> {
    let items = match value {
        JsonValue::Array(items) => items.iter().filter_map(scalar_text).collect::<Vec<_>>(),
        JsonValue::String(s) if s.trim().is_empty() => Vec::new(),
        other => scalar_text(other).into_iter().collect(),
    };
    items.into_iter().map(JsonValue::String).collect()
}

fn normalize_section(raw: Option<&Map<String, JsonValue>>, rule: &SectionRule) -> JsonValue {
    let empty = Map::new();
    let raw = raw.unwrap_or(&empty);
    let mut section = Map::new();
    for field in rule.fields {
        let value = lookup(raw, field.key, field.legacy);
        let normalized = match field.kind {
            FieldKind::Text => JsonValue::String(value.map(coerce_text).unwrap_or_default()),
            FieldKind::List => JsonValue::Array(value.map(coerce_list).unwrap_or_default()),
        };
        section.insert(field.key.to_string(), normalized);
    }
    JsonValue::Object(section)
}

/// Canonical JSON object with every section and field present.
pub fn canonical_value(raw: &RawAnalysis) -> JsonValue {
    let empty = Map::new();
    let root = raw.as_object().unwrap_or(&empty);
    let mut report = Map::new();

    for rule in REPORT_SCHEMA {
        let section = lookup_section(root, rule.key, rule.legacy);
        report.insert(rule.key.to_string(), normalize_section(section, rule));
    }

    let similar = match root.get(SIMILAR_COMPANIES_KEY) {
        Some(JsonValue::Array(items)) => JsonValue::Array(items.clone()),
        _ => JsonValue::Array(Vec::new()),
    };
    report.insert(SIMILAR_COMPANIES_KEY.to_string(), similar);
    JsonValue::Object(report)
}

/// Produce a fully populated [`StrategyReport`] from raw model output.
pub fn normalize_report(raw: &RawAnalysis) -> Result<StrategyReport, ReportError> {
    serde_json::from_value(canonical_value(raw)).map_err(ReportError::Schema)
}
