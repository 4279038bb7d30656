// src/pages/mod.rs
//
// Which vectors each factbook page and each upstream data source uses.

use glob::Pattern;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use crate::error::{DataLoadError, Result};
use crate::table::Row;
use crate::topics::TOPICS;

/// Page name → vector prefixes (with trailing underscore) that page reads.
static PAGE_VECTORS: &[(&str, &[&str])] = &[
    // world rankings
    ("Page2", &["energy_prod_"]),
    ("Page3", &["energy_prod_"]),
    ("Page4", &["energy_prod_"]),
    // key indicators
    ("Page7", &["gdp_nominal_"]),
    ("Page8", &["gdp_prov_"]),
    ("Page9", &["gdp_nominal_"]),
    ("Page10", &["gdp_nominal_"]),
    ("Page11", &["econ_"]),
    // investment
    ("Page23", &["capex_"]),
    ("Page24", &["capex_"]),
    ("Page25", &["infra_"]),
    ("Page26", &["asset_"]),
    ("Page27", &["intl_"]),
    ("Page28", &["projects_"]),
    ("Page29", &["intl_"]),
    ("Page30", &["foreign_"]),
    ("Page31", &["intl_", "foreign_"]),
    ("Page32", &["enviro_"]),
    ("Page33", &["cleantech_"]),
    ("Page37", &["enviro_"]),
    // energy assets
    ("Page39", &["cea_"]),
];

static PAGES_BY_LOWER: Lazy<BTreeMap<String, &'static (&'static str, &'static [&'static str])>> =
    Lazy::new(|| {
        PAGE_VECTORS
            .iter()
            .map(|entry| (entry.0.to_lowercase(), entry))
            .collect()
    });

/// Canonical page names, in page order.
pub fn all_pages() -> Vec<&'static str> {
    PAGE_VECTORS.iter().map(|(name, _)| *name).collect()
}

/// Resolve `page24`, `PAGE24`, `Page24` … to the canonical name and its prefixes.
pub fn page_prefixes(page: &str) -> Result<(&'static str, &'static [&'static str])> {
    PAGES_BY_LOWER
        .get(&page.trim().to_lowercase())
        .map(|(name, prefixes)| (*name, *prefixes))
        .ok_or_else(|| DataLoadError::Unknown {
            kind: "page",
            name: page.to_string(),
            available: all_pages().into_iter().map(str::to_string).collect(),
        })
}

/// Data source name → vector prefixes, derived from the topic registry.
pub fn source_prefixes(source: &str) -> Result<String> {
    TOPICS
        .iter()
        .find(|t| t.key == source.trim())
        .map(|t| format!("{}_", t.prefix))
        .ok_or_else(|| DataLoadError::Unknown {
            kind: "source",
            name: source.to_string(),
            available: all_sources().into_iter().map(str::to_string).collect(),
        })
}

/// Data source names, sorted.
pub fn all_sources() -> Vec<&'static str> {
    let mut keys: Vec<&str> = TOPICS.iter().map(|t| t.key).collect();
    keys.sort_unstable();
    keys
}

/// Glob matcher for vector names: `capex_*`, `*_total`, `*gdp*`, exact names.
#[derive(Debug, Clone)]
pub struct VectorFilter {
    pattern: Pattern,
}

impl VectorFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Pattern::new(pattern).map_err(|e| DataLoadError::Unknown {
            kind: "vector pattern",
            name: format!("{} ({})", pattern, e.msg),
            available: Vec::new(),
        })?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, vector: &str) -> bool {
        self.pattern.matches(vector)
    }

    /// Rows whose vector matches, in source order.
    pub fn select<'a>(&self, rows: &'a [Row]) -> Vec<&'a Row> {
        rows.iter()
            .filter(|r| r.vector().is_some_and(|v| self.matches(v)))
            .collect()
    }
}

/// Rows whose vector starts with any of `prefixes`, in source order.
pub fn select_prefixed<'a>(rows: &'a [Row], prefixes: &[&str]) -> Vec<&'a Row> {
    rows.iter()
        .filter(|r| {
            r.vector()
                .is_some_and(|v| prefixes.iter().any(|p| v.starts_with(p)))
        })
        .collect()
}
