// src/pivot/mod.rs

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

use crate::table::Row;

/// Key of the year in a flattened record; never used as a field name.
pub const YEAR: &str = "year";

/// One wide-format record: every field of a topic observed for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyRecord {
    pub year: i32,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl YearlyRecord {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }
}

/// How raw vector suffixes become output keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMap {
    /// Exact `raw suffix → output key` renames; checked first.
    pub renames: &'static [(&'static str, &'static str)],
    /// `raw ending → output ending` rewrites, e.g. `_count → _projects`.
    pub suffix_renames: &'static [(&'static str, &'static str)],
}

impl FieldMap {
    pub const IDENTITY: FieldMap = FieldMap {
        renames: &[],
        suffix_renames: &[],
    };

    pub fn apply(&self, raw: &str) -> String {
        if let Some((_, to)) = self.renames.iter().find(|(from, _)| *from == raw) {
            return (*to).to_string();
        }
        for (from, to) in self.suffix_renames {
            if let Some(stem) = raw.strip_suffix(from) {
                return format!("{}{}", stem, to);
            }
        }
        raw.to_string()
    }
}

/// Yearly records plus the scalar facts split off from them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SplitPivot {
    pub yearly: Vec<YearlyRecord>,
    pub summary: BTreeMap<String, f64>,
}

/// `(year, output field, value)` for every row under `prefix`, in source order.
/// Rows without an integral year or a numeric value are dropped, as are
/// fields named `year`.
fn matching_cells<'a>(
    rows: &'a [Row],
    prefix: &'a str,
    fields: &'a FieldMap,
) -> impl Iterator<Item = (i32, String, f64)> + 'a {
    let head = format!("{}_", prefix);
    rows.iter().filter_map(move |row| {
        let suffix = row.vector()?.strip_prefix(head.as_str())?;
        let (Some(year), Some(value)) = (row.ref_date().and_then(as_year), row.value()) else {
            debug!(prefix, vector = ?row.vector(), "skipping row without a numeric year/value");
            return None;
        };
        let field = fields.apply(suffix);
        if field == YEAR {
            debug!(prefix, vector = ?row.vector(), "skipping field that would shadow the year");
            return None;
        }
        Some((year, field, value))
    })
}

fn as_year(ref_date: f64) -> Option<i32> {
    let in_range = ref_date.fract() == 0.0
        && ref_date >= f64::from(i32::MIN)
        && ref_date <= f64::from(i32::MAX);
    in_range.then_some(ref_date as i32)
}

fn insert(by_year: &mut BTreeMap<i32, YearlyRecord>, year: i32, field: String, value: f64) {
    let rec = by_year
        .entry(year)
        .or_insert_with(|| YearlyRecord::new(year));
    if let Some(old) = rec.values.insert(field, value) {
        trace!(year, old, new = value, "duplicate cell overwritten");
    }
}

/// Long → wide: one record per year for the rows whose vector starts with
/// `<prefix>_`, sorted ascending by year. Later rows win on duplicate cells.
pub fn pivot_yearly(rows: &[Row], prefix: &str, fields: &FieldMap) -> Vec<YearlyRecord> {
    let mut by_year: BTreeMap<i32, YearlyRecord> = BTreeMap::new();
    for (year, field, value) in matching_cells(rows, prefix, fields) {
        insert(&mut by_year, year, field, value);
    }
    let out: Vec<YearlyRecord> = by_year.into_values().collect();
    debug!(prefix, years = out.len(), "pivoted");
    out
}

/// Like [`pivot_yearly`], but fields named in `summary_keys` land in one flat
/// map instead of the per-year records.
pub fn pivot_split(
    rows: &[Row],
    prefix: &str,
    fields: &FieldMap,
    summary_keys: &BTreeSet<&str>,
) -> SplitPivot {
    let mut by_year: BTreeMap<i32, YearlyRecord> = BTreeMap::new();
    let mut summary = BTreeMap::new();
    for (year, field, value) in matching_cells(rows, prefix, fields) {
        if summary_keys.contains(field.as_str()) {
            summary.insert(field, value);
        } else {
            insert(&mut by_year, year, field, value);
        }
    }
    SplitPivot {
        yearly: by_year.into_values().collect(),
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_table;

    fn rows(body: &str) -> Vec<Row> {
        let text = format!("vector,ref_date,value\n{}", body);
        parse_table("data.csv", text.as_bytes()).unwrap().rows
    }

    #[test]
    fn groups_by_year_and_sorts() {
        let rows = rows("capex_oil_gas,2021,12\ncapex_oil_gas,2020,10\ncapex_total,2020,15\n");
        let out = pivot_yearly(&rows, "capex", &FieldMap::IDENTITY);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].year, 2020);
        assert_eq!(out[0].get("oil_gas"), Some(10.0));
        assert_eq!(out[0].get("total"), Some(15.0));
        assert_eq!(out[1].year, 2021);
        assert_eq!(out[1].get("oil_gas"), Some(12.0));
        assert_eq!(out[1].get("total"), None);
    }

    #[test]
    fn prefix_must_be_followed_by_underscore() {
        let rows = rows("gdp_prov_ab,2020,1\ngdp_nominal_total,2020,2\ngdpx_y,2020,3\n");

        let prov = pivot_yearly(&rows, "gdp_prov", &FieldMap::IDENTITY);
        assert_eq!(prov[0].values.keys().collect::<Vec<_>>(), vec!["ab"]);

        assert!(pivot_yearly(&rows, "gdp", &FieldMap::IDENTITY)[0]
            .values
            .contains_key("prov_ab"));
        assert!(pivot_yearly(&rows, "gdpx_y", &FieldMap::IDENTITY).is_empty());
    }

    #[test]
    fn last_duplicate_wins() {
        let rows = rows("capex_total,2020,1\ncapex_total,2020,2\n");
        let out = pivot_yearly(&rows, "capex", &FieldMap::IDENTITY);
        assert_eq!(out[0].get("total"), Some(2.0));
    }

    #[test]
    fn no_matching_rows_is_empty() {
        let rows = rows("capex_total,2020,1\n");
        assert!(pivot_yearly(&rows, "infra", &FieldMap::IDENTITY).is_empty());
        assert!(pivot_yearly(&[], "capex", &FieldMap::IDENTITY).is_empty());
    }

    #[test]
    fn rows_without_numbers_are_skipped() {
        let rows = rows("capex_total,2020,n/a\ncapex_total,latest,3\ncapex_total,2020.5,4\ncapex_other,2020,5\n");
        let out = pivot_yearly(&rows, "capex", &FieldMap::IDENTITY);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].values.len(), 1);
        assert_eq!(out[0].get("other"), Some(5.0));
    }

    #[test]
    fn renames_apply_exact_then_suffix() {
        const MAP: FieldMap = FieldMap {
            renames: &[("total_count", "count_all")],
            suffix_renames: &[("_count", "_projects")],
        };
        assert_eq!(MAP.apply("total_count"), "count_all");
        assert_eq!(MAP.apply("hydro_count"), "hydro_projects");
        assert_eq!(MAP.apply("hydro_value"), "hydro_value");
    }

    #[test]
    fn split_moves_summary_keys_out() {
        let rows = rows(
            "projects_oil_gas_value,2023,50\n\
             projects_planned_projects,2024,400\n\
             projects_planned_projects,2025,410\n\
             projects_oil_gas_value,2024,55\n",
        );
        let keys: BTreeSet<&str> = ["planned_projects"].into_iter().collect();
        let out = pivot_split(&rows, "projects", &FieldMap::IDENTITY, &keys);

        assert_eq!(out.yearly.len(), 2);
        assert!(out.yearly.iter().all(|r| !r.values.contains_key("planned_projects")));
        assert_eq!(out.summary.get("planned_projects"), Some(&410.0));
    }

    #[test]
    fn serializes_flat() {
        let mut rec = YearlyRecord::new(2020);
        rec.values.insert("oil_gas".into(), 10.0);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json, serde_json::json!({"year": 2020, "oil_gas": 10.0}));
    }

    #[test]
    fn year_is_never_a_field() {
        let rows = rows("capex_year,2020,5
capex_total,2020,1
projects_year,2021,9
");

        let out = pivot_yearly(&rows, "capex", &FieldMap::IDENTITY);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].year, 2020);
        assert_eq!(out[0].values.keys().collect::<Vec<_>>(), vec!["total"]);

        let keys: BTreeSet<&str> = ["year"].into_iter().collect();
        let split = pivot_split(&rows, "projects", &FieldMap::IDENTITY, &keys);
        assert!(split.yearly.is_empty());
        assert!(split.summary.is_empty());
    }
}
