// src/metadata/mod.rs

use serde::Serialize;
use tracing::warn;

use crate::table::{Cell, Table};

/// One line of `metadata.csv`: what a vector measures and in which unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorMetadata {
    pub vector: String,
    pub title: String,
    pub uom: String,
    pub scalar_factor: String,
}

fn text(cell: Option<&Cell>) -> String {
    cell.map(Cell::to_string).unwrap_or_default()
}

/// Pull metadata entries out of a parsed `metadata.csv`; rows without a vector are dropped.
pub fn from_table(table: &Table) -> Vec<VectorMetadata> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let Some(vector) = row.vector().filter(|v| !v.is_empty()) else {
                warn!(title = %text(row.get("title")), "metadata row without vector");
                return None;
            };
            Some(VectorMetadata {
                vector: vector.to_string(),
                title: text(row.get("title")),
                uom: text(row.get("uom")),
                scalar_factor: text(row.get("scalar_factor")),
            })
        })
        .collect()
}

/// Entries whose vector starts with `<prefix>_`.
pub fn for_prefix<'a>(entries: &'a [VectorMetadata], prefix: &str) -> Vec<&'a VectorMetadata> {
    let head = format!("{}_", prefix.trim_end_matches('_'));
    entries
        .iter()
        .filter(|m| m.vector.starts_with(&head))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_table;

    const METADATA: &str = "vector,title,uom,scalar_factor\n\
capex_total,\"Capital expenditures - Total energy sector\",Millions of dollars,millions\n\
gdp_prov_ab,\"Energy sector direct nominal GDP - Alberta\",Millions of dollars,millions\n\
,orphan,Number,units\n";

    #[test]
    fn reads_metadata_rows() {
        let table = parse_table("metadata.csv", METADATA.as_bytes()).unwrap();
        let entries = from_table(&table);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].vector, "capex_total");
        assert_eq!(entries[0].title, "Capital expenditures - Total energy sector");
        assert_eq!(entries[0].uom, "Millions of dollars");
        assert_eq!(entries[1].scalar_factor, "millions");
    }

    #[test]
    fn filters_by_prefix() {
        let table = parse_table("metadata.csv", METADATA.as_bytes()).unwrap();
        let entries = from_table(&table);

        let prov = for_prefix(&entries, "gdp_prov_");
        assert_eq!(prov.len(), 1);
        assert_eq!(prov[0].vector, "gdp_prov_ab");
        assert!(for_prefix(&entries, "gdp").len() == 1);
    }
}
