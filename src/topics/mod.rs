// src/topics/mod.rs
pub mod records;

use serde::de::DeserializeOwned;
use std::collections::BTreeSet;

use crate::error::{DataLoadError, Result};
use crate::pivot::{pivot_split, pivot_yearly, FieldMap, SplitPivot, YearlyRecord, YEAR};
use crate::table::Row;
pub use records::*;

/// Static description of one dataset in `data.csv`.
#[derive(Debug, Clone, Copy)]
pub struct TopicSchema {
    /// Data source name, as used by the exporter (`capital_expenditures`).
    pub key: &'static str,
    /// Vector prefix without the trailing underscore (`capex`).
    pub prefix: &'static str,
    /// Declared output fields, in display order.
    pub fields: &'static [&'static str],
    pub field_map: FieldMap,
    /// Output fields that are scalar facts rather than yearly series.
    pub summary: &'static [&'static str],
    /// Whether fields beyond `fields` are part of the shape (per-technology, per-region…).
    pub open: bool,
}

const COUNT_AS_PROJECTS: FieldMap = FieldMap {
    renames: &[],
    suffix_renames: &[("_count", "_projects")],
};

const fn closed(key: &'static str, prefix: &'static str, fields: &'static [&'static str]) -> TopicSchema {
    TopicSchema {
        key,
        prefix,
        fields,
        field_map: FieldMap::IDENTITY,
        summary: &[],
        open: false,
    }
}

pub const CAPITAL_EXPENDITURES: TopicSchema =
    closed("capital_expenditures", "capex", CapitalExpenditures::FIELDS);
pub const INFRASTRUCTURE: TopicSchema =
    closed("infrastructure", "infra", InfrastructureStock::FIELDS);
pub const ECONOMIC_CONTRIBUTIONS: TopicSchema =
    closed("economic_contributions", "econ", EconomicContributions::FIELDS);
pub const INVESTMENT_BY_ASSET: TopicSchema =
    closed("investment_by_asset", "asset", InvestmentByAsset::FIELDS);
pub const INTERNATIONAL_INVESTMENT: TopicSchema =
    closed("international_investment", "intl", InternationalInvestment::FIELDS);
pub const FOREIGN_CONTROL: TopicSchema =
    closed("foreign_control", "foreign", ForeignControl::FIELDS);
pub const ENVIRONMENTAL_PROTECTION: TopicSchema =
    closed("environmental_protection", "enviro", EnvironmentalProtection::FIELDS);
pub const PROVINCIAL_GDP: TopicSchema = closed("provincial_gdp", "gdp_prov", ProvincialGdp::FIELDS);
pub const NOMINAL_GDP: TopicSchema = closed("nominal_gdp", "gdp_nominal", NominalGdp::FIELDS);

pub const MAJOR_PROJECTS: TopicSchema = TopicSchema {
    key: "major_projects",
    prefix: "projects",
    fields: MajorProjectsYear::FIELDS,
    field_map: COUNT_AS_PROJECTS,
    summary: ProjectSummary::FIELDS,
    open: true,
};

pub const CLEAN_TECH: TopicSchema = TopicSchema {
    key: "clean_tech",
    prefix: "cleantech",
    fields: CleanTechnology::FIELDS,
    field_map: COUNT_AS_PROJECTS,
    summary: &[],
    open: true,
};

pub const WORLD_ENERGY_PRODUCTION: TopicSchema = TopicSchema {
    open: true,
    ..closed("world_energy_production", "energy_prod", WorldEnergyProduction::FIELDS)
};

pub const CANADIAN_ENERGY_ASSETS: TopicSchema = TopicSchema {
    open: true,
    ..closed("canadian_energy_assets", "cea", CanadianEnergyAssets::FIELDS)
};

/// Every dataset the factbook pages read.
pub const TOPICS: &[TopicSchema] = &[
    ECONOMIC_CONTRIBUTIONS,
    NOMINAL_GDP,
    PROVINCIAL_GDP,
    WORLD_ENERGY_PRODUCTION,
    CANADIAN_ENERGY_ASSETS,
    CAPITAL_EXPENDITURES,
    INFRASTRUCTURE,
    INVESTMENT_BY_ASSET,
    INTERNATIONAL_INVESTMENT,
    FOREIGN_CONTROL,
    ENVIRONMENTAL_PROTECTION,
    MAJOR_PROJECTS,
    CLEAN_TECH,
];

/// Look a topic up by source key (`capital_expenditures`) or prefix (`capex`).
pub fn find_topic(name: &str) -> Result<&'static TopicSchema> {
    let wanted = name.trim().trim_end_matches('_').to_lowercase();
    TOPICS
        .iter()
        .find(|t| t.key == wanted || t.prefix == wanted)
        .ok_or_else(|| DataLoadError::Unknown {
            kind: "topic",
            name: name.to_string(),
            available: TOPICS.iter().map(|t| t.key.to_string()).collect(),
        })
}

impl TopicSchema {
    /// Untyped yearly records. Summary fields, if any, are left out.
    pub fn pivot(&self, rows: &[Row]) -> Vec<YearlyRecord> {
        if self.summary.is_empty() {
            pivot_yearly(rows, self.prefix, &self.field_map)
        } else {
            self.split(rows).yearly
        }
    }

    pub fn split(&self, rows: &[Row]) -> SplitPivot {
        let keys: BTreeSet<&str> = self.summary.iter().copied().collect();
        pivot_split(rows, self.prefix, &self.field_map, &keys)
    }

    /// Yearly records shaped as `R`.
    pub fn shaped<R: DeserializeOwned>(&self, rows: &[Row]) -> Result<Vec<R>> {
        self.pivot(rows)
            .iter()
            .map(|rec| self.shape(rec))
            .collect()
    }

    pub(crate) fn shape<R: DeserializeOwned, S: serde::Serialize>(&self, rec: &S) -> Result<R> {
        serde_json::to_value(rec)
            .and_then(serde_json::from_value)
            .map_err(|e| DataLoadError::Shape {
                topic: self.key.to_string(),
                message: e.to_string(),
            })
    }

    /// Column headers for a table of `records`: `year`, the declared fields, then
    /// (for open shapes) any other field seen, alphabetically.
    pub fn columns(&self, records: &[YearlyRecord]) -> Vec<String> {
        let mut cols: Vec<String> = std::iter::once(YEAR)
            .chain(self.fields.iter().copied())
            .map(str::to_string)
            .collect();
        if self.open {
            let extra: BTreeSet<&String> = records
                .iter()
                .flat_map(|r| r.values.keys())
                .filter(|k| !self.fields.contains(&k.as_str()))
                .collect();
            cols.extend(extra.into_iter().cloned());
        }
        cols
    }

    /// Declared fields with no value in any of `records`.
    pub fn missing_fields(&self, records: &[YearlyRecord]) -> Vec<&'static str> {
        self.fields
            .iter()
            .copied()
            .filter(|f| !records.iter().any(|r| r.values.contains_key(*f)))
            .collect()
    }
}

/// The major projects page: per-year series plus inventory-wide facts.
pub fn major_projects(rows: &[Row]) -> Result<MajorProjects> {
    let split = MAJOR_PROJECTS.split(rows);
    let yearly_data = split
        .yearly
        .iter()
        .map(|rec| MAJOR_PROJECTS.shape(rec))
        .collect::<Result<Vec<MajorProjectsYear>>>()?;
    let summary: ProjectSummary = MAJOR_PROJECTS.shape(&split.summary)?;
    Ok(MajorProjects {
        yearly_data,
        summary,
    })
}
