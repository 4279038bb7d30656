// src/topics/records.rs
//
// Typed shapes of the yearly records each page consumes. Field lists are
// declared once here and reused by the topic registry for column order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

macro_rules! yearly_record {
    // open shape: anything not declared is kept in `extra`
    ($(#[$meta:meta])* $name:ident { $($field:ident),* $(,)? } + extra) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub year: i32,
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<f64>,
            )*
            #[serde(flatten)]
            pub extra: BTreeMap<String, f64>,
        }

        impl $name {
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];
        }
    };
    // closed shape: unknown fields (e.g. `_pct`, `_billions` variants) are dropped
    ($(#[$meta:meta])* $name:ident { $($field:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            pub year: i32,
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<f64>,
            )*
        }

        impl $name {
            pub const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];
        }
    };
}

yearly_record! {
    /// `capex_*`: energy sector capital expenditures, millions of dollars.
    CapitalExpenditures { oil_gas, electricity, other, total }
}

yearly_record! {
    /// `infra_*`: net stock of core public infrastructure.
    InfrastructureStock {
        fuel_energy_pipelines,
        transport,
        health_housing,
        education,
        public_safety,
        environmental,
        total,
    }
}

yearly_record! {
    /// `econ_*`
    EconomicContributions { jobs, employment_income, gdp, investment_value }
}

yearly_record! {
    /// `asset_*`
    InvestmentByAsset {
        transmission_distribution,
        pipelines,
        nuclear,
        other_electric,
        hydraulic,
        wind_solar,
        steam_thermal,
        total,
    }
}

yearly_record! {
    /// `intl_*`: Canadian direct investment abroad and foreign direct investment in Canada.
    InternationalInvestment { cdia, fdi }
}

yearly_record! {
    /// `foreign_*`: share of assets under foreign control.
    ForeignControl { utilities, oil_gas, all_non_financial }
}

yearly_record! {
    /// `enviro_*`
    EnvironmentalProtection {
        oil_gas_total,
        oil_gas_wastewater,
        oil_gas_soil,
        oil_gas_air,
        oil_gas_solid_waste,
        oil_gas_other,
        electric_total,
        petroleum_total,
        all_industries_total,
    }
}

yearly_record! {
    /// `gdp_prov_*`: energy direct nominal GDP by province/territory.
    ProvincialGdp { nl, pe, ns, nb, qc, on, mb, sk, ab, bc, yt, nt, nu, national_total }
}

yearly_record! {
    /// `projects_*` series, with `_count` renamed to `_projects`.
    MajorProjectsYear {
        oil_gas_projects,
        oil_gas_value,
        electricity_projects,
        electricity_value,
        other_projects,
        other_value,
        total_projects,
        total_value,
    } + extra
}

yearly_record! {
    /// `cleantech_*`: `<tech>_projects` / `<tech>_value` pairs for every technology.
    CleanTechnology { total_projects, total_value } + extra
}

yearly_record! {
    /// `gdp_nominal_*`
    NominalGdp {
        total,
        direct,
        indirect,
        petroleum,
        electricity,
        other,
        market,
        total_pct,
        direct_pct,
        indirect_pct,
    }
}

yearly_record! {
    /// `energy_prod_*`: world primary energy production and country shares.
    WorldEnergyProduction { world_total, canada_pj, canada_pct } + extra
}

yearly_record! {
    /// `cea_*`: Canadian energy assets at home and abroad, plus per-region breakdown.
    CanadianEnergyAssets { total, domestic, abroad } + extra
}

/// Scalar facts about the major projects inventory; not tied to a year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_projects: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction_projects: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_tech_projects: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_tech_value: Option<f64>,
}

impl ProjectSummary {
    pub const FIELDS: &'static [&'static str] = &[
        "planned_projects",
        "planned_value",
        "construction_projects",
        "construction_value",
        "clean_tech_projects",
        "clean_tech_value",
    ];
}

/// Everything the major projects page needs in one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MajorProjects {
    #[serde(rename = "yearlyData")]
    pub yearly_data: Vec<MajorProjectsYear>,
    pub summary: ProjectSummary,
}
