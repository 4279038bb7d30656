// src/projects_map/mod.rs
//
// `major_projects_map.csv`: one row per project for the Page30 map.

use serde::Serialize;
use tracing::warn;

use crate::table::{Cell, Row, Table};

/// A mapped major project. Cost is in millions of dollars; coordinates are
/// WGS84 degrees and absent for line features.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProjectLocation {
    pub project_name: String,
    pub company: String,
    pub location: String,
    pub province: String,
    pub project_type: String,
    pub sub_type: String,
    pub estimated_cost: Option<f64>,
    pub status: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl ProjectLocation {
    pub const COLUMNS: &'static [&'static str] = &[
        "project_name",
        "company",
        "location",
        "province",
        "project_type",
        "sub_type",
        "estimated_cost",
        "status",
        "latitude",
        "longitude",
    ];

    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

fn text(row: &Row, col: &str) -> String {
    row.get(col).map(Cell::to_string).unwrap_or_default()
}

fn number(row: &Row, col: &str) -> Option<f64> {
    row.get(col).and_then(Cell::as_number)
}

/// Pull project rows out of a parsed map file; rows without a name are dropped.
pub fn from_table(table: &Table) -> Vec<ProjectLocation> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let project_name = text(row, "project_name");
            if project_name.is_empty() {
                warn!(company = %text(row, "company"), "map row without project name");
                return None;
            }
            Some(ProjectLocation {
                project_name,
                company: text(row, "company"),
                location: text(row, "location"),
                province: text(row, "province"),
                project_type: text(row, "project_type"),
                sub_type: text(row, "sub_type"),
                estimated_cost: number(row, "estimated_cost"),
                status: text(row, "status"),
                latitude: number(row, "latitude"),
                longitude: number(row, "longitude"),
            })
        })
        .collect()
}

/// Projects in one province (`AB`, `ab`, …).
pub fn in_province<'a>(projects: &'a [ProjectLocation], province: &str) -> Vec<&'a ProjectLocation> {
    let wanted = province.trim();
    projects
        .iter()
        .filter(|p| p.province.eq_ignore_ascii_case(wanted))
        .collect()
}
