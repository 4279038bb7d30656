// src/lib.rs
//
// Data layer for the energy factbook: loads the exporter's long-format CSV
// once, pivots it into per-year records and hands typed datasets to pages.

pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod loader;
pub mod metadata;
pub mod pages;
pub mod pivot;
pub mod projects_map;
pub mod table;
pub mod topics;

pub use config::Config;
pub use error::{DataLoadError, Result};
pub use loader::Factbook;
