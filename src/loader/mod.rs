// src/loader/mod.rs

use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::cache::LoadGate;
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{source_for, CsvSource};
use crate::metadata::{self, VectorMetadata};
use crate::pages::{self, VectorFilter};
use crate::pivot::YearlyRecord;
use crate::projects_map::{self, ProjectLocation};
use crate::table::{parse_table, Row, Table};
use crate::topics::{self, *};

/// The factbook data service: one source, one cache per CSV resource, and the
/// typed accessors the pages call.
///
/// Cheap to share behind an `Arc`; every clone of that `Arc` sees the same cache.
pub struct Factbook {
    source: Arc<dyn CsvSource>,
    data_file: String,
    metadata_file: String,
    map_file: String,
    data: LoadGate<Table>,
    metadata: LoadGate<Vec<VectorMetadata>>,
    projects_map: LoadGate<Vec<ProjectLocation>>,
}

impl Factbook {
    pub fn new(source: Arc<dyn CsvSource>) -> Self {
        Self::with_files(source, "data.csv", "metadata.csv", "major_projects_map.csv")
    }

    pub fn with_files(
        source: Arc<dyn CsvSource>,
        data_file: impl Into<String>,
        metadata_file: impl Into<String>,
        map_file: impl Into<String>,
    ) -> Self {
        let data_file = data_file.into();
        let metadata_file = metadata_file.into();
        let map_file = map_file.into();
        Self {
            data: LoadGate::new(data_file.clone()),
            metadata: LoadGate::new(metadata_file.clone()),
            projects_map: LoadGate::new(map_file.clone()),
            source,
            data_file,
            metadata_file,
            map_file,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let source = source_for(&config.base)?;
        Ok(Self::with_files(
            source,
            config.data_file.clone(),
            config.metadata_file.clone(),
            config.map_file.clone(),
        ))
    }

    /// The whole of `data.csv`, fetched and parsed at most once.
    #[instrument(level = "debug", skip(self), fields(file = %self.data_file))]
    pub async fn table(&self) -> Result<Arc<Table>> {
        let source = Arc::clone(&self.source);
        let name = self.data_file.clone();
        self.data
            .get_or_load(move || async move { load_table(source, name).await })
            .await
    }

    /// Every entry of `metadata.csv`, fetched and parsed at most once.
    pub async fn metadata(&self) -> Result<Arc<Vec<VectorMetadata>>> {
        let source = Arc::clone(&self.source);
        let name = self.metadata_file.clone();
        self.metadata
            .get_or_load(move || async move {
                let table = load_table(source, name).await?;
                Ok(metadata::from_table(&table))
            })
            .await
    }

    /// Every project of `major_projects_map.csv`, fetched and parsed at most once.
    pub async fn major_projects_map(&self) -> Result<Arc<Vec<ProjectLocation>>> {
        let source = Arc::clone(&self.source);
        let name = self.map_file.clone();
        self.projects_map
            .get_or_load(move || async move {
                let table = load_table(source, name).await?;
                Ok(projects_map::from_table(&table))
            })
            .await
    }

    /// Row count of `data.csv` if it is already cached; never triggers a load.
    pub fn loaded_rows(&self) -> Option<usize> {
        self.data.peek().map(|t| t.len())
    }

    async fn shaped<R: DeserializeOwned>(&self, topic: &TopicSchema) -> Result<Vec<R>> {
        let table = self.table().await?;
        topic.shaped(&table.rows)
    }

    pub async fn capital_expenditures(&self) -> Result<Vec<CapitalExpenditures>> {
        self.shaped(&CAPITAL_EXPENDITURES).await
    }

    pub async fn infrastructure_stock(&self) -> Result<Vec<InfrastructureStock>> {
        self.shaped(&INFRASTRUCTURE).await
    }

    pub async fn economic_contributions(&self) -> Result<Vec<EconomicContributions>> {
        self.shaped(&ECONOMIC_CONTRIBUTIONS).await
    }

    pub async fn investment_by_asset(&self) -> Result<Vec<InvestmentByAsset>> {
        self.shaped(&INVESTMENT_BY_ASSET).await
    }

    pub async fn international_investment(&self) -> Result<Vec<InternationalInvestment>> {
        self.shaped(&INTERNATIONAL_INVESTMENT).await
    }

    pub async fn foreign_control(&self) -> Result<Vec<ForeignControl>> {
        self.shaped(&FOREIGN_CONTROL).await
    }

    pub async fn environmental_protection(&self) -> Result<Vec<EnvironmentalProtection>> {
        self.shaped(&ENVIRONMENTAL_PROTECTION).await
    }

    pub async fn provincial_gdp(&self) -> Result<Vec<ProvincialGdp>> {
        self.shaped(&PROVINCIAL_GDP).await
    }

    pub async fn major_projects(&self) -> Result<MajorProjects> {
        let table = self.table().await?;
        topics::major_projects(&table.rows)
    }

    pub async fn clean_technology(&self) -> Result<Vec<CleanTechnology>> {
        self.shaped(&CLEAN_TECH).await
    }

    pub async fn nominal_gdp(&self) -> Result<Vec<NominalGdp>> {
        self.shaped(&NOMINAL_GDP).await
    }

    pub async fn world_energy_production(&self) -> Result<Vec<WorldEnergyProduction>> {
        self.shaped(&WORLD_ENERGY_PRODUCTION).await
    }

    pub async fn canadian_energy_assets(&self) -> Result<Vec<CanadianEnergyAssets>> {
        self.shaped(&CANADIAN_ENERGY_ASSETS).await
    }

    /// Untyped yearly records for any registered topic, by key or prefix.
    pub async fn topic_records(&self, topic: &str) -> Result<(&'static TopicSchema, Vec<YearlyRecord>)> {
        let schema = topics::find_topic(topic)?;
        let table = self.table().await?;
        Ok((schema, schema.pivot(&table.rows)))
    }

    /// Raw rows whose vector matches a glob such as `capex_*`.
    pub async fn vectors_matching(&self, pattern: &str) -> Result<Vec<Row>> {
        let filter = VectorFilter::new(pattern)?;
        let table = self.table().await?;
        Ok(filter.select(&table.rows).into_iter().cloned().collect())
    }

    /// Raw rows read by one page (`Page24`, `page24`, …).
    pub async fn page_rows(&self, page: &str) -> Result<Vec<Row>> {
        let (_, prefixes) = pages::page_prefixes(page)?;
        let table = self.table().await?;
        Ok(pages::select_prefixed(&table.rows, prefixes)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Column names of `data.csv`; loads it if needed.
    pub async fn headers(&self) -> Result<Vec<String>> {
        Ok(self.table().await?.headers.clone())
    }

    pub fn describe(&self) -> String {
        format!("{}/{}", self.source.describe().trim_end_matches('/'), self.data_file)
    }
}

async fn load_table(source: Arc<dyn CsvSource>, name: String) -> Result<Table> {
    let start = Instant::now();
    let bytes = source.fetch(&name).await?;
    let table = parse_table(&name, &bytes)?;
    info!(
        file = %name,
        from = %source.describe(),
        bytes = bytes.len(),
        rows = table.len(),
        elapsed = ?start.elapsed(),
        "loaded"
    );
    Ok(table)
}
