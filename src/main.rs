use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use factbook::{
    export,
    metadata::for_prefix,
    pages, projects_map,
    table::Row,
    topics::{self, TopicSchema},
    Config, Factbook,
};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Load the energy factbook CSV export and print per-year datasets"
)]
struct Args {
    /// Directory or http(s) URL holding the exported CSV files
    #[arg(long, global = true)]
    base: Option<String>,
    /// YAML config file
    #[arg(long, global = true, env = "FACTBOOK_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one dataset as JSON (`capital_expenditures`, `capex`, `major_projects`, …)
    Topic { name: String },
    /// Write one dataset as a CSV table
    Export {
        name: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Raw rows whose vector matches a glob, e.g. `capex_*`
    Vectors { pattern: String },
    /// Raw rows a page reads, e.g. `page24`
    Page { page: String },
    /// Vector metadata, optionally restricted to one prefix
    Metadata {
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Major projects map locations, optionally for one province
    Map {
        #[arg(long)]
        province: Option<String>,
    },
    /// List pages and the vector prefixes they read
    Pages,
    /// List data sources and their vector prefixes
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ─── 1) config ───────────────────────────────────────────────────
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(base) = args.base {
        config.base = base;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    // ─── 2) init logging ─────────────────────────────────────────────
    // stdout carries the data, so logs go to stderr
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(io::stderr)
        .init();

    let start = Instant::now();
    let factbook = Factbook::from_config(&config).context("setting up data source")?;
    info!(source = %factbook.describe(), "startup");

    // ─── 3) run ──────────────────────────────────────────────────────
    match args.command {
        Command::Topic { name } => {
            let topic = topics::find_topic(&name)?;
            let json = topic_json(&factbook, topic).await?;
            let mut out = io::stdout().lock();
            serde_json::to_writer_pretty(&mut out, &json)?;
            writeln!(out)?;
        }
        Command::Export { name, out } => {
            let (topic, records) = factbook.topic_records(&name).await?;
            let missing = topic.missing_fields(&records);
            if !records.is_empty() && !missing.is_empty() {
                warn!(topic = topic.key, ?missing, "declared fields with no data");
            }
            let columns = topic.columns(&records);
            let sink = open_output(out.as_ref())?;
            export::write_yearly(sink, &columns, &records)
                .with_context(|| format!("writing {}", topic.key))?;
            info!(topic = topic.key, records = records.len(), "exported");
        }
        Command::Vectors { pattern } => {
            let rows = factbook.vectors_matching(&pattern).await?;
            print_rows(&factbook, &rows).await?;
        }
        Command::Page { page } => {
            let rows = factbook.page_rows(&page).await?;
            print_rows(&factbook, &rows).await?;
        }
        Command::Metadata { prefix } => {
            let entries = factbook.metadata().await?;
            let selected: Vec<_> = match prefix {
                Some(p) => for_prefix(&entries, &p).into_iter().cloned().collect(),
                None => entries.to_vec(),
            };
            export::write_metadata(io::stdout().lock(), &selected)?;
        }
        Command::Map { province } => {
            let projects = factbook.major_projects_map().await?;
            let selected = match province {
                Some(p) => projects_map::in_province(&projects, &p),
                None => projects.iter().collect(),
            };
            let located = selected.iter().filter(|p| p.has_coordinates()).count();
            export::write_project_locations(io::stdout().lock(), &selected)?;
            info!(projects = selected.len(), located, "printed");
        }
        Command::Pages => {
            let mut out = io::stdout().lock();
            for page in pages::all_pages() {
                let (name, prefixes) = pages::page_prefixes(page)?;
                writeln!(out, "{}\t{}", name, prefixes.join(","))?;
            }
        }
        Command::Sources => {
            let mut out = io::stdout().lock();
            for source in pages::all_sources() {
                writeln!(out, "{}\t{}", source, pages::source_prefixes(source)?)?;
            }
        }
    }

    info!(rows = ?factbook.loaded_rows(), elapsed = ?start.elapsed(), "done");
    Ok(())
}

/// The typed dataset for `topic`, as JSON.
async fn topic_json(fb: &Factbook, topic: &TopicSchema) -> Result<serde_json::Value> {
    let value = match topic.key {
        "capital_expenditures" => to_json(fb.capital_expenditures().await?),
        "infrastructure" => to_json(fb.infrastructure_stock().await?),
        "economic_contributions" => to_json(fb.economic_contributions().await?),
        "investment_by_asset" => to_json(fb.investment_by_asset().await?),
        "international_investment" => to_json(fb.international_investment().await?),
        "foreign_control" => to_json(fb.foreign_control().await?),
        "environmental_protection" => to_json(fb.environmental_protection().await?),
        "provincial_gdp" => to_json(fb.provincial_gdp().await?),
        "major_projects" => to_json(fb.major_projects().await?),
        "clean_tech" => to_json(fb.clean_technology().await?),
        "nominal_gdp" => to_json(fb.nominal_gdp().await?),
        "world_energy_production" => to_json(fb.world_energy_production().await?),
        "canadian_energy_assets" => to_json(fb.canadian_energy_assets().await?),
        _ => to_json(fb.topic_records(topic.key).await?.1),
    };
    value.with_context(|| format!("serializing {}", topic.key))
}

fn to_json<T: Serialize>(v: T) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(v)
}

fn open_output(path: Option<&PathBuf>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => {
            let f = File::create(p).with_context(|| format!("creating {}", p.display()))?;
            Box::new(BufWriter::new(f))
        }
        None => Box::new(io::stdout().lock()),
    })
}

async fn print_rows(fb: &Factbook, rows: &[Row]) -> Result<()> {
    let headers = fb.headers().await?;
    let refs: Vec<&Row> = rows.iter().collect();
    export::write_rows(io::stdout().lock(), &headers, &refs)?;
    info!(rows = rows.len(), "printed");
    Ok(())
}
