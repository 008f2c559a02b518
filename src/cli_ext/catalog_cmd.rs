//! `caidsort search` and `caidsort regions`: catalog lookups on their own.

use anyhow::{Context, Result};
use indexmap::IndexSet;
use serde_json::json;
use tabled::{Table, Tabled};
use tracing::instrument;

use crate::cli::{AppContext, RegionsArgs, SearchArgs};
use crate::cli_ext::inputs;
use crate::cli_ext::report::Palette;
use crate::core::catalog::{CatalogEntry, CatalogIndex, Resolution};
use crate::core::error::WorkflowError;
use crate::infra::config::{Config, load_config};

#[derive(Tabled)]
struct EntryLine
{
    #[tabled(rename = "OAID")]
    oaid: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Long Description")]
    long_description: String,
}

impl From<&CatalogEntry> for EntryLine
{
    fn from(entry: &CatalogEntry) -> Self
    {
        Self {
            oaid: entry
                .oaid
                .clone(),
            region: entry
                .region
                .clone(),
            long_description: entry
                .long_description
                .clone(),
        }
    }
}

fn open_catalog(
    explicit: Option<&std::path::Path>,
    cfg: &Config,
) -> Result<CatalogIndex>
{
    let path = inputs::catalog_path(explicit, cfg)?;
    let (catalog, _) = inputs::load_catalog(&path)?;
    Ok(catalog)
}

#[instrument(level = "debug", skip_all, fields(text = %args.text))]
pub fn search(
    args: SearchArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let cfg = load_config()?;
    let catalog = open_catalog(args.catalog.as_deref(), &cfg)?;
    let palette = Palette::new(ctx);

    let requested = if args
        .regions
        .is_empty()
    {
        cfg.catalog
            .default_regions
            .clone()
    }
    else
    {
        args.regions
    };
    let regions: IndexSet<String> = requested
        .into_iter()
        .map(|r| {
            r.trim()
                .to_string()
        })
        .filter(|r| !r.is_empty())
        .collect();

    if regions.is_empty()
    {
        return Err(WorkflowError::incomplete("select at least one region"))
            .context("Pass --region or set catalog.default_regions");
    }
    if let Some(unknown) = regions
        .iter()
        .find(|r| {
            !catalog
                .regions()
                .any(|k| k == r.as_str())
        })
    {
        return Err(WorkflowError::not_found("region", unknown.as_str()).into());
    }

    let hits = catalog.search(&regions, &args.text);
    let resolution = Resolution::resolve(&hits, args.pick.as_deref())?;

    if args.json
    {
        let (status, selected) = match &resolution
        {
            Resolution::Selected(entry) => ("selected", Some(entry)),
            Resolution::NoMatch => ("no_match", None),
            Resolution::Ambiguous(_) => ("ambiguous", None),
        };
        let output = json!({
            "status": status,
            "selected": selected,
            "candidates": hits,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match resolution
    {
        Resolution::Selected(entry) =>
        {
            println!(
                "{} {} {}",
                palette.ok("✓"),
                palette.key(&entry.oaid),
                entry.long_description
            );
        }
        Resolution::NoMatch =>
        {
            println!("{} no catalog entry matches \"{}\"", palette.warn("!"), args.text);
        }
        Resolution::Ambiguous(list) =>
        {
            println!(
                "{} {} entries match; rerun with --pick OAID",
                palette.warn("!"),
                list.len()
            );
            if !ctx.quiet
            {
                let table = Table::new(
                    list.iter()
                        .map(EntryLine::from),
                )
                .to_string();
                println!("{}", table);
            }
        }
    }

    Ok(())
}

pub fn regions(
    args: RegionsArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let cfg = load_config()?;
    let catalog = open_catalog(args.catalog.as_deref(), &cfg)?;
    let regions: Vec<&str> = catalog
        .regions()
        .collect();

    if args.json
    {
        println!("{}", serde_json::to_string_pretty(&regions)?);
        return Ok(());
    }

    let palette = Palette::new(ctx);
    for region in &regions
    {
        println!("{}", palette.key(region));
    }
    if !ctx.quiet
    {
        eprintln!("{} regions, {} entries", regions.len(), catalog.len());
    }
    Ok(())
}
