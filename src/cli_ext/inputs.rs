//! File loading for the command handlers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::cli::InputArgs;
use crate::core::catalog::{CatalogIndex, CatalogStats};
use crate::core::input::{self, NormalizeStats};
use crate::core::session::Session;
use crate::infra::config::Config;
use crate::infra::io;

/// What the input files contributed
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LoadStats
{
    pub sites: usize,
    pub caid_lines: NormalizeStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<CatalogStats>,
}

fn read_sites(path: &Path) -> Result<String>
{
    if io::is_spreadsheet(path)
    {
        let rows = io::read_table(path)?;
        return Ok(rows
            .iter()
            .filter_map(|r| r.first())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n"));
    }
    io::read_text(path)
}

/// Session with sites and CAID pairs loaded and matched.
#[instrument(level = "debug", skip_all, fields(sites = %args.sites.display(), caids = %args.caids.display()))]
pub fn load_session(args: &InputArgs) -> Result<(Session, LoadStats)>
{
    let mut session = Session::new();
    let mut stats = LoadStats::default();

    let text = read_sites(&args.sites)?;
    stats.sites = session
        .load_sites(&text)
        .with_context(|| format!("No site IDs in {}", args.sites.display()))?;

    let (pairs, caid_stats) = if io::is_spreadsheet(&args.caids)
    {
        input::parse_caid_rows(&io::read_table(&args.caids)?)
    }
    else
    {
        input::parse_caid_pairs_with_stats(&io::read_text(&args.caids)?)
    };
    stats.caid_lines = caid_stats;

    session
        .load_pairs(pairs)
        .with_context(|| format!("No SITE_ID,CAID lines in {}", args.caids.display()))?;

    info!(
        sites = stats.sites,
        pairs = caid_stats.accepted,
        skipped = caid_stats.skipped,
        matched = session.matched().records.len(),
        "inputs loaded"
    );
    Ok((session, stats))
}

/// Explicit `--catalog`, else the configured path.
pub fn catalog_path(
    explicit: Option<&Path>,
    cfg: &Config,
) -> Result<PathBuf>
{
    explicit
        .map(Path::to_path_buf)
        .or_else(|| {
            cfg.catalog
                .resolved_path()
        })
        .context("No catalog given: pass --catalog or set catalog.path in caidsort.toml")
}

/// Read and index a catalog table (spreadsheet or delimited text).
#[instrument(level = "debug")]
pub fn load_catalog(path: &Path) -> Result<(CatalogIndex, CatalogStats)>
{
    let mut rows = io::read_table(path)?;
    if rows.is_empty()
    {
        anyhow::bail!("Catalog {} is empty", path.display());
    }

    let header = rows.remove(0);
    let (catalog, stats) = CatalogIndex::from_table(&header, &rows)
        .with_context(|| format!("Unrecognized catalog layout in {}", path.display()))?;

    info!(loaded = stats.loaded, dropped = stats.dropped, "catalog loaded");
    Ok((catalog, stats))
}

/// Plan regions win; otherwise configured defaults that exist in the
/// catalog are preselected.
pub fn preselect_regions(
    session: &mut Session,
    cfg: &Config,
)
{
    let known: Vec<&String> = cfg
        .catalog
        .default_regions
        .iter()
        .filter(|r| {
            session
                .catalog()
                .regions()
                .any(|k| k == r.as_str())
        })
        .collect();

    if !known.is_empty()
    {
        if let Err(err) = session.select_regions(known)
        {
            warn!(%err, "configured default regions ignored");
        }
    }
}
