//! Terminal output and result delivery shared by `match` and `expand`.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::cli::{AppContext, OutputArgs};
use crate::cli_ext::inputs::LoadStats;
use crate::core::expand::{ExpandOutcome, FinalRow};
use crate::core::export::{self, ExportFormat, RowShape};
use crate::infra::config::Config;

/// Colors that switch off under `--no-color`.
#[derive(Debug, Clone, Copy)]
pub struct Palette
{
    color: bool,
}

impl Palette
{
    pub fn new(ctx: &AppContext) -> Self
    {
        Self { color: !ctx.no_color }
    }

    pub fn ok(
        &self,
        text: &str,
    ) -> String
    {
        if self.color { text.green().to_string() } else { text.to_string() }
    }

    pub fn warn(
        &self,
        text: &str,
    ) -> String
    {
        if self.color { text.yellow().to_string() } else { text.to_string() }
    }

    pub fn key(
        &self,
        text: &str,
    ) -> String
    {
        if self.color { text.cyan().to_string() } else { text.to_string() }
    }

    pub fn bold(
        &self,
        text: &str,
    ) -> String
    {
        if self.color { text.bold().to_string() } else { text.to_string() }
    }
}

/// Counters reported after a run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary
{
    pub strategy: &'static str,
    pub sites: usize,
    pub pairs: usize,
    pub skipped_lines: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub unassigned: usize,
    pub rows: usize,
}

impl RunSummary
{
    pub fn new(
        strategy: &'static str,
        stats: &LoadStats,
        matched: usize,
        unmatched: usize,
        outcome: &ExpandOutcome,
    ) -> Self
    {
        Self {
            strategy,
            sites: stats.sites,
            pairs: stats
                .caid_lines
                .accepted,
            skipped_lines: stats
                .caid_lines
                .skipped,
            matched,
            unmatched,
            unassigned: outcome.unassigned,
            rows: outcome
                .rows
                .len(),
        }
    }
}

#[derive(Tabled)]
struct SimpleLine
{
    #[tabled(rename = "Order")]
    order: usize,
    #[tabled(rename = "SITE_ID")]
    site_id: String,
    #[tabled(rename = "CAID")]
    caid: String,
}

#[derive(Tabled)]
struct FullLine
{
    #[tabled(rename = "Order")]
    order: usize,
    #[tabled(rename = "SITE_ID")]
    site_id: String,
    #[tabled(rename = "CAID")]
    caid: String,
    #[tabled(rename = "OAID")]
    oaid: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
}

/// First `limit` rows as a table.
pub fn preview_table(
    rows: &[FinalRow],
    limit: usize,
) -> String
{
    let head = rows
        .iter()
        .take(limit);

    match RowShape::detect(rows)
    {
        RowShape::Simple => Table::new(head.map(|r| SimpleLine {
            order: r.order,
            site_id: r
                .site_id
                .clone(),
            caid: r
                .caid
                .clone(),
        }))
        .to_string(),
        RowShape::Full => Table::new(head.map(|r| FullLine {
            order: r.order,
            site_id: r
                .site_id
                .clone(),
            caid: r
                .caid
                .clone(),
            oaid: r
                .oaid
                .clone()
                .unwrap_or_default(),
            quantity: r
                .quantity
                .map(|q| q.to_string())
                .unwrap_or_default(),
        }))
        .to_string(),
    }
}

fn print_summary(
    summary: &RunSummary,
    palette: Palette,
)
{
    println!(
        "{} {} sites, {} CAID pairs, {} matched",
        palette.bold("Summary:"),
        summary.sites,
        summary.pairs,
        summary.matched
    );

    if summary.unmatched > 0
    {
        println!("  {} {} sites had no CAID", palette.warn("!"), summary.unmatched);
    }
    if summary.skipped_lines > 0
    {
        println!("  {} {} CAID lines skipped", palette.warn("!"), summary.skipped_lines);
    }
    if summary.unassigned > 0
    {
        println!("  {} {} matched rows not in any block", palette.warn("!"), summary.unassigned);
    }
    println!("  {} rows ({})", summary.rows, palette.key(summary.strategy));
}

#[derive(Serialize)]
struct JsonReport<'a>
{
    summary: &'a RunSummary,
    rows: &'a [FinalRow],
}

/// Print, copy or write the final rows according to the output flags.
pub fn deliver(
    rows: &[FinalRow],
    summary: &RunSummary,
    out: &OutputArgs,
    cfg: &Config,
    ctx: &AppContext,
) -> Result<()>
{
    let palette = Palette::new(ctx);

    if out.json
    {
        let report = JsonReport { summary, rows };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize results")?
        );
        return Ok(());
    }

    if !ctx.quiet
    {
        print_summary(summary, palette);
        if cfg.preview.rows > 0 && !rows.is_empty()
        {
            println!("{}", preview_table(rows, cfg.preview.rows));
            if rows.len() > cfg.preview.rows
            {
                println!("  … {} more rows", rows.len() - cfg.preview.rows);
            }
        }
    }

    if rows.is_empty() && !ctx.quiet
    {
        eprintln!("{} no rows to export", palette.warn("warning:"));
    }

    if out.clipboard
    {
        if ctx.dry_run
        {
            println!("{} copy {} rows to clipboard", palette.warn("DRY RUN: Would"), rows.len());
            return Ok(());
        }
        export::copy_to_clipboard(rows)?;
        if !ctx.quiet
        {
            println!("{} Copied {} rows to clipboard", palette.ok("✓"), rows.len());
        }
        return Ok(());
    }

    let format: ExportFormat = out
        .format
        .unwrap_or(cfg.export.format);
    let path = out
        .output
        .clone()
        .unwrap_or_else(|| {
            cfg.export
                .default_output(format)
        });

    if ctx.dry_run
    {
        println!(
            "{} write {} rows as {} to {}",
            palette.warn("DRY RUN: Would"),
            rows.len(),
            format.extension(),
            path.display()
        );
        return Ok(());
    }

    export::write_export(rows, format, &path)?;
    if !ctx.quiet
    {
        println!("{} Wrote {} rows to {}", palette.ok("✓"), rows.len(), path.display());
    }
    Ok(())
}
