//! Serialization of final rows to CSV, plain text, XLSX and the clipboard.
//!
//! CSV output is comma-joined without quoting, so values containing commas
//! produce ragged lines. That matches the format downstream trackers
//! accept.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::expand::FinalRow;

/// Output encodings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat
{
    /// Comma-separated with header row
    #[default]
    Csv,
    /// Tab-separated, no header (same text as the clipboard)
    Txt,
    /// Single-sheet workbook with CAID, OAID, Quantity columns
    Xlsx,
}

impl ExportFormat
{
    pub fn extension(self) -> &'static str
    {
        match self
        {
            Self::Csv => "csv",
            Self::Txt => "txt",
            Self::Xlsx => "xlsx",
        }
    }
}

/// Column layout, decided by whether any row carries an OAID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape
{
    /// Order, site and CAID only
    Simple,
    /// Identity plus OAID and quantity
    Full,
}

impl RowShape
{
    pub fn detect(rows: &[FinalRow]) -> Self
    {
        if rows
            .iter()
            .any(|r| r.oaid.is_some())
        {
            Self::Full
        }
        else
        {
            Self::Simple
        }
    }
}

fn quantity_text(row: &FinalRow) -> String
{
    row.quantity
        .map(|q| q.to_string())
        .unwrap_or_default()
}

/// CSV with an `Order,SITE_ID,CAID[,OAID,Quantity]` header.
pub fn to_csv(rows: &[FinalRow]) -> String
{
    let shape = RowShape::detect(rows);
    let header = match shape
    {
        RowShape::Simple => "Order,SITE_ID,CAID",
        RowShape::Full => "Order,SITE_ID,CAID,OAID,Quantity",
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header.to_string());

    for row in rows
    {
        let line = match shape
        {
            RowShape::Simple => format!("{},{},{}", row.order, row.site_id, row.caid),
            RowShape::Full => format!(
                "{},{},{},{},{}",
                row.order,
                row.site_id,
                row.caid,
                row.oaid
                    .as_deref()
                    .unwrap_or(""),
                quantity_text(row)
            ),
        };
        lines.push(line);
    }

    lines.join("\n")
}

/// Tab-separated rows without header; also the clipboard payload.
pub fn to_text(rows: &[FinalRow]) -> String
{
    let shape = RowShape::detect(rows);

    rows.iter()
        .map(|row| match shape
        {
            RowShape::Simple => format!("{}\t{}", row.site_id, row.caid),
            RowShape::Full => format!(
                "{}\t{}\t{}\t{}",
                row.site_id,
                row.caid,
                row.oaid
                    .as_deref()
                    .unwrap_or(""),
                quantity_text(row)
            ),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Workbook bytes: one sheet, `CAID, OAID, Quantity`.
///
/// Site id and order are intentionally left out of this layout.
pub fn to_xlsx(rows: &[FinalRow]) -> Result<Vec<u8>>
{
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet
        .set_name("Results")
        .context("Failed to name worksheet")?;

    for (col, title) in ["CAID", "OAID", "Quantity"]
        .iter()
        .enumerate()
    {
        sheet
            .write_string_with_format(0, col as u16, *title, &bold)
            .context("Failed to write header")?;
    }

    for (idx, row) in rows
        .iter()
        .enumerate()
    {
        let r = u32::try_from(idx + 1).context("Too many rows for a worksheet")?;

        sheet
            .write_string(r, 0, row.caid.as_str())
            .context("Failed to write CAID cell")?;
        if let Some(oaid) = &row.oaid
        {
            sheet
                .write_string(r, 1, oaid.as_str())
                .context("Failed to write OAID cell")?;
        }
        if let Some(q) = row.quantity
        {
            sheet
                .write_number(r, 2, q.get())
                .context("Failed to write quantity cell")?;
        }
    }

    workbook
        .save_to_buffer()
        .context("Failed to encode workbook")
}

/// Encode rows in `format`.
pub fn render(
    rows: &[FinalRow],
    format: ExportFormat,
) -> Result<Vec<u8>>
{
    Ok(match format
    {
        ExportFormat::Csv => to_csv(rows).into_bytes(),
        ExportFormat::Txt => to_text(rows).into_bytes(),
        ExportFormat::Xlsx => to_xlsx(rows)?,
    })
}

/// Render and write `rows` to `path` atomically.
///
/// The bytes land in a temp file beside `path` and are renamed into place,
/// so a failure never leaves a partial export behind.
#[instrument(level = "debug", skip(rows), fields(rows = rows.len()))]
pub fn write_export(
    rows: &[FinalRow],
    format: ExportFormat,
    path: &Path,
) -> Result<usize>
{
    let bytes = render(rows, format)?;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(&bytes)
        .context("Failed to write export")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write to {}", path.display()))?;

    debug!(bytes = bytes.len(), "export written");
    Ok(bytes.len())
}

/// Put the plain-text export on the system clipboard.
pub fn copy_to_clipboard(rows: &[FinalRow]) -> Result<()>
{
    use arboard::Clipboard;

    let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;

    clipboard
        .set_text(to_text(rows))
        .context("Failed to copy to clipboard")?;

    Ok(())
}
