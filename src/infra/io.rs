use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calamine::{Reader, open_workbook_auto};
use memmap2::Mmap;
use tracing::debug;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// Spreadsheet extensions handed to calamine
const SHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// File text, either mapped or read into memory. UTF-8 is checked once at
/// load time.
pub enum FileContent
{
    Mapped(Mmap),
    Buffered(String),
}

impl AsRef<str> for FileContent
{
    fn as_ref(&self) -> &str
    {
        match self
        {
            FileContent::Mapped(mmap) => std::str::from_utf8(mmap).unwrap_or_default(),
            FileContent::Buffered(s) => s.as_str(),
        }
    }
}

pub fn read_file_smart<P: AsRef<Path>>(path: P) -> Result<FileContent>
{
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

    if metadata.len() > MMAP_THRESHOLD
    {
        let file =
            File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?;

        // Safety: read-only mapping of a file we do not modify
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to memory-map {}", path.display()))?;

        std::str::from_utf8(&mmap)
            .with_context(|| format!("{} is not valid UTF-8 text", path.display()))?;

        Ok(FileContent::Mapped(mmap))
    }
    else
    {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;

        Ok(FileContent::Buffered(content))
    }
}

/// `~` and `$VAR` expansion for user-supplied paths.
pub fn expand_path(raw: &str) -> PathBuf
{
    let expanded = shellexpand::full(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| {
            shellexpand::tilde(raw)
                .into_owned()
        });
    PathBuf::from(expanded)
}

pub fn is_spreadsheet(path: &Path) -> bool
{
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SHEET_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// Read a table from a spreadsheet (first sheet) or delimited text.
///
/// Text tables split on tabs when the first non-blank line has one, on
/// commas otherwise. Blank lines are dropped; cells are trimmed.
pub fn read_table(path: &Path) -> Result<Vec<Vec<String>>>
{
    let rows = if is_spreadsheet(path)
    {
        read_sheet(path)?
    }
    else
    {
        let content = read_file_smart(path)?;
        split_table(content.as_ref())
    };

    debug!(path = %path.display(), rows = rows.len(), "table loaded");
    Ok(rows)
}

fn read_sheet(path: &Path) -> Result<Vec<Vec<String>>>
{
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .with_context(|| format!("Workbook {} has no sheets", path.display()))?
        .with_context(|| format!("Failed to read first sheet of {}", path.display()))?;

    Ok(range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| {
                    cell.to_string()
                        .trim()
                        .to_string()
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| row.iter().any(|c| !c.is_empty()))
        .collect())
}

pub fn split_table(text: &str) -> Vec<Vec<String>>
{
    let delimiter = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .map_or(',', |l| if l.contains('\t') { '\t' } else { ',' });

    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            l.split(delimiter)
                .map(|c| {
                    c.trim()
                        .to_string()
                })
                .collect()
        })
        .collect()
}

/// Whole text file as an owned string.
pub fn read_text(path: &Path) -> Result<String>
{
    let content = read_file_smart(path)?;
    Ok(content
        .as_ref()
        .to_string())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn split_table_picks_delimiter_from_first_line()
    {
        let rows = split_table("\nOAID\tRegion\nOA-1\tJAKARTA\n\n");
        assert_eq!(rows, vec![vec!["OAID", "Region"], vec!["OA-1", "JAKARTA"]]);

        let rows = split_table("OAID, Region\nOA-1 ,JAKARTA");
        assert_eq!(rows[1], vec!["OA-1", "JAKARTA"]);
    }

    #[test]
    fn spreadsheet_detection_ignores_case()
    {
        assert!(is_spreadsheet(Path::new("catalog.XLSX")));
        assert!(is_spreadsheet(Path::new("catalog.ods")));
        assert!(!is_spreadsheet(Path::new("catalog.csv")));
        assert!(!is_spreadsheet(Path::new("catalog")));
    }

    #[test]
    fn small_files_are_buffered()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir
            .path()
            .join("sites.txt");
        std::fs::write(&path, "S1\nS2").unwrap();

        let content = read_file_smart(&path).unwrap();
        assert!(matches!(content, FileContent::Buffered(_)));
        assert_eq!(content.as_ref(), "S1\nS2");
    }

    #[test]
    fn invalid_utf8_is_an_error()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir
            .path()
            .join("bad.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(read_file_smart(&path).is_err());
    }

    #[test]
    fn plain_paths_pass_through_expansion()
    {
        let p = expand_path("plain/path.xlsx");
        assert_eq!(p, PathBuf::from("plain/path.xlsx"));
    }
}
