//! Input normalization for pasted or uploaded site lists and CAID tables.
//!
//! Both parsers are total: malformed lines are skipped, never reported
//! individually. The aggregate counts in [`NormalizeStats`] are the only
//! visibility into what was dropped.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One site identifier with its 1-based rank in the input list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteRecord
{
    pub site_id: String,
    /// Rank among non-blank input lines, starting at 1
    pub order: usize,
}

/// One row of the site → CAID correspondence table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaidPair
{
    pub site_id: String,
    pub caid: String,
}

/// Line counters for a single normalization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats
{
    /// Non-blank lines seen
    pub lines: usize,
    /// Lines that produced a record
    pub accepted: usize,
    /// Non-blank lines dropped
    pub skipped: usize,
}

/// Iterate trimmed, non-blank lines. Handles both LF and CRLF.
fn content_lines(text: &str) -> impl Iterator<Item = &str>
{
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Parse an ordered site list, one identifier per line.
///
/// Blank lines are ignored and do not consume an order slot.
pub fn parse_site_ids(text: &str) -> Vec<SiteRecord>
{
    let sites: Vec<SiteRecord> = content_lines(text)
        .enumerate()
        .map(|(idx, line)| SiteRecord { site_id: line.to_string(), order: idx + 1 })
        .collect();

    debug!(count = sites.len(), "parsed site list");
    sites
}

/// Parse `SITE_ID,CAID` lines (comma or tab separated).
///
/// A line is accepted when its first two fields are non-empty after
/// trimming; extra fields are ignored.
pub fn parse_caid_pairs(text: &str) -> Vec<CaidPair>
{
    parse_caid_pairs_with_stats(text).0
}

/// Same as [`parse_caid_pairs`] but also reports skipped-line counts.
pub fn parse_caid_pairs_with_stats(text: &str) -> (Vec<CaidPair>, NormalizeStats)
{
    let mut stats = NormalizeStats::default();
    let mut pairs = Vec::new();

    for line in content_lines(text)
    {
        stats.lines += 1;

        let mut fields = line
            .split([',', '\t'])
            .map(str::trim);

        match pair_from_fields(fields.next(), fields.next())
        {
            Some(pair) => pairs.push(pair),
            None => stats.skipped += 1,
        }
    }

    stats.accepted = pairs.len();
    debug!(accepted = stats.accepted, skipped = stats.skipped, "parsed CAID table");

    (pairs, stats)
}

/// Apply the CAID line rule to already-split spreadsheet rows.
pub fn parse_caid_rows(rows: &[Vec<String>]) -> (Vec<CaidPair>, NormalizeStats)
{
    let mut stats = NormalizeStats::default();
    let mut pairs = Vec::new();

    for row in rows
    {
        if row
            .iter()
            .all(|cell| cell.trim().is_empty())
        {
            continue;
        }

        stats.lines += 1;

        let site = row
            .first()
            .map(|s| s.trim());
        let caid = row
            .get(1)
            .map(|s| s.trim());

        match pair_from_fields(site, caid)
        {
            Some(pair) => pairs.push(pair),
            None => stats.skipped += 1,
        }
    }

    stats.accepted = pairs.len();
    debug!(accepted = stats.accepted, skipped = stats.skipped, "parsed CAID rows");

    (pairs, stats)
}

fn pair_from_fields(
    site: Option<&str>,
    caid: Option<&str>,
) -> Option<CaidPair>
{
    match (site, caid)
    {
        (Some(site), Some(caid)) if !site.is_empty() && !caid.is_empty() =>
        {
            Some(CaidPair { site_id: site.to_string(), caid: caid.to_string() })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn site_ids_skip_blank_lines_without_consuming_order()
    {
        let sites = parse_site_ids("  S1 \n\n\r\nS2\r\n   \nS3");
        let got: Vec<(&str, usize)> = sites
            .iter()
            .map(|s| (s.site_id.as_str(), s.order))
            .collect();
        assert_eq!(got, vec![("S1", 1), ("S2", 2), ("S3", 3)]);
    }

    #[test]
    fn empty_site_input_yields_nothing()
    {
        assert!(parse_site_ids("").is_empty());
        assert!(parse_site_ids(" \n \n").is_empty());
    }

    #[test]
    fn caid_pairs_accept_comma_and_tab()
    {
        let pairs = parse_caid_pairs("S1,C1\nS2\tC2\nS3 , C3 , extra");
        assert_eq!(
            pairs,
            vec![
                CaidPair { site_id: "S1".into(), caid: "C1".into() },
                CaidPair { site_id: "S2".into(), caid: "C2".into() },
                CaidPair { site_id: "S3".into(), caid: "C3".into() },
            ]
        );
    }

    #[test]
    fn short_or_hollow_lines_are_counted_as_skipped()
    {
        let (pairs, stats) = parse_caid_pairs_with_stats("S1\nS2,\n,C3\nS4,C4\n\n");
        assert_eq!(pairs.len(), 1);
        assert_eq!(stats, NormalizeStats { lines: 4, accepted: 1, skipped: 3 });
    }

    #[test]
    fn spreadsheet_rows_follow_the_line_rule()
    {
        let rows = vec![
            vec!["S1".to_string(), "C1".to_string(), "x".to_string()],
            vec![String::new(), String::new()],
            vec!["S2".to_string()],
        ];
        let (pairs, stats) = parse_caid_rows(&rows);
        assert_eq!(pairs, vec![CaidPair { site_id: "S1".into(), caid: "C1".into() }]);
        assert_eq!(stats.lines, 2);
        assert_eq!(stats.skipped, 1);
    }
}
