//! OAID catalog: region index, description search and disambiguation.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::error::{WorkflowError, WorkflowResult};

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry
{
    pub oaid: String,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_alias: Option<String>,
    pub long_description: String,
}

/// Row counters from a table load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats
{
    pub rows: usize,
    pub loaded: usize,
    pub dropped: usize,
}

/// Read-only catalog indexed by region.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex
{
    entries: Vec<CatalogEntry>,
    // region -> positions in `entries`, ascending
    by_region: IndexMap<String, Vec<usize>>,
}

/// Recognized catalog columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column
{
    Oaid,
    Description,
    Region,
    RegionAlias,
}

impl Column
{
    /// Match a header cell, ignoring case, spaces and underscores.
    fn from_header(cell: &str) -> Option<Self>
    {
        let key: String = cell
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str()
        {
            "oaid" => Some(Self::Oaid),
            "longdescription" => Some(Self::Description),
            "region" | "reg" => Some(Self::Region),
            "regalias" | "regionalias" => Some(Self::RegionAlias),
            _ => None,
        }
    }
}

impl CatalogIndex
{
    /// Build the index from already-typed entries.
    pub fn load(entries: Vec<CatalogEntry>) -> Self
    {
        let mut by_region: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (pos, entry) in entries
            .iter()
            .enumerate()
        {
            by_region
                .entry(entry.region.clone())
                .or_default()
                .push(pos);
        }

        debug!(entries = entries.len(), regions = by_region.len(), "catalog indexed");
        Self { entries, by_region }
    }

    /// Build from a header row and data rows.
    ///
    /// Rows missing an OAID, description or region are dropped. When the
    /// table has no `Region`/`REG` column the `REG Alias` column stands in.
    pub fn from_table(
        header: &[String],
        rows: &[Vec<String>],
    ) -> WorkflowResult<(Self, CatalogStats)>
    {
        let mut columns: IndexMap<usize, Column> = IndexMap::new();
        for (idx, cell) in header
            .iter()
            .enumerate()
        {
            if let Some(col) = Column::from_header(cell)
            {
                // First matching column wins when aliases repeat
                if !columns
                    .values()
                    .any(|c| *c == col)
                {
                    columns.insert(idx, col);
                }
            }
        }

        let find = |wanted: Column| {
            columns
                .iter()
                .find(|(_, c)| **c == wanted)
                .map(|(idx, _)| *idx)
        };

        let oaid_col = find(Column::Oaid)
            .ok_or_else(|| WorkflowError::parse("catalog", "missing OAID column"))?;
        let desc_col = find(Column::Description)
            .ok_or_else(|| WorkflowError::parse("catalog", "missing Long Description column"))?;
        let alias_col = find(Column::RegionAlias);
        let region_col = find(Column::Region)
            .or(alias_col)
            .ok_or_else(|| WorkflowError::parse("catalog", "missing Region column"))?;

        let cell = |row: &Vec<String>, idx: usize| -> String {
            row.get(idx)
                .map(|s| {
                    s.trim()
                        .to_string()
                })
                .unwrap_or_default()
        };

        let mut stats = CatalogStats::default();
        let mut entries = Vec::with_capacity(rows.len());

        for row in rows
        {
            stats.rows += 1;

            let oaid = cell(row, oaid_col);
            let long_description = cell(row, desc_col);
            let region = cell(row, region_col);

            if oaid.is_empty() || long_description.is_empty() || region.is_empty()
            {
                stats.dropped += 1;
                continue;
            }

            let region_alias = alias_col
                .filter(|idx| *idx != region_col)
                .map(|idx| cell(row, idx))
                .filter(|s| !s.is_empty());

            entries.push(CatalogEntry { oaid, region, region_alias, long_description });
        }

        stats.loaded = entries.len();
        Ok((Self::load(entries), stats))
    }

    pub fn len(&self) -> usize
    {
        self.entries
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.entries
            .is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry]
    {
        &self.entries
    }

    /// Distinct regions in first-seen order.
    pub fn regions(&self) -> impl Iterator<Item = &str>
    {
        self.by_region
            .keys()
            .map(String::as_str)
    }

    /// Entries in any of `regions` whose description contains `text`,
    /// ignoring case. Blank `text` matches nothing.
    #[instrument(level = "debug", skip(self))]
    pub fn search(
        &self,
        regions: &IndexSet<String>,
        text: &str,
    ) -> Vec<&CatalogEntry>
    {
        let needle = text
            .trim()
            .to_lowercase();
        if needle.is_empty()
        {
            return Vec::new();
        }

        // Gather candidate positions from the region index, then restore
        // catalog order across regions
        let mut positions: Vec<usize> = regions
            .iter()
            .filter_map(|r| self.by_region.get(r))
            .flatten()
            .copied()
            .collect();
        positions.sort_unstable();

        let hits: Vec<&CatalogEntry> = positions
            .into_iter()
            .map(|pos| &self.entries[pos])
            .filter(|e| {
                e.long_description
                    .to_lowercase()
                    .contains(&needle)
            })
            .collect();

        debug!(hits = hits.len(), "catalog search");
        hits
    }
}

/// Outcome of applying the disambiguation policy to a search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution
{
    /// Exactly one entry, either the only hit or the explicit pick
    Selected(CatalogEntry),
    /// Nothing matched; the search text must be revised
    NoMatch,
    /// Several hits and no valid pick
    Ambiguous(Vec<CatalogEntry>),
}

impl Resolution
{
    /// Resolve `hits`, using `pick` (an OAID) to choose among several.
    ///
    /// A pick that is not among the hits is a lookup miss.
    pub fn resolve(
        hits: &[&CatalogEntry],
        pick: Option<&str>,
    ) -> WorkflowResult<Self>
    {
        if let Some(oaid) = pick
        {
            if hits.is_empty()
            {
                return Ok(Self::NoMatch);
            }

            return hits
                .iter()
                .find(|e| e.oaid == oaid)
                .map(|e| Self::Selected((*e).clone()))
                .ok_or_else(|| WorkflowError::not_found("OAID among search results", oaid));
        }

        Ok(match hits
        {
            [] => Self::NoMatch,
            [only] => Self::Selected((*only).clone()),
            many => Self::Ambiguous(
                many.iter()
                    .map(|e| (*e).clone())
                    .collect(),
            ),
        })
    }

    /// Collapse into the selected entry or the matching error.
    pub fn into_selected(
        self,
        description: &str,
    ) -> WorkflowResult<CatalogEntry>
    {
        match self
        {
            Self::Selected(entry) => Ok(entry),
            Self::NoMatch => Err(WorkflowError::not_found("catalog entry", description)),
            Self::Ambiguous(list) => Err(WorkflowError::Ambiguous {
                description: description.to_string(),
                candidates: list.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn entry(
        oaid: &str,
        region: &str,
        desc: &str,
    ) -> CatalogEntry
    {
        CatalogEntry {
            oaid: oaid.into(),
            region: region.into(),
            region_alias: None,
            long_description: desc.into(),
        }
    }

    fn sample() -> CatalogIndex
    {
        CatalogIndex::load(vec![
            entry("OA-1", "JAKARTA", "AC SPLIT 1 PK"),
            entry("OA-2", "BANDUNG", "AC SPLIT 1 PK"),
            entry("OA-3", "JAKARTA", "Installasi Antenna RF"),
            entry("OA-4", "SURABAYA", "ac split 2 pk"),
            entry("OA-5", "JAKARTA", "AC Split 2 PK"),
        ])
    }

    fn regions(names: &[&str]) -> IndexSet<String>
    {
        names
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn search_is_case_insensitive_and_region_scoped()
    {
        let idx = sample();
        let hits = idx.search(&regions(&["JAKARTA"]), "ac split");
        let oaids: Vec<&str> = hits
            .iter()
            .map(|e| e.oaid.as_str())
            .collect();
        assert_eq!(oaids, vec!["OA-1", "OA-5"]);

        // Repeated calls give the same ordered list
        assert_eq!(idx.search(&regions(&["JAKARTA"]), "ac split"), hits);
    }

    #[test]
    fn search_keeps_catalog_order_across_regions()
    {
        let idx = sample();
        let hits = idx.search(&regions(&["SURABAYA", "JAKARTA"]), "split");
        let oaids: Vec<&str> = hits
            .iter()
            .map(|e| e.oaid.as_str())
            .collect();
        assert_eq!(oaids, vec!["OA-1", "OA-4", "OA-5"]);
    }

    #[test]
    fn blank_search_text_matches_nothing()
    {
        let idx = sample();
        assert!(
            idx.search(&regions(&["JAKARTA"]), "   ")
                .is_empty()
        );
    }

    #[test]
    fn regions_are_listed_in_first_seen_order()
    {
        let idx = sample();
        assert_eq!(idx.regions().collect::<Vec<_>>(), vec!["JAKARTA", "BANDUNG", "SURABAYA"]);
    }

    #[test]
    fn single_hit_is_auto_selected()
    {
        let idx = sample();
        let hits = idx.search(&regions(&["JAKARTA"]), "antenna");
        let res = Resolution::resolve(&hits, None).unwrap();
        assert!(matches!(res, Resolution::Selected(ref e) if e.oaid == "OA-3"));
    }

    #[test]
    fn several_hits_need_a_pick()
    {
        let idx = sample();
        let hits = idx.search(&regions(&["JAKARTA"]), "ac split");

        let res = Resolution::resolve(&hits, None).unwrap();
        assert!(matches!(res, Resolution::Ambiguous(ref l) if l.len() == 2));
        assert!(matches!(
            res.into_selected("ac split"),
            Err(WorkflowError::Ambiguous { candidates: 2, .. })
        ));

        let res = Resolution::resolve(&hits, Some("OA-5")).unwrap();
        assert_eq!(
            res.into_selected("ac split")
                .unwrap()
                .oaid,
            "OA-5"
        );

        assert!(Resolution::resolve(&hits, Some("OA-2")).is_err());
    }

    #[test]
    fn no_hits_is_no_match()
    {
        let res = Resolution::resolve(&[], None).unwrap();
        assert_eq!(res, Resolution::NoMatch);
        assert!(matches!(res.into_selected("x"), Err(WorkflowError::NotFound { .. })));
    }

    #[test]
    fn table_load_recognizes_aliases_and_drops_incomplete_rows()
    {
        let header: Vec<String> = ["oaid", "LONG DESCRIPTION", "REG", "REG Alias"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows: Vec<Vec<String>> = vec![
            vec!["OA-1".into(), "AC SPLIT 1 PK".into(), "JAKARTA".into(), "JKT".into()],
            vec!["OA-2".into(), "".into(), "JAKARTA".into(), "".into()],
            vec!["OA-3".into(), "Antenna".into()],
        ];

        let (idx, stats) = CatalogIndex::from_table(&header, &rows).unwrap();
        assert_eq!(stats, CatalogStats { rows: 3, loaded: 1, dropped: 2 });
        assert_eq!(idx.entries()[0].region_alias.as_deref(), Some("JKT"));
    }

    #[test]
    fn region_alias_stands_in_for_missing_region_column()
    {
        let header: Vec<String> = ["OAID", "Long Description", "REG Alias"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows: Vec<Vec<String>> = vec![vec!["OA-1".into(), "AC".into(), "JKT".into()]];

        let (idx, _) = CatalogIndex::from_table(&header, &rows).unwrap();
        assert_eq!(idx.entries()[0].region, "JKT");
        assert_eq!(idx.entries()[0].region_alias, None);
    }

    #[test]
    fn table_without_oaid_column_is_a_parse_failure()
    {
        let header = vec!["Region".to_string(), "Long Description".to_string()];
        assert!(matches!(
            CatalogIndex::from_table(&header, &[]),
            Err(WorkflowError::Parse { .. })
        ));
    }
}
