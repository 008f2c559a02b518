//! Expansion of matched records into final export rows.
//!
//! Row order is always matched-record order with pattern items nested in
//! definition order. Nothing here sorts.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::matcher::MatchedRecord;
use crate::core::pattern::{
    BlockAssignment, DuplicationCount, OaidPatternItem, Quantity, ResolvedPattern,
    TemplateRegistry,
};

/// One exported row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalRow
{
    pub site_id: String,
    pub caid: String,
    pub order: usize,
    /// Absent in the duplication-only workflow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oaid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Quantity>,
}

impl FinalRow
{
    /// Identity-only row.
    pub fn plain(record: &MatchedRecord) -> Self
    {
        Self {
            site_id: record
                .site_id
                .clone(),
            caid: record
                .caid
                .clone(),
            order: record.order,
            oaid: None,
            long_description: None,
            quantity: None,
        }
    }

    /// Identity fields plus one pattern item.
    pub fn with_item(
        record: &MatchedRecord,
        item: &OaidPatternItem,
    ) -> Self
    {
        Self {
            oaid: Some(
                item.oaid
                    .clone(),
            ),
            long_description: item
                .long_description
                .clone(),
            quantity: Some(item.quantity),
            ..Self::plain(record)
        }
    }
}

/// Expanded rows and the count of records no block claimed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpandOutcome
{
    pub rows: Vec<FinalRow>,
    /// Only non-zero for block-scoped expansion
    pub unassigned: usize,
}

/// Every record crossed with every pattern item.
pub fn expand_uniform(
    matched: &[MatchedRecord],
    pattern: &[OaidPatternItem],
) -> Vec<FinalRow>
{
    matched
        .iter()
        .cartesian_product(pattern.iter())
        .map(|(record, item)| FinalRow::with_item(record, item))
        .collect()
}

/// Each record repeated `count` times, no OAID fields.
pub fn expand_duplicates(
    matched: &[MatchedRecord],
    count: DuplicationCount,
) -> Vec<FinalRow>
{
    matched
        .iter()
        .flat_map(|record| std::iter::repeat_n(FinalRow::plain(record), count.get()))
        .collect()
}

/// Each record expanded with the pattern of the block owning its CAID.
///
/// Records whose CAID is in no block contribute nothing and are only
/// counted.
pub fn expand_blocks(
    matched: &[MatchedRecord],
    assignment: &BlockAssignment,
    templates: &TemplateRegistry,
) -> ExpandOutcome
{
    let mut outcome = ExpandOutcome::default();

    for record in matched
    {
        let Some(block) = assignment.block_for(&record.caid)
        else
        {
            outcome.unassigned += 1;
            continue;
        };

        outcome
            .rows
            .extend(
                block
                    .source
                    .items(templates)
                    .iter()
                    .map(|item| FinalRow::with_item(record, item)),
            );
    }

    outcome
}

/// Expand with whichever strategy produced `pattern`.
#[instrument(level = "debug", skip_all, fields(strategy = pattern.strategy_name(), matched = matched.len()))]
pub fn expand(
    matched: &[MatchedRecord],
    pattern: &ResolvedPattern,
) -> ExpandOutcome
{
    let outcome = match pattern
    {
        ResolvedPattern::Uniform(items) => ExpandOutcome {
            rows: expand_uniform(matched, items),
            unassigned: 0,
        },
        ResolvedPattern::Duplicate(count) => ExpandOutcome {
            rows: expand_duplicates(matched, *count),
            unassigned: 0,
        },
        ResolvedPattern::Blocks { assignment, templates } =>
        {
            expand_blocks(matched, assignment, templates)
        }
    };

    debug!(rows = outcome.rows.len(), unassigned = outcome.unassigned, "expansion complete");
    outcome
}
