//! One operator session: the current snapshot of every collection.
//!
//! Each `load_*` method parses into a fresh value and swaps it in only on
//! success, so readers never see a half-replaced collection. Replacing an
//! upstream collection recomputes the match and resets block assignment,
//! since block membership is keyed by matched CAIDs.

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{info, warn};

use crate::core::catalog::CatalogIndex;
use crate::core::error::{WorkflowError, WorkflowResult};
use crate::core::expand::{self, ExpandOutcome};
use crate::core::input::{self, CaidPair, SiteRecord};
use crate::core::matcher::{self, MatchOutcome};
use crate::core::pattern::block::AssignmentSummary;
use crate::core::pattern::{BlockAssignment, BlockDraft, BlockId, ResolvedPattern, TemplateRegistry};

/// Aggregate counters for the summary view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary
{
    pub sites: usize,
    pub pairs: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub catalog_entries: usize,
    pub templates: usize,
    pub blocks: usize,
    pub assigned: usize,
    pub unassigned: usize,
}

/// In-memory working set.
#[derive(Debug, Clone, Default)]
pub struct Session
{
    sites: Vec<SiteRecord>,
    pairs: Vec<CaidPair>,
    matched: MatchOutcome,
    catalog: CatalogIndex,
    regions: IndexSet<String>,
    templates: TemplateRegistry,
    blocks: BlockAssignment,
}

impl Session
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn sites(&self) -> &[SiteRecord]
    {
        &self.sites
    }

    pub fn pairs(&self) -> &[CaidPair]
    {
        &self.pairs
    }

    pub fn matched(&self) -> &MatchOutcome
    {
        &self.matched
    }

    pub fn catalog(&self) -> &CatalogIndex
    {
        &self.catalog
    }

    pub fn regions(&self) -> &IndexSet<String>
    {
        &self.regions
    }

    pub fn templates(&self) -> &TemplateRegistry
    {
        &self.templates
    }

    /// Templates are edited in place by id.
    pub fn templates_mut(&mut self) -> &mut TemplateRegistry
    {
        &mut self.templates
    }

    pub fn blocks(&self) -> &BlockAssignment
    {
        &self.blocks
    }

    /// Replace the site list from pasted text.
    pub fn load_sites(
        &mut self,
        text: &str,
    ) -> WorkflowResult<usize>
    {
        let sites = input::parse_site_ids(text);
        if sites.is_empty()
        {
            return Err(WorkflowError::incomplete("enter at least one SITE ID"));
        }

        self.sites = sites;
        self.rematch();
        Ok(self
            .sites
            .len())
    }

    /// Replace the CAID table.
    pub fn load_pairs(
        &mut self,
        pairs: Vec<CaidPair>,
    ) -> WorkflowResult<usize>
    {
        if pairs.is_empty()
        {
            return Err(WorkflowError::incomplete("enter CAID data as SITE_ID,CAID lines"));
        }

        self.pairs = pairs;
        self.rematch();
        Ok(self
            .pairs
            .len())
    }

    /// Replace the catalog; the region selection is narrowed to regions the
    /// new catalog still has.
    pub fn load_catalog(
        &mut self,
        catalog: CatalogIndex,
    ) -> WorkflowResult<usize>
    {
        if catalog.is_empty()
        {
            return Err(WorkflowError::incomplete("upload OAID catalog data first"));
        }

        let known: IndexSet<&str> = catalog
            .regions()
            .collect();
        self.regions
            .retain(|r| known.contains(r.as_str()));

        self.catalog = catalog;
        Ok(self
            .catalog
            .len())
    }

    /// Set the global region filter used by catalog searches.
    pub fn select_regions<I, S>(
        &mut self,
        regions: I,
    ) -> WorkflowResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let picked: IndexSet<String> = regions
            .into_iter()
            .map(|r| {
                r.as_ref()
                    .trim()
                    .to_string()
            })
            .filter(|r| !r.is_empty())
            .collect();

        if picked.is_empty()
        {
            return Err(WorkflowError::incomplete("select at least one region"));
        }

        if let Some(unknown) = picked
            .iter()
            .find(|r| {
                !self
                    .catalog
                    .regions()
                    .any(|k| k == r.as_str())
            })
        {
            return Err(WorkflowError::not_found("region", unknown.as_str()));
        }

        self.regions = picked;
        Ok(())
    }

    /// CAIDs still free for a new block.
    pub fn available_caids(&self) -> Vec<String>
    {
        self.blocks
            .available(&self.matched)
    }

    pub fn create_block(
        &mut self,
        draft: BlockDraft,
    ) -> WorkflowResult<BlockId>
    {
        self.blocks
            .create_block(draft, &self.matched, &self.templates)
    }

    pub fn delete_block(
        &mut self,
        id: &BlockId,
    ) -> WorkflowResult<()>
    {
        self.blocks
            .delete_block(id)
            .map(|_| ())
    }

    /// Freeze the current blocks and templates for expansion.
    ///
    /// Requires at least one block.
    pub fn block_pattern(&self) -> WorkflowResult<ResolvedPattern>
    {
        if self
            .blocks
            .is_empty()
        {
            return Err(WorkflowError::incomplete("create at least one CAID block first"));
        }

        let summary = self.assignment_summary();
        if summary.unassigned > 0
        {
            warn!(unassigned = summary.unassigned, "some CAIDs are not assigned to any block");
        }

        Ok(ResolvedPattern::Blocks {
            assignment: self
                .blocks
                .clone(),
            templates: self
                .templates
                .clone(),
        })
    }

    pub fn assignment_summary(&self) -> AssignmentSummary
    {
        self.blocks
            .summary(&self.matched)
    }

    /// Expand the matched records with `pattern`.
    pub fn expand(
        &self,
        pattern: &ResolvedPattern,
    ) -> WorkflowResult<ExpandOutcome>
    {
        if self
            .matched
            .records
            .is_empty()
        {
            return Err(WorkflowError::incomplete("no matched SITE ID / CAID records"));
        }

        Ok(expand::expand(&self.matched.records, pattern))
    }

    pub fn summary(&self) -> SessionSummary
    {
        let blocks = self.assignment_summary();
        SessionSummary {
            sites: self.sites.len(),
            pairs: self.pairs.len(),
            matched: self.matched.records.len(),
            unmatched: self.matched.unmatched,
            catalog_entries: self.catalog.len(),
            templates: self.templates.len(),
            blocks: blocks.blocks,
            assigned: blocks.assigned,
            unassigned: blocks.unassigned,
        }
    }

    fn rematch(&mut self)
    {
        self.matched = matcher::match_sites(&self.sites, &self.pairs);

        if !self
            .blocks
            .is_empty()
        {
            info!(blocks = self.blocks.len(), "upstream data replaced; clearing CAID blocks");
        }
        self.blocks = BlockAssignment::new();
    }
}
