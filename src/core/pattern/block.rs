//! CAID blocks and the CAID → block ownership map.
//!
//! Ownership is exclusive: a CAID belongs to at most one block, enforced
//! when the block is created. Lookups at expansion time therefore never
//! have to break ties between blocks.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{OaidPatternItem, TemplateId, TemplateRegistry};
use crate::core::error::{WorkflowError, WorkflowResult};
use crate::core::matcher::MatchOutcome;

/// Stable block identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId
{
    pub fn as_str(&self) -> &str
    {
        &self.0
    }
}

impl fmt::Display for BlockId
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(&self.0)
    }
}

/// What a block emits for each of its CAIDs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockSource
{
    /// Pattern items owned by the block itself
    Pattern(Vec<OaidPatternItem>),
    /// Template ids, resolved against the registry at expansion
    Templates(Vec<TemplateId>),
}

impl BlockSource
{
    fn is_empty(&self) -> bool
    {
        match self
        {
            Self::Pattern(items) => items.is_empty(),
            Self::Templates(ids) => ids.is_empty(),
        }
    }

    /// Items in stored order. Template ids missing from `templates` are
    /// skipped.
    pub fn items(
        &self,
        templates: &TemplateRegistry,
    ) -> Vec<OaidPatternItem>
    {
        match self
        {
            Self::Pattern(items) => items.clone(),
            Self::Templates(ids) => ids
                .iter()
                .filter_map(|id| templates.get(id))
                .map(|t| t.to_item())
                .collect(),
        }
    }
}

/// A named group of CAIDs sharing one pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaidBlock
{
    pub id: BlockId,
    pub name: String,
    pub caids: Vec<String>,
    pub source: BlockSource,
}

/// Unvalidated block input.
#[derive(Debug, Clone)]
pub struct BlockDraft
{
    pub name: String,
    pub caids: Vec<String>,
    pub source: BlockSource,
}

/// Assigned/unassigned tallies over the matched records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentSummary
{
    pub blocks: usize,
    pub assigned: usize,
    pub unassigned: usize,
}

/// Blocks in creation order plus the exclusive ownership map.
#[derive(Debug, Clone, Default)]
pub struct BlockAssignment
{
    blocks: IndexMap<BlockId, CaidBlock>,
    owner: IndexMap<String, BlockId>,
    next_seq: u64,
}

impl BlockAssignment
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn len(&self) -> usize
    {
        self.blocks
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.blocks
            .is_empty()
    }

    /// Blocks in creation order.
    pub fn blocks(&self) -> impl Iterator<Item = &CaidBlock>
    {
        self.blocks
            .values()
    }

    pub fn get(
        &self,
        id: &BlockId,
    ) -> Option<&CaidBlock>
    {
        self.blocks
            .get(id)
    }

    /// The block that owns `caid`, if any.
    pub fn block_for(
        &self,
        caid: &str,
    ) -> Option<&CaidBlock>
    {
        self.owner
            .get(caid)
            .and_then(|id| self.blocks.get(id))
    }

    /// Matched CAIDs not yet owned by a block, in record order, each once.
    pub fn available(
        &self,
        matched: &MatchOutcome,
    ) -> Vec<String>
    {
        let pool: IndexSet<&str> = matched
            .caids()
            .filter(|c| !self.owner.contains_key(*c))
            .collect();

        pool.into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Validate and store a block.
    ///
    /// Requires a name, at least one CAID and a non-empty source. Every
    /// CAID must be a matched CAID not owned by another block, and every
    /// template id must exist. Nothing is stored unless all checks pass.
    pub fn create_block(
        &mut self,
        draft: BlockDraft,
        matched: &MatchOutcome,
        templates: &TemplateRegistry,
    ) -> WorkflowResult<BlockId>
    {
        let name = draft
            .name
            .trim();
        if name.is_empty()
        {
            return Err(WorkflowError::incomplete("block name is required"));
        }

        let caids: IndexSet<String> = draft
            .caids
            .iter()
            .map(|c| {
                c.trim()
                    .to_string()
            })
            .filter(|c| !c.is_empty())
            .collect();
        if caids.is_empty()
        {
            return Err(WorkflowError::incomplete("select at least one CAID for the block"));
        }

        if draft
            .source
            .is_empty()
        {
            return Err(WorkflowError::incomplete(
                "select at least one OAID template or pattern item for the block",
            ));
        }

        if let BlockSource::Templates(ids) = &draft.source
        {
            if let Some(missing) = ids
                .iter()
                .find(|id| !templates.contains(id))
            {
                return Err(WorkflowError::not_found("template", missing.as_str()));
            }
        }

        let known: IndexSet<&str> = matched
            .caids()
            .collect();
        for caid in &caids
        {
            if let Some(owner) = self
                .owner
                .get(caid)
            {
                return Err(WorkflowError::AlreadyAssigned {
                    caid: caid.clone(),
                    block: self.blocks[owner]
                        .name
                        .clone(),
                });
            }
            if !known.contains(caid.as_str())
            {
                return Err(WorkflowError::not_found("CAID", caid.as_str()));
            }
        }

        self.next_seq += 1;
        let id = BlockId(format!("block_{}", self.next_seq));

        for caid in &caids
        {
            self.owner
                .insert(caid.clone(), id.clone());
        }

        info!(block = %id, block_name = name, caids = caids.len(), "block created");
        self.blocks
            .insert(
                id.clone(),
                CaidBlock {
                    id: id.clone(),
                    name: name.to_string(),
                    caids: caids
                        .into_iter()
                        .collect(),
                    source: draft.source,
                },
            );

        Ok(id)
    }

    /// Delete a block; its CAIDs return to the available pool.
    pub fn delete_block(
        &mut self,
        id: &BlockId,
    ) -> WorkflowResult<CaidBlock>
    {
        let block = self
            .blocks
            .shift_remove(id)
            .ok_or_else(|| WorkflowError::not_found("block", id.as_str()))?;

        for caid in &block.caids
        {
            self.owner
                .shift_remove(caid);
        }

        debug!(block = %id, "block deleted");
        Ok(block)
    }

    /// Tally matched records by ownership.
    pub fn summary(
        &self,
        matched: &MatchOutcome,
    ) -> AssignmentSummary
    {
        let assigned = matched
            .records
            .iter()
            .filter(|r| {
                self.owner
                    .contains_key(&r.caid)
            })
            .count();

        AssignmentSummary {
            blocks: self.blocks.len(),
            assigned,
            unassigned: matched.records.len() - assigned,
        }
    }
}
