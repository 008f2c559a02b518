//! Declarative pattern plans.
//!
//! A plan file names one strategy and carries the operator choices that
//! strategy needs. Resolving a plan replays those choices against a
//! [`Session`] through the same pattern builders an interactive front-end
//! would drive, so every presence and uniqueness check still applies.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::core::catalog::Resolution;
use crate::core::error::{WorkflowError, WorkflowResult};
use crate::core::pattern::{
    BlockDraft, BlockSource, CaidSelection, DirectPattern, DirectRow, DuplicationCount,
    OaidPatternItem, Quantity, ReferencedPattern, ResolvedPattern, TemplateDraft, TemplateId,
};
use crate::core::session::Session;

/// Plan file encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat
{
    Toml,
    Json,
}

impl PlanFormat
{
    /// `.json` selects JSON; anything else is read as TOML.
    pub fn from_path(path: &Path) -> Self
    {
        match path
            .extension()
            .and_then(|e| e.to_str())
        {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

/// One catalog lookup: a description searched within the selected regions.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotPlan
{
    pub description: String,
    #[serde(default)]
    pub quantity: Quantity,
    /// OAID chosen when the search returns several entries
    #[serde(default)]
    pub pick: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectPlan
{
    #[serde(default)]
    pub reference_caid: Option<String>,
    #[serde(default)]
    pub pattern: Vec<DirectRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferencedPlan
{
    /// Overrides the configured default regions when non-empty
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub reference_caid: Option<String>,
    #[serde(default)]
    pub slots: Vec<SlotPlan>,
}

/// Inclusive CAID range over the still-available pool.
#[derive(Debug, Clone, Deserialize)]
pub struct RangePlan
{
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockPlan
{
    pub name: String,
    #[serde(default)]
    pub caids: Vec<String>,
    #[serde(default)]
    pub range: Option<RangePlan>,
    /// Template ids, in emission order
    #[serde(default)]
    pub templates: Vec<String>,
    /// Catalog-resolved items owned by this block
    #[serde(default)]
    pub pattern: Vec<SlotPlan>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlocksPlan
{
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub templates: Vec<TemplateDraft>,
    #[serde(default)]
    pub blocks: Vec<BlockPlan>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DuplicatePlan
{
    pub count: usize,
}

/// Which pattern strategy to run, and its inputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Plan
{
    Direct(DirectPlan),
    Referenced(ReferencedPlan),
    Blocks(BlocksPlan),
    Duplicate(DuplicatePlan),
}

impl Plan
{
    pub fn parse(
        text: &str,
        format: PlanFormat,
    ) -> WorkflowResult<Self>
    {
        match format
        {
            PlanFormat::Toml => toml::from_str(text).map_err(|e| WorkflowError::parse("plan", e)),
            PlanFormat::Json =>
            {
                serde_json::from_str(text).map_err(|e| WorkflowError::parse("plan", e))
            }
        }
    }

    /// Read and parse a plan file, choosing the format by extension.
    pub fn load(path: &Path) -> Result<Self>
    {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan {}", path.display()))?;

        Self::parse(&text, PlanFormat::from_path(path))
            .with_context(|| format!("Invalid plan {}", path.display()))
    }

    pub fn strategy(&self) -> &'static str
    {
        match self
        {
            Self::Direct(_) => "direct",
            Self::Referenced(_) => "referenced",
            Self::Blocks(_) => "blocks",
            Self::Duplicate(_) => "duplicate",
        }
    }

    /// Whether resolving this plan searches the catalog.
    pub fn needs_catalog(&self) -> bool
    {
        match self
        {
            Self::Referenced(_) => true,
            Self::Blocks(plan) => plan
                .blocks
                .iter()
                .any(|b| !b.pattern.is_empty()),
            Self::Direct(_) | Self::Duplicate(_) => false,
        }
    }

    /// Replay the plan against `session` and freeze the result.
    ///
    /// Block plans register their templates and blocks in the session, and
    /// plan regions replace the selection. The plan runs against a staged
    /// copy that replaces `session` only on success; a failed plan leaves
    /// `session` as it was.
    #[instrument(level = "debug", skip_all, fields(strategy = self.strategy()))]
    pub fn resolve(
        self,
        session: &mut Session,
    ) -> WorkflowResult<ResolvedPattern>
    {
        let mut staged = session.clone();
        let resolved = match self
        {
            Self::Direct(plan) => resolve_direct(plan, &staged)?,
            Self::Referenced(plan) => resolve_referenced(plan, &mut staged)?,
            Self::Blocks(plan) => resolve_blocks(plan, &mut staged)?,
            Self::Duplicate(plan) => ResolvedPattern::Duplicate(DuplicationCount::new(plan.count)?),
        };

        *session = staged;
        Ok(resolved)
    }
}

fn resolve_direct(
    plan: DirectPlan,
    session: &Session,
) -> WorkflowResult<ResolvedPattern>
{
    let mut pattern = DirectPattern::from_rows(plan.pattern);
    pattern.set_reference(plan.reference_caid);

    let items = pattern.submit(session.matched())?;
    Ok(ResolvedPattern::Uniform(items))
}

/// Apply plan regions over whatever the session already selected.
fn apply_regions(
    regions: &[String],
    session: &mut Session,
) -> WorkflowResult<()>
{
    if session
        .catalog()
        .is_empty()
    {
        return Err(WorkflowError::incomplete("upload OAID catalog data first"));
    }
    if !regions.is_empty()
    {
        session.select_regions(regions)?;
    }
    Ok(())
}

fn resolve_referenced(
    plan: ReferencedPlan,
    session: &mut Session,
) -> WorkflowResult<ResolvedPattern>
{
    apply_regions(&plan.regions, session)?;

    let mut pattern = ReferencedPattern::new(
        session
            .regions()
            .clone(),
    )?;
    pattern.set_reference(plan.reference_caid);

    for slot in plan.slots
    {
        if slot
            .description
            .trim()
            .is_empty()
        {
            warn!("slot without a description skipped");
            continue;
        }

        let idx = pattern.add_slot(slot.description.as_str(), slot.quantity);

        match (pattern.search_slot(idx, session.catalog())?, slot.pick.as_deref())
        {
            (Resolution::NoMatch, _) =>
            {
                warn!(description = %slot.description, "no catalog entry matches; slot left incomplete");
            }
            (_, Some(oaid)) => pattern.pick(idx, oaid)?,
            (Resolution::Ambiguous(list), None) =>
            {
                warn!(
                    description = %slot.description,
                    candidates = list.len(),
                    "several catalog entries match and no pick was given; slot left incomplete"
                );
            }
            (Resolution::Selected(_), None) =>
            {}
        }
    }

    let items = pattern.submit(session.matched())?;
    Ok(ResolvedPattern::Uniform(items))
}

/// Resolve one block-owned item; every failure is an error here.
fn resolve_item(
    session: &Session,
    slot: &SlotPlan,
) -> WorkflowResult<OaidPatternItem>
{
    if session
        .regions()
        .is_empty()
    {
        return Err(WorkflowError::incomplete("select at least one region"));
    }

    let hits = session
        .catalog()
        .search(session.regions(), &slot.description);
    let entry = Resolution::resolve(&hits, slot.pick.as_deref())?.into_selected(&slot.description)?;

    Ok(OaidPatternItem::new(entry.oaid, slot.quantity).with_description(entry.long_description))
}

fn block_caids(
    block: &BlockPlan,
    session: &Session,
) -> WorkflowResult<Vec<String>>
{
    let mut selection = CaidSelection::new(session.available_caids());
    if let Some(range) = &block.range
    {
        selection.select_range(&range.start, &range.end)?;
    }

    let mut caids = selection.into_selected();
    for caid in &block.caids
    {
        let caid = caid.trim();
        if !caids
            .iter()
            .any(|c| c == caid)
        {
            caids.push(caid.to_string());
        }
    }
    Ok(caids)
}

fn resolve_blocks(
    plan: BlocksPlan,
    session: &mut Session,
) -> WorkflowResult<ResolvedPattern>
{
    let needs_catalog = plan
        .blocks
        .iter()
        .any(|b| !b.pattern.is_empty());
    if needs_catalog
    {
        apply_regions(&plan.regions, session)?;
    }

    for draft in plan.templates
    {
        let id = session
            .templates_mut()
            .add(draft)?;
        debug!(template = id.as_str(), "template registered");
    }

    for block in plan.blocks
    {
        if !block.templates.is_empty() && !block.pattern.is_empty()
        {
            return Err(WorkflowError::Invalid(format!(
                "block '{}' lists both templates and a pattern",
                block.name
            )));
        }

        let caids = block_caids(&block, session)?;
        let source = if block.pattern.is_empty()
        {
            BlockSource::Templates(
                block
                    .templates
                    .iter()
                    .map(|t| TemplateId::new(t.trim()))
                    .collect(),
            )
        }
        else
        {
            let snapshot: &Session = session;
            let items = block
                .pattern
                .iter()
                .map(|slot| resolve_item(snapshot, slot))
                .collect::<WorkflowResult<Vec<_>>>()?;
            BlockSource::Pattern(items)
        };

        let id = session.create_block(BlockDraft { name: block.name, caids, source })?;
        info!(block = id.as_str(), "block created from plan");
    }

    session.block_pattern()
}
