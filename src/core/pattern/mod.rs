//! Pattern resolution: turns operator choices into concrete OAID patterns.
//!
//! Three strategies feed one tagged result, [`ResolvedPattern`]:
//! - [`direct`]: OAID + quantity rows typed by hand
//! - [`referenced`]: rows resolved by searching the catalog
//! - [`template`] + [`block`]: reusable templates applied to CAID blocks,
//!   with CAIDs picked through [`selection`]
//!
//! The pattern-less duplication workflow is the fourth variant.

pub mod block;
pub mod direct;
pub mod referenced;
pub mod selection;
pub mod template;

use std::fmt;
use std::num::{NonZeroU32, NonZeroUsize};

use serde::{Deserialize, Serialize};

use crate::core::error::{WorkflowError, WorkflowResult};
use crate::core::matcher::MatchOutcome;

pub use block::{BlockAssignment, BlockDraft, BlockId, BlockSource, CaidBlock};
pub use direct::{DirectPattern, DirectRow};
pub use referenced::{ReferencedPattern, Slot};
pub use selection::{CaidSelection, select_range};
pub use template::{OaidTemplate, TemplateDraft, TemplateId, TemplateRegistry};

/// Per-row quantity annotation, always at least 1.
///
/// Carried through to the export verbatim. It never multiplies rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity
{
    pub const ONE: Self = Self(NonZeroU32::MIN);

    pub fn new(value: u32) -> WorkflowResult<Self>
    {
        NonZeroU32::new(value)
            .map(Self)
            .ok_or_else(|| WorkflowError::Invalid("quantity must be at least 1".to_string()))
    }

    pub fn get(self) -> u32
    {
        self.0
            .get()
    }
}

impl Default for Quantity
{
    fn default() -> Self
    {
        Self::ONE
    }
}

impl fmt::Display for Quantity
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// How many identical copies of each matched record the duplication-only
/// workflow emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DuplicationCount(NonZeroUsize);

impl DuplicationCount
{
    pub fn new(value: usize) -> WorkflowResult<Self>
    {
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or_else(|| {
                WorkflowError::Invalid("duplication count must be at least 1".to_string())
            })
    }

    pub fn get(self) -> usize
    {
        self.0
            .get()
    }
}

impl Default for DuplicationCount
{
    fn default() -> Self
    {
        Self(NonZeroUsize::MIN)
    }
}

/// One resolved OAID row of a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OaidPatternItem
{
    pub oaid: String,
    pub quantity: Quantity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
}

impl OaidPatternItem
{
    pub fn new(
        oaid: impl Into<String>,
        quantity: Quantity,
    ) -> Self
    {
        Self { oaid: oaid.into(), quantity, long_description: None }
    }

    pub fn with_description(
        mut self,
        description: impl Into<String>,
    ) -> Self
    {
        self.long_description = Some(description.into());
        self
    }
}

/// Strategy output consumed by the expander.
#[derive(Debug, Clone)]
pub enum ResolvedPattern
{
    /// Same pattern for every matched CAID (direct or catalog-referenced)
    Uniform(Vec<OaidPatternItem>),
    /// Per-block patterns; CAIDs outside every block are dropped
    Blocks
    {
        assignment: BlockAssignment,
        templates: TemplateRegistry,
    },
    /// No OAID pattern, each record repeated N times
    Duplicate(DuplicationCount),
}

impl ResolvedPattern
{
    pub fn strategy_name(&self) -> &'static str
    {
        match self
        {
            Self::Uniform(_) => "uniform",
            Self::Blocks { .. } => "blocks",
            Self::Duplicate(_) => "duplicate",
        }
    }
}

/// Check the reference-CAID gate shared by the uniform strategies.
///
/// The reference is illustrative only; it must exist but does not narrow
/// the pattern's reach.
pub(crate) fn check_reference(
    matched: &MatchOutcome,
    reference: Option<&str>,
) -> WorkflowResult<()>
{
    let caid = reference
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| WorkflowError::incomplete("select a reference CAID"))?;

    if matched
        .caids()
        .any(|c| c == caid)
    {
        Ok(())
    }
    else
    {
        Err(WorkflowError::not_found("reference CAID", caid))
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn zero_quantities_are_rejected()
    {
        assert!(Quantity::new(0).is_err());
        assert_eq!(
            Quantity::new(3)
                .unwrap()
                .get(),
            3
        );
        assert!(DuplicationCount::new(0).is_err());
    }

    #[test]
    fn quantity_deserializes_from_a_bare_number()
    {
        let q: Quantity = serde_json::from_str("2").unwrap();
        assert_eq!(q.get(), 2);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }
}
