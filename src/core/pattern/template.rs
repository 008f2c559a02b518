//! Reusable OAID templates, editable by id.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{OaidPatternItem, Quantity};
use crate::core::error::{WorkflowError, WorkflowResult};

/// Stable template identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId
{
    pub fn new(id: impl Into<String>) -> Self
    {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str
    {
        &self.0
    }
}

impl fmt::Display for TemplateId
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(&self.0)
    }
}

/// A named OAID definition that blocks can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OaidTemplate
{
    pub id: TemplateId,
    pub oaid: String,
    pub long_description: String,
    pub quantity: Quantity,
}

impl OaidTemplate
{
    pub fn to_item(&self) -> OaidPatternItem
    {
        OaidPatternItem::new(self.oaid.clone(), self.quantity)
            .with_description(self.long_description.clone())
    }
}

/// Unvalidated template input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateDraft
{
    /// Explicit id; generated when absent
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub oaid: String,
    #[serde(default)]
    pub long_description: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32
{
    1
}

impl TemplateDraft
{
    pub fn new(
        oaid: impl Into<String>,
        long_description: impl Into<String>,
        quantity: u32,
    ) -> Self
    {
        Self { id: None, oaid: oaid.into(), long_description: long_description.into(), quantity }
    }

    /// Trimmed fields, or the reason the draft is incomplete.
    fn validate(&self) -> WorkflowResult<(String, String, Quantity)>
    {
        let oaid = self
            .oaid
            .trim();
        let desc = self
            .long_description
            .trim();

        if oaid.is_empty() || desc.is_empty()
        {
            return Err(WorkflowError::incomplete("OAID and Long Description are required"));
        }

        Ok((oaid.to_string(), desc.to_string(), Quantity::new(self.quantity)?))
    }
}

/// Ordered template collection.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry
{
    templates: IndexMap<TemplateId, OaidTemplate>,
    next_seq: u64,
}

impl TemplateRegistry
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn len(&self) -> usize
    {
        self.templates
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.templates
            .is_empty()
    }

    pub fn get(
        &self,
        id: &TemplateId,
    ) -> Option<&OaidTemplate>
    {
        self.templates
            .get(id)
    }

    pub fn contains(
        &self,
        id: &TemplateId,
    ) -> bool
    {
        self.templates
            .contains_key(id)
    }

    /// Templates in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &OaidTemplate>
    {
        self.templates
            .values()
    }

    fn generate_id(&mut self) -> TemplateId
    {
        loop
        {
            self.next_seq += 1;
            let id = TemplateId(format!("template_{}", self.next_seq));
            if !self
                .templates
                .contains_key(&id)
            {
                return id;
            }
        }
    }

    /// Validate and store a new template.
    pub fn add(
        &mut self,
        draft: TemplateDraft,
    ) -> WorkflowResult<TemplateId>
    {
        let (oaid, long_description, quantity) = draft.validate()?;

        let id = match draft
            .id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(given) =>
            {
                let id = TemplateId::new(given);
                if self
                    .templates
                    .contains_key(&id)
                {
                    return Err(WorkflowError::Invalid(format!("duplicate template id: {id}")));
                }
                id
            }
            None => self.generate_id(),
        };

        debug!(%id, %oaid, "template added");
        self.templates
            .insert(id.clone(), OaidTemplate { id: id.clone(), oaid, long_description, quantity });
        Ok(id)
    }

    /// Replace a template's fields in place; the id and position stay.
    pub fn edit(
        &mut self,
        id: &TemplateId,
        draft: TemplateDraft,
    ) -> WorkflowResult<()>
    {
        let (oaid, long_description, quantity) = draft.validate()?;
        let template = self
            .templates
            .get_mut(id)
            .ok_or_else(|| WorkflowError::not_found("template", id.as_str()))?;

        template.oaid = oaid;
        template.long_description = long_description;
        template.quantity = quantity;
        Ok(())
    }

    /// Remove a template. Blocks that still name it skip it at expansion.
    pub fn remove(
        &mut self,
        id: &TemplateId,
    ) -> WorkflowResult<OaidTemplate>
    {
        self.templates
            .shift_remove(id)
            .ok_or_else(|| WorkflowError::not_found("template", id.as_str()))
    }
}
