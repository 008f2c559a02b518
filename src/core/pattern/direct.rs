//! Hand-typed OAID pattern rows.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{OaidPatternItem, Quantity, check_reference};
use crate::core::error::{WorkflowError, WorkflowResult};
use crate::core::matcher::MatchOutcome;

/// One editable row. An empty OAID marks the row as incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectRow
{
    #[serde(default)]
    pub oaid: String,
    #[serde(default)]
    pub quantity: Quantity,
}

impl DirectRow
{
    pub fn new(
        oaid: impl Into<String>,
        quantity: Quantity,
    ) -> Self
    {
        Self { oaid: oaid.into(), quantity }
    }

    fn is_complete(&self) -> bool
    {
        !self
            .oaid
            .trim()
            .is_empty()
    }
}

/// Editable direct pattern.
#[derive(Debug, Clone, Default)]
pub struct DirectPattern
{
    rows: Vec<DirectRow>,
    reference_caid: Option<String>,
}

impl DirectPattern
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn from_rows(rows: Vec<DirectRow>) -> Self
    {
        Self { rows, reference_caid: None }
    }

    pub fn rows(&self) -> &[DirectRow]
    {
        &self.rows
    }

    pub fn push_row(
        &mut self,
        row: DirectRow,
    )
    {
        self.rows
            .push(row);
    }

    pub fn update_row(
        &mut self,
        index: usize,
        row: DirectRow,
    ) -> WorkflowResult<()>
    {
        let slot = self
            .rows
            .get_mut(index)
            .ok_or_else(|| WorkflowError::not_found("pattern row", index.to_string()))?;
        *slot = row;
        Ok(())
    }

    pub fn remove_row(
        &mut self,
        index: usize,
    ) -> WorkflowResult<DirectRow>
    {
        if index >= self.rows.len()
        {
            return Err(WorkflowError::not_found("pattern row", index.to_string()));
        }
        Ok(self
            .rows
            .remove(index))
    }

    /// Optional illustrative reference; validated on submit when set.
    ///
    /// A blank CAID counts as no reference.
    pub fn set_reference(
        &mut self,
        caid: Option<String>,
    )
    {
        self.reference_caid = caid
            .map(|c| {
                c.trim()
                    .to_string()
            })
            .filter(|c| !c.is_empty());
    }

    /// Number of rows that would survive submission.
    pub fn complete_rows(&self) -> usize
    {
        self.rows
            .iter()
            .filter(|r| r.is_complete())
            .count()
    }

    /// Drop incomplete rows and emit the pattern.
    ///
    /// Fails only when nothing is left, or when a reference CAID was given
    /// that is not among the matched records.
    pub fn submit(
        &self,
        matched: &MatchOutcome,
    ) -> WorkflowResult<Vec<OaidPatternItem>>
    {
        if self
            .reference_caid
            .is_some()
        {
            check_reference(matched, self.reference_caid.as_deref())?;
        }

        let items: Vec<OaidPatternItem> = self
            .rows
            .iter()
            .filter(|r| r.is_complete())
            .map(|r| {
                OaidPatternItem::new(
                    r.oaid
                        .trim(),
                    r.quantity,
                )
            })
            .collect();

        if items.is_empty()
        {
            return Err(WorkflowError::incomplete("no pattern defined"));
        }

        debug!(
            items = items.len(),
            dropped = self.rows.len() - items.len(),
            "direct pattern submitted"
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::matcher::MatchedRecord;

    fn matched() -> MatchOutcome
    {
        MatchOutcome {
            records: vec![MatchedRecord { site_id: "S1".into(), caid: "C1".into(), order: 1 }],
            unmatched: 0,
        }
    }

    fn q(n: u32) -> Quantity
    {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn incomplete_rows_are_filtered_silently()
    {
        let pattern = DirectPattern::from_rows(vec![
            DirectRow::new("O1", q(2)),
            DirectRow::new("  ", q(5)),
            DirectRow::new(" O2 ", q(1)),
        ]);

        let items = pattern
            .submit(&matched())
            .unwrap();
        assert_eq!(items, vec![OaidPatternItem::new("O1", q(2)), OaidPatternItem::new("O2", q(1))]);
    }

    #[test]
    fn all_incomplete_is_rejected()
    {
        let mut pattern = DirectPattern::new();
        pattern.push_row(DirectRow::default());

        assert_eq!(
            pattern.submit(&matched()),
            Err(WorkflowError::incomplete("no pattern defined"))
        );
    }

    #[test]
    fn unknown_reference_is_rejected()
    {
        let mut pattern = DirectPattern::from_rows(vec![DirectRow::new("O1", q(1))]);
        pattern.set_reference(Some("C9".into()));
        assert!(matches!(pattern.submit(&matched()), Err(WorkflowError::NotFound { .. })));

        pattern.set_reference(Some("C1".into()));
        assert!(
            pattern
                .submit(&matched())
                .is_ok()
        );
    }

    #[test]
    fn blank_reference_counts_as_none()
    {
        let mut pattern = DirectPattern::from_rows(vec![DirectRow::new("O1", q(1))]);
        pattern.set_reference(Some("   ".into()));

        assert_eq!(
            pattern
                .submit(&matched())
                .unwrap(),
            vec![OaidPatternItem::new("O1", q(1))]
        );
    }

    #[test]
    fn rows_are_editable_by_index()
    {
        let mut pattern = DirectPattern::from_rows(vec![DirectRow::default()]);
        pattern
            .update_row(0, DirectRow::new("O7", q(4)))
            .unwrap();
        assert_eq!(pattern.complete_rows(), 1);
        assert!(pattern.remove_row(3).is_err());
        assert_eq!(
            pattern
                .remove_row(0)
                .unwrap()
                .oaid,
            "O7"
        );
    }
}
