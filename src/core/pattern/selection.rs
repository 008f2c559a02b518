//! CAID selection over the pool of still-unassigned CAIDs.
//!
//! Mirrors the three pointer gestures of a table picker: plain click,
//! ctrl-click toggle and shift-click range. Ranges are always computed on
//! the available list, so CAIDs consumed by earlier blocks never count
//! toward range indices.

use indexmap::IndexSet;

use crate::core::error::{WorkflowError, WorkflowResult};

/// Contiguous sublist of `list` between two endpoint values, inclusive.
///
/// Endpoint order does not matter. A missing endpoint is a lookup miss.
pub fn select_range<'a>(
    list: &'a [String],
    start: &str,
    end: &str,
) -> WorkflowResult<&'a [String]>
{
    let position = |value: &str| {
        list.iter()
            .position(|c| c == value)
            .ok_or_else(|| WorkflowError::not_found("CAID", value))
    };

    let a = position(start.trim())?;
    let b = position(end.trim())?;

    Ok(&list[a.min(b)..=a.max(b)])
}

/// Selection state for building one block.
#[derive(Debug, Clone, Default)]
pub struct CaidSelection
{
    available: Vec<String>,
    selected: IndexSet<String>,
    anchor: Option<usize>,
}

impl CaidSelection
{
    /// `available` must already exclude CAIDs owned by a block.
    pub fn new(available: Vec<String>) -> Self
    {
        Self { available, ..Self::default() }
    }

    pub fn available(&self) -> &[String]
    {
        &self.available
    }

    /// Selected CAIDs in the order they were first selected.
    pub fn selected(&self) -> impl Iterator<Item = &str>
    {
        self.selected
            .iter()
            .map(String::as_str)
    }

    pub fn len(&self) -> usize
    {
        self.selected
            .len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.selected
            .is_empty()
    }

    pub fn is_selected(
        &self,
        caid: &str,
    ) -> bool
    {
        self.selected
            .contains(caid)
    }

    fn caid_at(
        &self,
        index: usize,
    ) -> WorkflowResult<&String>
    {
        self.available
            .get(index)
            .ok_or_else(|| WorkflowError::not_found("CAID row", index.to_string()))
    }

    /// Plain click: replace the selection with one CAID.
    pub fn click(
        &mut self,
        index: usize,
    ) -> WorkflowResult<()>
    {
        let caid = self
            .caid_at(index)?
            .clone();
        self.selected
            .clear();
        self.selected
            .insert(caid);
        self.anchor = Some(index);
        Ok(())
    }

    /// Ctrl-click: flip one CAID in or out of the selection.
    pub fn toggle(
        &mut self,
        index: usize,
    ) -> WorkflowResult<()>
    {
        let caid = self
            .caid_at(index)?
            .clone();
        if !self
            .selected
            .shift_remove(&caid)
        {
            self.selected
                .insert(caid);
        }
        self.anchor = Some(index);
        Ok(())
    }

    /// Shift-click: add everything between the last clicked row and
    /// `index`. Without a previous click this behaves as [`Self::click`].
    pub fn shift_click(
        &mut self,
        index: usize,
    ) -> WorkflowResult<usize>
    {
        let Some(anchor) = self.anchor
        else
        {
            self.click(index)?;
            return Ok(1);
        };

        self.caid_at(index)?;
        let range = &self.available[anchor.min(index)..=anchor.max(index)];
        self.selected
            .extend(range.iter().cloned());
        self.anchor = Some(index);
        Ok(range.len())
    }

    /// Add the value range `start..=end` to the selection.
    ///
    /// On a missing endpoint nothing changes.
    pub fn select_range(
        &mut self,
        start: &str,
        end: &str,
    ) -> WorkflowResult<usize>
    {
        let range = select_range(&self.available, start, end)?;
        let added = range.len();
        self.selected
            .extend(range.iter().cloned());
        Ok(added)
    }

    /// Add one CAID by value.
    pub fn select_value(
        &mut self,
        caid: &str,
    ) -> WorkflowResult<()>
    {
        let caid = caid.trim();
        let index = self
            .available
            .iter()
            .position(|c| c == caid)
            .ok_or_else(|| WorkflowError::not_found("CAID", caid))?;
        self.selected
            .insert(self.available[index].clone());
        self.anchor = Some(index);
        Ok(())
    }

    pub fn clear(&mut self)
    {
        self.selected
            .clear();
        self.anchor = None;
    }

    pub fn into_selected(self) -> Vec<String>
    {
        self.selected
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn letters() -> Vec<String>
    {
        ["A", "B", "C", "D", "E"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn range_is_inclusive_and_order_independent()
    {
        let list = letters();
        assert_eq!(select_range(&list, "B", "D").unwrap(), ["B", "C", "D"]);
        assert_eq!(select_range(&list, "D", "B").unwrap(), ["B", "C", "D"]);
        assert_eq!(select_range(&list, "C", "C").unwrap(), ["C"]);
    }

    #[test]
    fn missing_endpoint_leaves_selection_untouched()
    {
        let mut sel = CaidSelection::new(letters());
        sel.select_range("A", "B")
            .unwrap();

        let err = sel
            .select_range("B", "Z")
            .unwrap_err();
        assert_eq!(err, WorkflowError::not_found("CAID", "Z"));
        assert_eq!(sel.selected().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn ranges_are_computed_over_the_filtered_pool()
    {
        // B and C were consumed by an earlier block
        let pool: Vec<String> = ["A", "D", "E"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut sel = CaidSelection::new(pool);

        assert!(sel.select_range("B", "E").is_err());
        assert_eq!(
            sel.select_range("A", "E")
                .unwrap(),
            3
        );
    }

    #[test]
    fn click_toggle_and_shift_click()
    {
        let mut sel = CaidSelection::new(letters());

        sel.click(1)
            .unwrap();
        sel.click(3)
            .unwrap();
        assert_eq!(sel.selected().collect::<Vec<_>>(), vec!["D"]);

        sel.toggle(0)
            .unwrap();
        assert_eq!(sel.selected().collect::<Vec<_>>(), vec!["D", "A"]);

        // Range from the last anchor (A) to C, merged without duplicates
        assert_eq!(
            sel.shift_click(2)
                .unwrap(),
            3
        );
        assert_eq!(sel.selected().collect::<Vec<_>>(), vec!["D", "A", "B", "C"]);

        sel.toggle(3)
            .unwrap();
        assert!(!sel.is_selected("D"));
        assert!(sel.click(9).is_err());
    }

    #[test]
    fn shift_click_without_anchor_selects_one()
    {
        let mut sel = CaidSelection::new(letters());
        assert_eq!(
            sel.shift_click(4)
                .unwrap(),
            1
        );
        assert_eq!(sel.into_selected(), vec!["E".to_string()]);
    }
}
