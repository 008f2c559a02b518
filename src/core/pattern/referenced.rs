//! Catalog-referenced pattern: each slot is a description searched within
//! the selected regions and resolved to exactly one OAID.

use indexmap::IndexSet;
use tracing::{debug, info};

use super::{OaidPatternItem, Quantity, check_reference};
use crate::core::catalog::{CatalogEntry, CatalogIndex, Resolution};
use crate::core::error::{WorkflowError, WorkflowResult};
use crate::core::matcher::MatchOutcome;

/// One pattern slot and its search state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot
{
    pub description: String,
    pub quantity: Quantity,
    /// Hits of the most recent search
    pub candidates: Vec<CatalogEntry>,
    /// Resolved entry; the slot is complete once this is set
    pub selected: Option<CatalogEntry>,
}

impl Slot
{
    pub fn new(
        description: impl Into<String>,
        quantity: Quantity,
    ) -> Self
    {
        Self { description: description.into(), quantity, ..Self::default() }
    }

    pub fn is_complete(&self) -> bool
    {
        self.selected
            .is_some()
    }
}

/// Pattern built from catalog searches.
#[derive(Debug, Clone)]
pub struct ReferencedPattern
{
    regions: IndexSet<String>,
    reference_caid: Option<String>,
    slots: Vec<Slot>,
}

impl ReferencedPattern
{
    /// Start a pattern scoped to `regions`; at least one is required.
    pub fn new(regions: IndexSet<String>) -> WorkflowResult<Self>
    {
        if regions.is_empty()
        {
            return Err(WorkflowError::incomplete("select at least one region"));
        }
        Ok(Self { regions, reference_caid: None, slots: Vec::new() })
    }

    pub fn regions(&self) -> &IndexSet<String>
    {
        &self.regions
    }

    pub fn slots(&self) -> &[Slot]
    {
        &self.slots
    }

    /// Append a slot and return its index.
    pub fn add_slot(
        &mut self,
        description: impl Into<String>,
        quantity: Quantity,
    ) -> usize
    {
        self.slots
            .push(Slot::new(description, quantity));
        self.slots
            .len()
            - 1
    }

    pub fn remove_slot(
        &mut self,
        index: usize,
    ) -> WorkflowResult<Slot>
    {
        if index >= self.slots.len()
        {
            return Err(WorkflowError::not_found("pattern slot", index.to_string()));
        }
        Ok(self
            .slots
            .remove(index))
    }

    fn slot_mut(
        &mut self,
        index: usize,
    ) -> WorkflowResult<&mut Slot>
    {
        self.slots
            .get_mut(index)
            .ok_or_else(|| WorkflowError::not_found("pattern slot", index.to_string()))
    }

    /// Search the catalog for a slot's description.
    ///
    /// A single hit is selected automatically. Zero or several hits leave
    /// the slot incomplete; the returned [`Resolution`] says which.
    pub fn search_slot(
        &mut self,
        index: usize,
        catalog: &CatalogIndex,
    ) -> WorkflowResult<Resolution>
    {
        let regions = self
            .regions
            .clone();
        let slot = self.slot_mut(index)?;

        if slot
            .description
            .trim()
            .is_empty()
        {
            return Err(WorkflowError::incomplete("enter a description to search"));
        }

        let hits = catalog.search(&regions, &slot.description);
        let resolution = Resolution::resolve(&hits, None)?;

        slot.candidates = hits
            .into_iter()
            .cloned()
            .collect();
        slot.selected = match &resolution
        {
            Resolution::Selected(entry) =>
            {
                info!(oaid = %entry.oaid, "unique catalog match selected");
                Some(entry.clone())
            }
            _ => None,
        };

        debug!(slot = index, candidates = slot.candidates.len(), "slot searched");
        Ok(resolution)
    }

    /// Choose one OAID among a slot's candidates.
    pub fn pick(
        &mut self,
        index: usize,
        oaid: &str,
    ) -> WorkflowResult<()>
    {
        let slot = self.slot_mut(index)?;
        let entry = slot
            .candidates
            .iter()
            .find(|e| e.oaid == oaid)
            .cloned()
            .ok_or_else(|| WorkflowError::not_found("OAID among search results", oaid))?;

        slot.selected = Some(entry);
        Ok(())
    }

    pub fn set_reference(
        &mut self,
        caid: Option<String>,
    )
    {
        self.reference_caid = caid;
    }

    /// Emit the pattern from complete slots.
    ///
    /// Requires a reference CAID among the matched records and at least one
    /// complete slot. The pattern applies to every matched CAID regardless
    /// of which one was chosen as reference.
    pub fn submit(
        &self,
        matched: &MatchOutcome,
    ) -> WorkflowResult<Vec<OaidPatternItem>>
    {
        let items: Vec<OaidPatternItem> = self
            .slots
            .iter()
            .filter_map(|slot| {
                slot.selected
                    .as_ref()
                    .map(|entry| {
                        OaidPatternItem::new(entry.oaid.clone(), slot.quantity)
                            .with_description(entry.long_description.clone())
                    })
            })
            .collect();

        if items.is_empty()
        {
            return Err(WorkflowError::incomplete(
                "complete at least one pattern slot with a selected OAID",
            ));
        }

        check_reference(matched, self.reference_caid.as_deref())?;

        Ok(items)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::matcher::MatchedRecord;

    fn catalog() -> CatalogIndex
    {
        let entry = |oaid: &str, region: &str, desc: &str| CatalogEntry {
            oaid: oaid.into(),
            region: region.into(),
            region_alias: None,
            long_description: desc.into(),
        };
        CatalogIndex::load(vec![
            entry("OA-1", "JAKARTA", "AC SPLIT 1 PK"),
            entry("OA-2", "JAKARTA", "AC SPLIT 2 PK"),
            entry("OA-3", "JAKARTA", "Installasi Antenna RF"),
            entry("OA-4", "BANDUNG", "Installasi Antenna RF"),
        ])
    }

    fn matched() -> MatchOutcome
    {
        MatchOutcome {
            records: vec![
                MatchedRecord { site_id: "S1".into(), caid: "C1".into(), order: 1 },
                MatchedRecord { site_id: "S2".into(), caid: "C2".into(), order: 2 },
            ],
            unmatched: 0,
        }
    }

    fn jakarta() -> ReferencedPattern
    {
        ReferencedPattern::new(IndexSet::from(["JAKARTA".to_string()])).unwrap()
    }

    #[test]
    fn regions_are_required()
    {
        assert!(matches!(
            ReferencedPattern::new(IndexSet::new()),
            Err(WorkflowError::Incomplete(_))
        ));
    }

    #[test]
    fn unique_hit_completes_the_slot()
    {
        let mut pattern = jakarta();
        let idx = pattern.add_slot("antenna", Quantity::new(3).unwrap());

        let res = pattern
            .search_slot(idx, &catalog())
            .unwrap();
        assert!(matches!(res, Resolution::Selected(_)));
        assert!(pattern.slots()[idx].is_complete());

        pattern.set_reference(Some("C2".into()));
        let items = pattern
            .submit(&matched())
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].oaid, "OA-3");
        assert_eq!(items[0].quantity.get(), 3);
        assert_eq!(items[0].long_description.as_deref(), Some("Installasi Antenna RF"));
    }

    #[test]
    fn ambiguous_slot_needs_a_pick()
    {
        let mut pattern = jakarta();
        let idx = pattern.add_slot("ac split", Quantity::ONE);
        pattern.set_reference(Some("C1".into()));

        let res = pattern
            .search_slot(idx, &catalog())
            .unwrap();
        assert!(matches!(res, Resolution::Ambiguous(ref l) if l.len() == 2));
        assert!(matches!(pattern.submit(&matched()), Err(WorkflowError::Incomplete(_))));

        assert!(pattern.pick(idx, "OA-9").is_err());
        pattern
            .pick(idx, "OA-2")
            .unwrap();
        assert_eq!(
            pattern
                .submit(&matched())
                .unwrap()[0]
                .oaid,
            "OA-2"
        );
    }

    #[test]
    fn no_match_leaves_slot_incomplete_and_other_slots_survive()
    {
        let mut pattern = jakarta();
        let miss = pattern.add_slot("generator", Quantity::ONE);
        let hit = pattern.add_slot("antenna", Quantity::ONE);
        pattern.set_reference(Some("C1".into()));

        assert_eq!(
            pattern
                .search_slot(miss, &catalog())
                .unwrap(),
            Resolution::NoMatch
        );
        pattern
            .search_slot(hit, &catalog())
            .unwrap();

        let items = pattern
            .submit(&matched())
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn reference_caid_is_a_completeness_gate()
    {
        let mut pattern = jakarta();
        let idx = pattern.add_slot("antenna", Quantity::ONE);
        pattern
            .search_slot(idx, &catalog())
            .unwrap();

        assert!(matches!(pattern.submit(&matched()), Err(WorkflowError::Incomplete(_))));
    }
}
