//! Property tests for the matching and expansion pipeline.
//!
//! Inputs are drawn from small alphabets so duplicate site ids, repeated
//! pairs and unmatched sites show up often.

use std::collections::{HashMap, HashSet};

use caidsort::core::catalog::{CatalogEntry, CatalogIndex};
use caidsort::core::expand::{expand, expand_uniform};
use caidsort::core::input::{CaidPair, SiteRecord, parse_site_ids};
use caidsort::core::matcher::{MatchOutcome, match_sites};
use caidsort::core::pattern::{
    BlockAssignment, BlockDraft, BlockSource, OaidPatternItem, Quantity, ResolvedPattern,
    TemplateDraft, TemplateRegistry,
};
use indexmap::IndexSet;
use proptest::prelude::*;

fn site_id() -> impl Strategy<Value = String>
{
    (0u8..8).prop_map(|n| format!("S{n}"))
}

fn sites() -> impl Strategy<Value = Vec<SiteRecord>>
{
    prop::collection::vec(site_id(), 0..20).prop_map(|ids| {
        ids.into_iter()
            .enumerate()
            .map(|(i, site_id)| SiteRecord { site_id, order: i + 1 })
            .collect()
    })
}

fn pairs() -> impl Strategy<Value = Vec<CaidPair>>
{
    prop::collection::vec((site_id(), 0u16..50), 0..20).prop_map(|rows| {
        rows.into_iter()
            .map(|(site_id, n)| CaidPair { site_id, caid: format!("C{n}") })
            .collect()
    })
}

fn pattern() -> impl Strategy<Value = Vec<OaidPatternItem>>
{
    prop::collection::vec((0u8..5, 1u32..4), 0..5).prop_map(|items| {
        items
            .into_iter()
            .map(|(o, q)| OaidPatternItem::new(format!("O{o}"), Quantity::new(q).unwrap()))
            .collect()
    })
}

proptest! {
    #[test]
    fn match_preserves_site_order(sites in sites(), pairs in pairs())
    {
        let out = match_sites(&sites, &pairs);

        let orders: Vec<usize> = out.records.iter().map(|r| r.order).collect();
        prop_assert!(orders.windows(2).all(|w| w[0] < w[1]));

        for rec in &out.records
        {
            let origin = &sites[rec.order - 1];
            prop_assert_eq!(&origin.site_id, &rec.site_id);
        }
    }

    #[test]
    fn match_cardinality_counts_sites_with_a_pair(sites in sites(), pairs in pairs())
    {
        let out = match_sites(&sites, &pairs);
        let known: HashSet<&str> = pairs.iter().map(|p| p.site_id.as_str()).collect();
        let expected = sites.iter().filter(|s| known.contains(s.site_id.as_str())).count();

        prop_assert_eq!(out.records.len(), expected);
        prop_assert_eq!(out.records.len() + out.unmatched, sites.len());
    }

    #[test]
    fn first_pair_for_a_site_wins(sites in sites(), pairs in pairs())
    {
        let mut first: HashMap<&str, &str> = HashMap::new();
        for p in &pairs
        {
            first.entry(p.site_id.as_str()).or_insert(p.caid.as_str());
        }

        let out = match_sites(&sites, &pairs);
        for rec in &out.records
        {
            prop_assert_eq!(first[rec.site_id.as_str()], rec.caid.as_str());
        }
    }

    #[test]
    fn uniform_expansion_is_a_product(sites in sites(), pairs in pairs(), pattern in pattern())
    {
        let matched = match_sites(&sites, &pairs).records;
        let rows = expand_uniform(&matched, &pattern);

        prop_assert_eq!(rows.len(), matched.len() * pattern.len());
        for (i, row) in rows.iter().enumerate()
        {
            let rec = &matched[i / pattern.len()];
            let item = &pattern[i % pattern.len()];
            prop_assert_eq!(&row.caid, &rec.caid);
            prop_assert_eq!(row.oaid.as_deref(), Some(item.oaid.as_str()));
            prop_assert_eq!(row.quantity, Some(item.quantity));
        }
    }

    #[test]
    fn block_rows_plus_unassigned_cover_every_match(
        sites in sites(),
        pairs in pairs(),
        split in 0usize..20,
    )
    {
        let matched: MatchOutcome = match_sites(&sites, &pairs);

        let mut templates = TemplateRegistry::new();
        let id = templates.add(TemplateDraft::new("OA-1", "AC", 1)).unwrap();

        // One block over a prefix of the distinct matched CAIDs
        let distinct: IndexSet<String> = matched.caids().map(str::to_string).collect();
        let chosen: Vec<String> = distinct.iter().take(split).cloned().collect();

        let mut blocks = BlockAssignment::new();
        if !chosen.is_empty()
        {
            blocks
                .create_block(
                    BlockDraft { name: "B".into(), caids: chosen.clone(), source: BlockSource::Templates(vec![id]) },
                    &matched,
                    &templates,
                )
                .unwrap();
        }

        let out = expand(&matched.records, &ResolvedPattern::Blocks { assignment: blocks, templates });
        let in_block = matched.records.iter().filter(|r| chosen.contains(&r.caid)).count();

        prop_assert_eq!(out.rows.len(), in_block);
        prop_assert_eq!(out.rows.len() + out.unassigned, matched.records.len());
    }

    #[test]
    fn site_parsing_skips_blanks_without_gaps(lines in prop::collection::vec("[A-Z0-9 ]{0,6}", 0..30))
    {
        let text = lines.join("\n");
        let parsed = parse_site_ids(&text);

        let expected: Vec<&str> = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
        prop_assert_eq!(parsed.len(), expected.len());
        for (i, rec) in parsed.iter().enumerate()
        {
            prop_assert_eq!(rec.order, i + 1);
            prop_assert_eq!(rec.site_id.as_str(), expected[i]);
        }
    }
}

#[test]
fn end_to_end_rows_come_out_in_nested_order()
{
    let sites = parse_site_ids("S1\nS2");
    let pairs = vec![
        CaidPair { site_id: "S1".into(), caid: "C1".into() },
        CaidPair { site_id: "S2".into(), caid: "C2".into() },
    ];
    let pattern = vec![
        OaidPatternItem::new("O1", Quantity::new(2).unwrap()),
        OaidPatternItem::new("O2", Quantity::ONE),
    ];

    let matched = match_sites(&sites, &pairs);
    let out = expand(&matched.records, &ResolvedPattern::Uniform(pattern));

    let got: Vec<(String, String, usize, String, u32)> = out
        .rows
        .into_iter()
        .map(|r| {
            (
                r.site_id,
                r.caid,
                r.order,
                r.oaid.unwrap_or_default(),
                r.quantity.map_or(0, Quantity::get),
            )
        })
        .collect();

    let expected = [("S1", "C1", 1, "O1", 2), ("S1", "C1", 1, "O2", 1), ("S2", "C2", 2, "O1", 2), ("S2", "C2", 2, "O2", 1)]
        .map(|(s, c, o, a, q)| (s.to_string(), c.to_string(), o, a.to_string(), q));
    assert_eq!(got, expected.to_vec());
}

#[test]
fn catalog_search_is_repeatable_and_case_insensitive()
{
    let entry = |oaid: &str, region: &str, desc: &str| CatalogEntry {
        oaid: oaid.into(),
        region: region.into(),
        region_alias: None,
        long_description: desc.into(),
    };
    let catalog = CatalogIndex::load(vec![
        entry("OA-2", "JAKARTA", "AC SPLIT 2 PK"),
        entry("OA-5", "BANDUNG", "AC SPLIT 1 PK"),
        entry("OA-1", "JAKARTA", "AC SPLIT 1 PK"),
    ]);
    let regions = IndexSet::from(["JAKARTA".to_string()]);

    let first: Vec<&str> = catalog
        .search(&regions, "ac split")
        .iter()
        .map(|e| e.oaid.as_str())
        .collect();
    let second: Vec<&str> = catalog
        .search(&regions, "AC Split")
        .iter()
        .map(|e| e.oaid.as_str())
        .collect();

    assert_eq!(first, vec!["OA-2", "OA-1"]);
    assert_eq!(first, second);
}
