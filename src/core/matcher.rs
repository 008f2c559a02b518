//! Order-preserving join of site records against the CAID table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::input::{CaidPair, SiteRecord};

/// A site that found its CAID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchedRecord
{
    pub site_id: String,
    pub caid: String,
    /// Order of the originating [`SiteRecord`]
    pub order: usize,
}

/// Join result plus the aggregate miss count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchOutcome
{
    pub records: Vec<MatchedRecord>,
    /// Sites with no CAID row; dropped silently
    pub unmatched: usize,
}

impl MatchOutcome
{
    /// Matched CAIDs in record order.
    pub fn caids(&self) -> impl Iterator<Item = &str>
    {
        self.records
            .iter()
            .map(|r| r.caid.as_str())
    }
}

/// Join `sites` against `pairs` by site id.
///
/// For duplicate site ids in `pairs` the first row in upload order wins.
#[instrument(level = "debug", skip_all, fields(sites = sites.len(), pairs = pairs.len()))]
pub fn match_sites(
    sites: &[SiteRecord],
    pairs: &[CaidPair],
) -> MatchOutcome
{
    // First occurrence only: entry().or_insert keeps the earliest row
    let mut index: HashMap<&str, &str> = HashMap::with_capacity(pairs.len());
    for pair in pairs
    {
        index
            .entry(pair.site_id.as_str())
            .or_insert(pair.caid.as_str());
    }

    let mut outcome = MatchOutcome::default();
    for site in sites
    {
        match index.get(site.site_id.as_str())
        {
            Some(caid) => outcome
                .records
                .push(MatchedRecord {
                    site_id: site
                        .site_id
                        .clone(),
                    caid: (*caid).to_string(),
                    order: site.order,
                }),
            None => outcome.unmatched += 1,
        }
    }

    debug!(matched = outcome.records.len(), unmatched = outcome.unmatched, "match complete");
    outcome
}
