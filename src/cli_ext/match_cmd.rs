//! `caidsort match`: the pattern-less workflow.
//!
//! Sites are joined to CAIDs in input order and, with `--duplicate N`, each
//! matched row is repeated N times.

use anyhow::{Context, Result};
use tracing::instrument;

use crate::cli::{AppContext, MatchArgs};
use crate::cli_ext::inputs;
use crate::cli_ext::report::{self, RunSummary};
use crate::core::expand::{ExpandOutcome, FinalRow};
use crate::core::pattern::{DuplicationCount, ResolvedPattern};
use crate::infra::config::load_config;

#[instrument(level = "debug", skip_all)]
pub fn run(
    args: MatchArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let cfg = load_config()?;
    let (session, stats) = inputs::load_session(&args.input)?;

    let (strategy, outcome) = match args.duplicate
    {
        Some(n) =>
        {
            let count = DuplicationCount::new(n).context("Invalid --duplicate")?;
            let pattern = ResolvedPattern::Duplicate(count);
            let outcome = session
                .expand(&pattern)
                .context("Nothing to export")?;
            (pattern.strategy_name(), outcome)
        }
        None => (
            "match",
            ExpandOutcome {
                rows: session
                    .matched()
                    .records
                    .iter()
                    .map(FinalRow::plain)
                    .collect(),
                unassigned: 0,
            },
        ),
    };

    let matched = session.matched();
    let summary = RunSummary::new(
        strategy,
        &stats,
        matched
            .records
            .len(),
        matched.unmatched,
        &outcome,
    );

    report::deliver(&outcome.rows, &summary, &args.output, &cfg, ctx)
}
