//! `caidsort expand`: match, resolve a pattern plan, expand and export.

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::cli::{AppContext, ExpandArgs};
use crate::cli_ext::inputs;
use crate::cli_ext::report::{self, RunSummary};
use crate::core::plan::Plan;
use crate::infra::config::load_config;

#[instrument(level = "debug", skip_all, fields(plan = %args.plan.display()))]
pub fn run(
    args: ExpandArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let cfg = load_config()?;
    let plan = Plan::load(&args.plan)?;
    let (mut session, mut stats) = inputs::load_session(&args.input)?;

    // Catalog is optional unless the plan searches it
    let catalog = inputs::catalog_path(args.catalog.as_deref(), &cfg)
        .and_then(|path| inputs::load_catalog(&path).map(|loaded| (path, loaded)));
    match catalog
    {
        Ok((path, (catalog, catalog_stats))) =>
        {
            session
                .load_catalog(catalog)
                .with_context(|| format!("No usable catalog rows in {}", path.display()))?;
            stats.catalog = Some(catalog_stats);
            inputs::preselect_regions(&mut session, &cfg);
        }
        Err(err) if plan.needs_catalog() => return Err(err),
        Err(err) => debug!(%err, "continuing without catalog"),
    }

    let strategy = plan.strategy();
    let pattern = plan
        .resolve(&mut session)
        .with_context(|| format!("Cannot apply {strategy} plan {}", args.plan.display()))?;

    let outcome = session
        .expand(&pattern)
        .context("Nothing to export")?;

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
