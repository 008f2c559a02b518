use anyhow::Result;
use caidsort::cli::{Cli, Commands};
use caidsort::cli_ext::{catalog_cmd, expand_cmd, match_cmd};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(verbose: bool)
{
    let fallback = if verbose { "caidsort=debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() -> Result<()>
{
    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = cli.context();
    init_tracing(ctx.verbose);

    match cli.command
    {
        Commands::Match(args) => match_cmd::run(args, &ctx),
        Commands::Expand(args) => expand_cmd::run(args, &ctx),
        Commands::Search(args) => catalog_cmd::search(args, &ctx),
        Commands::Regions(args) => catalog_cmd::regions(args, &ctx),
        Commands::Init(args) => caidsort::infra::config::init(args, &ctx),
        Commands::Completions(args) => caidsort::completion::run(args, &ctx),
        Commands::Man(args) => caidsort::completion::man(args, &ctx),
    }
}
