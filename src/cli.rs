use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::core::export::ExportFormat;

/// Shared application context for global flags
#[derive(Clone, Debug, Default)]
pub struct AppContext
{
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
    pub verbose: bool,  // global --verbose
}

#[derive(Parser)]
#[command(name = "caidsort")]
#[command(
    about = "Match site IDs to CAIDs and expand them with OAID patterns into export-ready tables"
)]
#[command(version, long_about = None)]
pub struct Cli
{
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress tables, summaries and other non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without writing files or the clipboard
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Debug logging to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli
{
    pub fn context(&self) -> AppContext
    {
        AppContext {
            quiet: self.quiet,
            no_color: self.no_color,
            dry_run: self.dry_run,
            verbose: self.verbose,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands
{
    /// Match sites to CAIDs, optionally duplicating each row
    Match(MatchArgs),

    /// Match sites to CAIDs and expand them with a pattern plan
    Expand(ExpandArgs),

    /// Search the OAID catalog by description within regions
    Search(SearchArgs),

    /// List the regions present in an OAID catalog
    Regions(RegionsArgs),

    /// Initialize a caidsort.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),

    /// Render the man page
    Man(ManArgs),
}

/// Site list and CAID table inputs
#[derive(Debug, Clone, Args)]
pub struct InputArgs
{
    /// Site IDs, one per line (text, or first column of a spreadsheet)
    #[arg(short, long, value_name = "FILE")]
    pub sites: PathBuf,

    /// SITE_ID,CAID lines (comma or tab separated, or a spreadsheet)
    #[arg(short, long, value_name = "FILE")]
    pub caids: PathBuf,
}

/// Where and how results go
#[derive(Debug, Clone, Args)]
pub struct OutputArgs
{
    /// Export format [default: from config, else csv]
    #[arg(short, long, value_enum)]
    pub format: Option<ExportFormat>,

    /// Output file [default: <output_stem>.<ext> from config]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Copy tab-separated rows to the clipboard instead of writing a file
    #[arg(long)]
    pub clipboard: bool,

    /// Print rows and summary as JSON on stdout instead of writing a file
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct MatchArgs
{
    #[command(flatten)]
    pub input: InputArgs,

    /// Repeat every matched row N times
    #[arg(short, long, value_name = "N")]
    pub duplicate: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Parser)]
pub struct ExpandArgs
{
    #[command(flatten)]
    pub input: InputArgs,

    /// Pattern plan (TOML, or JSON by extension)
    #[arg(short, long, value_name = "FILE")]
    pub plan: PathBuf,

    /// OAID catalog [default: catalog.path from config]
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Parser)]
pub struct SearchArgs
{
    /// Description text, matched case-insensitively as a substring
    pub text: String,

    /// OAID catalog [default: catalog.path from config]
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Regions to search (repeatable) [default: catalog.default_regions]
    #[arg(short, long = "region", value_name = "REGION")]
    pub regions: Vec<String>,

    /// OAID to select when several entries match
    #[arg(long, value_name = "OAID")]
    pub pick: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct RegionsArgs
{
    /// OAID catalog [default: catalog.path from config]
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct InitArgs
{
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell
{
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs
{
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Debug, Parser)]
pub struct ManArgs
{
    /// Write caidsort.1 into this directory instead of stdout
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}
