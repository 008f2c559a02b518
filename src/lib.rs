//! **caidsort** - Match site IDs to CAIDs and expand them into OAID order rows
//!
//! Ordered site lists are joined against a SITE_ID→CAID table, crossed with an
//! OAID pattern (typed directly, resolved from a regional catalog, or assigned
//! per block of CAIDs), and exported as CSV, TXT, XLSX or clipboard text.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion and man page generation
pub mod completion;

/// Core pipeline - pure stages from pasted text to final rows
pub mod core {
    /// Workflow error taxonomy shared by every stage
    pub mod error;
    pub use error::{WorkflowError, WorkflowResult};

    /// Site list and CAID table normalization
    pub mod input;
    pub use input::{CaidPair, NormalizeStats, SiteRecord};

    /// Order-preserving SITE_ID → CAID join (first pair wins)
    pub mod matcher;
    pub use matcher::{MatchOutcome, MatchedRecord, match_sites};

    /// Region-indexed OAID catalog with description search
    pub mod catalog;
    pub use catalog::{CatalogEntry, CatalogIndex, Resolution};

    /// Direct, catalog-referenced and block-scoped pattern strategies
    pub mod pattern;
    pub use pattern::{OaidPatternItem, Quantity, ResolvedPattern};

    /// Cross-join of matched records with a resolved pattern
    pub mod expand;
    pub use expand::{ExpandOutcome, FinalRow, expand};

    /// CSV, TXT, XLSX and clipboard output
    pub mod export;
    pub use export::ExportFormat;

    /// Snapshot of every collection with atomic replacement
    pub mod session;
    pub use session::Session;

    /// Declarative TOML/JSON pattern plans
    pub mod plan;
    pub use plan::Plan;
}

/// Infrastructure - Configuration and file I/O
pub mod infra {
    /// Layered configuration (caidsort.toml + CAIDSORT_* env)
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Memory-mapped text reads and spreadsheet tables via calamine
    pub mod io;
    pub use io::{FileContent, read_file_smart, read_table};
}

/// Command handlers behind the CLI subcommands
pub mod cli_ext {
    /// Catalog lookups (`search`, `regions`)
    pub mod catalog_cmd;

    /// `expand` with a pattern plan
    pub mod expand_cmd;

    /// Input file loading shared by handlers
    pub mod inputs;

    /// `match` with optional duplication
    pub mod match_cmd;

    /// Summary, preview table and result delivery
    pub mod report;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use core::{Session, WorkflowError};
pub use infra::{Config, load_config};
