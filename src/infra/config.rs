use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::{AppContext, InitArgs};
use crate::core::export::ExportFormat;

/// Config file names probed in the working directory, first hit wins
pub const CONFIG_FILES: [&str; 3] = ["caidsort.toml", ".caidsort.toml", "caidsort.json"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Export defaults
    pub export: ExportConfig,

    /// Terminal preview
    pub preview: PreviewConfig,

    /// Catalog defaults
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig
{
    pub format: ExportFormat,
    /// File name without extension used when `-o` is absent
    pub output_stem: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig
{
    /// Rows shown in the result table; 0 hides it
    pub rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig
{
    /// Catalog file used when `--catalog` is absent; `~` is expanded
    pub path: Option<String>,
    /// Regions selected when a plan names none
    pub default_regions: Vec<String>,
}

impl Default for ExportConfig
{
    fn default() -> Self
    {
        Self { format: ExportFormat::Csv, output_stem: "caid_results".to_string() }
    }
}

impl Default for PreviewConfig
{
    fn default() -> Self
    {
        Self { rows: 20 }
    }
}

impl CatalogConfig
{
    /// Configured catalog path with `~` expanded.
    pub fn resolved_path(&self) -> Option<PathBuf>
    {
        self.path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(crate::infra::io::expand_path)
    }
}

impl ExportConfig
{
    /// Default output file for `format`.
    pub fn default_output(
        &self,
        format: ExportFormat,
    ) -> PathBuf
    {
        PathBuf::from(format!("{}.{}", self.output_stem, format.extension()))
    }
}

pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

/// Layered load: the first config file found in `dir`, then `CAIDSORT_*`
/// environment variables (`CAIDSORT_PREVIEW__ROWS=5`).
pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    for name in &CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            debug!(path = %path.display(), "loading config file");
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CAIDSORT")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("catalog.default_regions")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join(CONFIG_FILES[0]);

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let toml_string =
        toml::to_string_pretty(&Config::default()).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("Would create config file at {}", config_path.display());
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
