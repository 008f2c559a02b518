//! Shell completion and man page generation using clap_complete and
//! clap_mangen.

use std::{fs, io};

use anyhow::{Context, Result};
use clap::{Command, CommandFactory};
use clap_complete::{Shell as CompletionShell, generate, generate_to};

use crate::cli::{AppContext, Cli, CompletionsArgs, ManArgs, Shell};

const BIN_NAME: &str = "caidsort";

impl From<Shell> for CompletionShell
{
    fn from(shell: Shell) -> Self
    {
        match shell
        {
            Shell::Bash => CompletionShell::Bash,
            Shell::Zsh => CompletionShell::Zsh,
            Shell::Fish => CompletionShell::Fish,
            Shell::PowerShell => CompletionShell::PowerShell,
            Shell::Elvish => CompletionShell::Elvish,
        }
    }
}

pub fn run(
    args: CompletionsArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let mut cmd: Command = Cli::command();
    let shell: CompletionShell = args
        .shell
        .into();

    if args.stdout
    {
        generate(shell, &mut cmd, BIN_NAME, &mut io::stdout());
        return Ok(());
    }

    let dir = args
        .out_dir
        .ok_or_else(|| anyhow::anyhow!("--out-dir is required unless --stdout is set"))?;

    if ctx.dry_run
    {
        println!("DRY RUN: Would write {shell} completion into {}", dir.display());
        return Ok(());
    }

    fs::create_dir_all(&dir).context("create --out-dir")?;
    let path = generate_to(shell, &mut cmd, BIN_NAME, &dir).context("generate completion file")?;

    if !ctx.quiet
    {
        eprintln!("Wrote completion to {}", path.display());
    }
    Ok(())
}

/// Render `caidsort.1` to stdout or into `--out-dir`.
pub fn man(
    args: ManArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let man = clap_mangen::Man::new(Cli::command());
    let mut buffer: Vec<u8> = Vec::new();
    man.render(&mut buffer)
        .context("render man page")?;

    let Some(dir) = args.out_dir
    else
    {
        io::Write::write_all(&mut io::stdout(), &buffer).context("write man page")?;
        return Ok(());
    };

    let path = dir.join(format!("{BIN_NAME}.1"));
    if ctx.dry_run
    {
        println!("DRY RUN: Would write {}", path.display());
        return Ok(());
    }

    fs::create_dir_all(&dir).context("create --out-dir")?;
    fs::write(&path, buffer).with_context(|| format!("write {}", path.display()))?;

    if !ctx.quiet
    {
        eprintln!("Wrote man page to {}", path.display());
    }
    Ok(())
}
