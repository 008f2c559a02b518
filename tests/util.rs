//! Shared test utilities for integration tests
//!
//! Provides common fixture creation and helper functions
//! used across multiple test files.

#![allow(dead_code)]

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use std::process::Command;

/// Ordered site list with a blank line that must not consume an order slot
pub const SITES: &str = "S1\n\nS2\r\nS3\nS4\n";

/// S1 appears twice (first pair wins), S4 has no CAID, one line is junk
pub const CAIDS: &str = "S1,C1\nS3\tC3\nS2,C2\nS1,CX\nbroken line\n";

/// Tab-separated catalog with aliased headers
pub const CATALOG: &str = "\
OAID\tREG\tlongDescription\tREG Alias
OA-1\tJAKARTA\tAC SPLIT 1 PK\tJKT
OA-2\tJAKARTA\tAC SPLIT 2 PK\tJKT
OA-3\tJAKARTA\tInstallasi Antenna RF\tJKT
OA-9\tBANDUNG\tInstallasi Antenna RF\tBDG
";

/// Temp workspace holding sites, CAIDs and catalog files.
pub fn make_fixture() -> assert_fs::TempDir
{
    // Initialize the temporary project root
    let tmp = assert_fs::TempDir::new().expect("tempdir");

    tmp.child("sites.txt")
        .write_str(SITES)
        .expect("write sites");
    tmp.child("caids.csv")
        .write_str(CAIDS)
        .expect("write caids");
    tmp.child("catalog.tsv")
        .write_str(CATALOG)
        .expect("write catalog");

    tmp
}

/// Binary invocation rooted in `dir` with a clean config environment.
pub fn caidsort(dir: &assert_fs::TempDir) -> Command
{
    let mut cmd = Command::cargo_bin("caidsort").expect("caidsort binary");
    cmd.current_dir(dir.path())
        .arg("--no-color")
        .env_remove("RUST_LOG")
        .env_remove("CAIDSORT_EXPORT__FORMAT")
        .env_remove("CAIDSORT_PREVIEW__ROWS");
    cmd
}

/// Write a plan file into the fixture and return its name.
pub fn write_plan(
    dir: &assert_fs::TempDir,
    name: &str,
    body: &str,
) -> String
{
    dir.child(name)
        .write_str(body)
        .expect("write plan");
    name.to_string()
}
