//! Main entry point for the ziptree CLI application.
//!
//! Resolves a tree-ish in a git repository and writes a ZIP archive of it
//! to stdout (or to the file given with `-o`). Diagnostics go to stderr.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;

use ziptree::{ArchiveOptions, Cli, LooseObjectStore, build_archive, resolve_revision};

/// Application entry point.
///
/// Parses command-line arguments, sets up logging and runs one build.
/// Any fatal error ends the process with a non-zero status.
fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let store = LooseObjectStore::new(&cli.git_dir)?;
    let id = resolve_revision(&cli.git_dir, &cli.tree_ish)?;

    let options = ArchiveOptions {
        level: cli.level,
        base: cli.base.clone(),
        modified: None,
    };

    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_archive(&store, &id, &options, BufWriter::new(file))
        }
        None => write_archive(&store, &id, &options, BufWriter::new(io::stdout().lock())),
    }
}

/// Run the build against `out` and report the result.
fn write_archive<W: Write>(
    store: &LooseObjectStore,
    id: &ziptree::ObjectId,
    options: &ArchiveOptions,
    out: W,
) -> Result<()> {
    let summary = build_archive(store, id, options, out)?;
    if summary.skipped > 0 {
        tracing::warn!(
            skipped = summary.skipped,
            "some entries were left out of the archive"
        );
    }
    Ok(())
}
