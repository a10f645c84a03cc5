//! # docpatch
//!
//! Command-line front end for the docpatch crates:
//!
//! ```text
//! docpatch diff  old.json new.json     change records as JSON
//! docpatch patch old.json new.json     replay the diff and check the result
//! docpatch text  "old" "new"           character edit runs
//! docpatch uri   "doc:/id/key?history=2"
//! docpatch links notes.md              document URIs found in a file
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use docpatch_core::Value;
use docpatch_diff::{apply, diff, reconcile, EditOp};
use docpatch_store::UriResolver;
use tracing::{debug, error};

// ─── CLI ───────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "docpatch")]
#[command(about = "Structural diff and patch for JSON documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the change records that turn OLD into NEW
    Diff {
        old: PathBuf,
        new: PathBuf,
    },
    /// Apply the diff of OLD and NEW to OLD and verify it reaches NEW
    Patch {
        old: PathBuf,
        new: PathBuf,
        /// Only report whether the round trip succeeded
        #[arg(short, long)]
        quiet: bool,
    },
    /// Show the character edit script between two strings
    Text {
        old: String,
        new: String,
    },
    /// Parse a document URI
    Uri {
        uri: String,
        /// Scheme of document URIs
        #[arg(long, default_value = "doc")]
        scheme: String,
        /// Scheme of snapshot aliases
        #[arg(long, default_value = "snapshot")]
        snapshot_scheme: String,
    },
    /// List document URIs mentioned in a text file
    Links {
        file: PathBuf,
        #[arg(long, default_value = "doc")]
        scheme: String,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────

fn read_value(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    debug!(path = %path.display(), kind = %value.kind(), "loaded value");
    Ok(value)
}

fn run_diff(old: &Path, new: &Path) -> Result<()> {
    let changes = diff(&read_value(old)?, &read_value(new)?);
    println!("{}", serde_json::to_string_pretty(&changes)?);
    Ok(())
}

fn run_patch(old: &Path, new: &Path, quiet: bool) -> Result<bool> {
    let old = read_value(old)?;
    let new = read_value(new)?;
    let changes = diff(&old, &new);

    let mut patched = old.clone();
    apply(&mut patched, &changes)?;

    if !quiet {
        for change in &changes {
            println!("  {} {}", "•".bright_green(), change);
        }
        println!("{}", serde_json::to_string_pretty(&patched)?);
    }

    let ok = patched == new;
    if ok {
        println!(
            "{} {} change(s), result matches target",
            "✓".bright_green(),
            changes.len()
        );
    } else {
        println!("{} result differs from target", "✗".bright_red());
    }
    Ok(ok)
}

fn run_text(old: &str, new: &str) {
    let ops = reconcile(old, new);
    let mut cursor = old.chars();
    let mut rendered = String::new();
    let (mut inserted, mut deleted) = (0usize, 0usize);

    for op in &ops {
        match op {
            EditOp::Equal(n) => {
                let run: String = cursor.by_ref().take(*n).collect();
                rendered.push_str(&run);
            }
            EditOp::Insert(s) => {
                inserted += op.len();
                rendered.push_str(&s.on_green().black().to_string());
            }
            EditOp::Delete(s) => {
                deleted += op.len();
                cursor.by_ref().take(op.len()).for_each(drop);
                rendered.push_str(&s.on_red().strikethrough().to_string());
            }
        }
    }

    println!("{}", rendered);
    println!(
        "{} {} run(s): {} inserted, {} deleted",
        "▸".bright_yellow(),
        ops.len(),
        inserted.to_string().bright_green(),
        deleted.to_string().bright_red()
    );
}

fn run_uri(uri: &str, scheme: &str, snapshot_scheme: &str) -> Result<()> {
    let resolver = UriResolver::new(scheme, snapshot_scheme);
    match resolver.parse(uri) {
        Ok(details) => println!("{}", serde_json::to_string_pretty(&details)?),
        Err(err) => println!("{} not a document URI ({})", "✗".bright_yellow(), err),
    }
    Ok(())
}

fn run_links(file: &Path, scheme: &str) -> Result<()> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let resolver = UriResolver::new(scheme, "snapshot");
    let links = resolver.find_document_links(&text);
    if links.is_empty() {
        println!("{}", "(no document links)".dimmed());
    }
    for link in links {
        println!(
            "{:>6}..{:<6} {}",
            link.start,
            link.end,
            link.uri.bright_magenta()
        );
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Diff { old, new } => run_diff(&old, &new),
        Commands::Patch { old, new, quiet } => run_patch(&old, &new, quiet).map(|ok| {
            if !ok {
                std::process::exit(2);
            }
        }),
        Commands::Text { old, new } => {
            run_text(&old, &new);
            Ok(())
        }
        Commands::Uri {
            uri,
            scheme,
            snapshot_scheme,
        } => run_uri(&uri, &scheme, &snapshot_scheme),
        Commands::Links { file, scheme } => run_links(&file, &scheme),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
