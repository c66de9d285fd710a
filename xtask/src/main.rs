//! Development tasks for the graphrt workspace.
//!
//! Usage: `cargo xtask <command>`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Prefix every exported C symbol must carry.
const SYMBOL_PREFIX: &str = "grt_";

#[derive(Parser)]
#[command(name = "xtask", about = "Development tasks for graphrt")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate documentation
    Doc {
        /// Open documentation in browser after generation
        #[arg(long)]
        open: bool,
    },
    /// Run all CI checks (fmt, clippy, test, doc, symbols)
    Ci,
    /// Check that every exported C function carries the library prefix
    Symbols,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Doc { open } => cmd_doc(open),
        Commands::Ci => cmd_ci(),
        Commands::Symbols => cmd_symbols(),
    }
}

fn project_root() -> Result<&'static Path> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .context("xtask must live inside the workspace")
}

fn cmd_doc(open: bool) -> Result<()> {
    let root = project_root()?;
    println!("Generating documentation...");
    let mut args = vec!["doc", "--workspace", "--no-deps"];
    if open {
        args.push("--open");
    }
    run_cargo(root, &args)?;
    println!("Documentation generated at target/doc");
    Ok(())
}

fn cmd_ci() -> Result<()> {
    let root = project_root()?;

    println!("Running cargo fmt...");
    run_cargo(root, &["fmt", "--all", "--", "--check"])?;

    println!("Running cargo clippy...");
    run_cargo(root, &["clippy", "--workspace", "--", "-D", "warnings"])?;

    println!("Running cargo test...");
    run_cargo(root, &["test", "--workspace"])?;

    println!("Checking documentation...");
    run_cargo(root, &["doc", "--workspace", "--no-deps"])?;

    cmd_symbols()?;

    println!("All CI checks passed!");
    Ok(())
}

fn run_cargo(dir: &Path, args: &[&str]) -> Result<()> {
    let status = Command::new("cargo")
        .args(args)
        .current_dir(dir)
        .status()
        .with_context(|| format!("Failed to run cargo {}", args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("cargo {} failed", args.join(" "));
    }
    Ok(())
}

fn cmd_symbols() -> Result<()> {
    let src = project_root()?.join("crates/graphrt-capi/src");
    println!("Checking exported symbols in {}...", src.display());

    let mut exported = 0usize;
    let mut offenders = Vec::new();
    for path in rust_sources(&src)? {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        for (name, line) in exported_functions(&content) {
            exported += 1;
            if !name.starts_with(SYMBOL_PREFIX) {
                offenders.push(format!("{}:{line}: {name}", path.display()));
            }
        }
    }

    if !offenders.is_empty() {
        anyhow::bail!(
            "{} exported function(s) lack the `{SYMBOL_PREFIX}` prefix:\n  {}",
            offenders.len(),
            offenders.join("\n  ")
        );
    }
    println!("{exported} exported functions, all prefixed with `{SYMBOL_PREFIX}`");
    Ok(())
}

fn rust_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_dir() {
            files.extend(rust_sources(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Names of `extern "C"` functions following a `no_mangle` attribute, with
/// their 1-based line numbers. Macro templates are reported under the name
/// they expand from, e.g. `[<grt_attrs_store_put_ $type_name>]`.
fn exported_functions(content: &str) -> Vec<(String, usize)> {
    let mut found = Vec::new();
    let mut pending = false;
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.starts_with("#[unsafe(no_mangle)]") || line.starts_with("#[no_mangle]") {
            pending = true;
            continue;
        }
        if !pending || line.starts_with("#[") || line.starts_with("///") {
            continue;
        }
        pending = false;
        if let Some(rest) = line.split("extern \"C\" fn ").nth(1) {
            let name = rest.trim_start_matches("[<");
            let end = name
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(name.len());
            found.push((name[..end].to_string(), index + 1));
        }
    }
    found
}
