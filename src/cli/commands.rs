use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use tokfetch::config::FetchConfig;
use tokfetch::{verify_dir, ArtifactFetcher, ModelId};

use super::util::format_size;

pub fn handle_fetch(config: &FetchConfig) -> Result<()> {
    let id = ModelId::parse(&config.model_id)?;
    let fetcher = ArtifactFetcher::from_config(config)?;

    println!(
        "{} {} {}",
        "📦 Fetching".cyan(),
        id.to_string().bold(),
        format!("@ {}", config.revision).dimmed()
    );

    let report = fetcher
        .fetch_and_save_with_progress(&id, &config.destination, |msg| {
            println!("   {}", msg.dimmed());
        })
        .with_context(|| format!("Failed to fetch tokenizer {}", id))?;

    if report.from_cache {
        println!(
            "{}",
            "⚠️  Hub unreachable; files were taken from the local cache".yellow()
        );
    }

    for file in &report.files {
        println!("  {} {} ({})", "✓".green(), file.name, format_size(file.size));
    }
    if report.synthesized_config {
        println!(
            "  {}",
            "tokenizer_config.json was generated (none in the repository)".yellow()
        );
    }
    if let Some(verified) = &report.verified {
        match verified.vocab_size {
            Some(size) => println!("{} vocabulary size {}", "🔐 Verified:".green(), size),
            None => println!("{} vocabulary files present", "🔐 Verified:".green()),
        }
    }

    println!(
        "{} {} file(s), {} → {}",
        "✅ Saved".green(),
        report.files.len(),
        format_size(report.total_bytes()),
        report.destination.display()
    );
    Ok(())
}

pub fn handle_files(config: &FetchConfig) -> Result<()> {
    let id = ModelId::parse(&config.model_id)?;
    let fetcher = ArtifactFetcher::from_config(config)?;

    let names = fetcher
        .list(&id)
        .with_context(|| format!("Failed to list files of {}", id))?;

    println!("{} {}", "Tokenizer files in".cyan(), id.to_string().bold());
    if names.is_empty() {
        println!("  {}", "(none)".yellow());
    }
    for name in names {
        println!("  {}", name);
    }
    Ok(())
}

pub fn handle_verify(dir: &Path) -> Result<()> {
    let report = verify_dir(dir)
        .with_context(|| format!("Tokenizer check failed for {}", dir.display()))?;

    println!("{} {}", "✅ Tokenizer OK:".green(), report.directory.display());
    for name in &report.files {
        println!("  {} {}", "✓".green(), name);
    }
    if let Some(size) = report.vocab_size {
        println!("  vocabulary size {}", size);
    }
    Ok(())
}
