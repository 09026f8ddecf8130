use anyhow::{Context, Result};
use std::path::Path;

use briefscope::config::Config;
use briefscope::pipeline::Pipeline;

pub fn load(config: Config, input: &Path) -> Result<()> {
    println!("Loading records from {}", input.display());
    println!("================================");

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let mut store = pipeline
        .open_store(true)
        .context("Failed to open database")?;

    let report = pipeline
        .load(&mut store, input)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    println!("  Records loaded:  {}", report.records_loaded);
    println!("  Records skipped: {}", report.records_skipped);
    println!("  Keyword links:   {}", report.keyword_links);
    println!("  Geo links:       {}", report.geo_links);
    println!("  Author links:    {}", report.author_links);
    println!("  Funding links:   {}", report.funding_links);
    println!("  Tag links:       {}", report.tag_links);
    println!(
        "\nDatabase: {}",
        pipeline.config().database.sqlite_path.display()
    );

    Ok(())
}
