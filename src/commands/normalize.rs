use anyhow::{Context, Result};
use std::path::Path;

use briefscope::config::Config;
use briefscope::models::TagType;
use briefscope::pipeline::Pipeline;

pub fn normalize(config: Config, mapping_file: Option<&Path>) -> Result<()> {
    println!("Normalizing vocabulary");
    println!("================================");

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let mappings = pipeline
        .mappings(mapping_file)
        .context("Failed to build mapping tables")?;
    let mut store = pipeline
        .open_store(false)
        .context("Failed to open database")?;

    let report = pipeline
        .normalize(&mut store, &mappings)
        .context("Normalization failed")?;

    for class in &report.classes {
        println!(
            "  {:<28} merged {:>5}  applied {:>3}  absent {:>3}",
            class.class.to_string(),
            class.merged,
            class.applied.len(),
            class.skipped
        );
    }
    println!("\nTotal associations merged: {}", report.total_merged());

    // Post-normalization view of the affected vocabularies
    for tag_type in TagType::all() {
        let counts = store.tag_counts(tag_type)?;
        if counts.is_empty() {
            continue;
        }
        println!("\n{} ({} values)", tag_type.as_str(), counts.len());
        for tc in counts.iter().take(20) {
            println!("  {:>5}  {}", tc.count, tc.term);
        }
    }

    let keywords = store.top_keywords(20)?;
    if !keywords.is_empty() {
        println!("\nTop keywords");
        for tc in &keywords {
            println!("  {:>5}  {}", tc.count, tc.term);
        }
    }

    Ok(())
}
