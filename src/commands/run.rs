use anyhow::{Context, Result};
use std::path::Path;

use briefscope::config::Config;
use briefscope::pipeline::Pipeline;

pub fn run(config: Config, input: Option<&Path>, mapping_file: Option<&Path>) -> Result<()> {
    println!("Running full pipeline");
    println!("================================");

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let report = pipeline
        .run(input, mapping_file)
        .context("Pipeline run failed")?;

    if let Some(load) = &report.load {
        println!(
            "Loaded:      {} records ({} skipped)",
            load.records_loaded, load.records_skipped
        );
    }
    println!(
        "Normalized:  {} associations merged across {} classes",
        report.normalization.total_merged(),
        report.normalization.classes.len()
    );
    println!(
        "Matrix:      {} keywords × {} periods",
        report.matrix.terms, report.matrix.periods
    );
    if report.trends.degenerate {
        println!("Trends:      skipped, too few periods");
    } else {
        println!(
            "Trends:      {} emerging, {} declining, {} stable",
            report.trends.emerging, report.trends.declining, report.trends.stable
        );
    }
    match report.cooccurrence.period {
        Some(period) => println!(
            "Co-occur:    {} pairs in {period} (min {})",
            report.cooccurrence.pairs, report.cooccurrence.min_freq
        ),
        None => println!("Co-occur:    skipped, no periods"),
    }

    println!();
    for path in &report.outputs {
        println!("Wrote {}", path.display());
    }
    let elapsed = report.finished_at - report.started_at;
    println!("\nCompleted in {} ms", elapsed.num_milliseconds());

    Ok(())
}
