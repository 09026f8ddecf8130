use anyhow::{Context, Result};

use briefscope::analytics::TrendMatrix;
use briefscope::config::Config;
use briefscope::models::Period;
use briefscope::output::TableWriter;
use briefscope::pipeline::Pipeline;

pub fn cooccur(config: Config, period: Option<Period>, min_freq: Option<u64>) -> Result<()> {
    println!("Keyword co-occurrence");
    println!("================================");

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let store = pipeline
        .open_store(false)
        .context("Failed to open database")?;
    let writer = TableWriter::new(&pipeline.config().output.dir)?;

    // Needed only to pick the default period
    let matrix = TrendMatrix::build(&store).context("Failed to build keyword matrix")?;

    let Some(outcome) = pipeline
        .cooccur(&store, &writer, &matrix, period, min_freq)
        .context("Co-occurrence analysis failed")?
    else {
        println!("No publications with a resolved period; nothing to analyze.");
        return Ok(());
    };

    println!("Period: {}", outcome.period);
    if outcome.pairs.is_empty() {
        println!("\nNo keyword pairs reach the frequency threshold.");
    } else {
        println!("\nFound {} pairs:\n", outcome.pairs.len());
        for pair in outcome.pairs.iter().take(20) {
            println!("  {:>4}  {} + {}", pair.count, pair.term_a, pair.term_b);
        }
    }
    println!("\nWrote {}", outcome.output.display());

    Ok(())
}
