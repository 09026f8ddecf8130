use anyhow::{Context, Result};

use briefscope::analytics::classifier::MIN_PERIODS;
use briefscope::config::Config;
use briefscope::output::TableWriter;
use briefscope::pipeline::Pipeline;

pub fn trends(config: Config) -> Result<()> {
    println!("Keyword trends");
    println!("================================");

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let store = pipeline
        .open_store(false)
        .context("Failed to open database")?;
    let writer = TableWriter::new(&pipeline.config().output.dir)?;

    let outcome = pipeline
        .trends(&store, &writer)
        .context("Trend analysis failed")?;

    let (terms, periods) = outcome.matrix.dims();
    println!("Matrix: {terms} keywords × {periods} periods");
    if let (Some(first), Some(last)) = (outcome.matrix.periods().first(), outcome.matrix.last_period()) {
        println!("Range:  {first} .. {last}");
    }
    if let Some((period, total)) = outcome.matrix.busiest_period() {
        println!("Busiest period: {period} ({total} keyword mentions)");
    }

    let c = &outcome.classification;
    if c.degenerate {
        println!(
            "\nOnly {} periods available; at least {MIN_PERIODS} are needed to classify trends.",
            c.periods
        );
    } else {
        println!("\nEmerging ({})", c.emerging.len());
        for t in c.emerging.iter().take(10) {
            println!("  +{:<4} {} ({} -> {})", t.growth, t.term, t.early_freq, t.recent_freq);
        }
        println!("\nDeclining ({})", c.declining.len());
        for t in c.declining.iter().take(10) {
            println!("  -{:<4} {} ({} -> {})", t.decline, t.term, t.early_freq, t.recent_freq);
        }
        println!("\nStable ({})", c.stable.len());
        for t in c.stable.iter().take(10) {
            println!("  {:>6.1}  {} (cv {:.2})", t.avg_freq, t.term, t.cv);
        }
    }

    println!();
    for path in &outcome.outputs {
        println!("Wrote {}", path.display());
    }

    Ok(())
}
