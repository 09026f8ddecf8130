use anyhow::{Context, Result};

use briefscope::config::Config;
use briefscope::models::{FundingType, GeoType, TagType};
use briefscope::pipeline::Pipeline;
use briefscope::storage::TermCount;

const TOP_N: usize = 15;

fn print_counts(title: &str, counts: &[TermCount]) {
    println!("\n{title}");
    if counts.is_empty() {
        println!("  (none)");
        return;
    }
    for tc in counts {
        println!("  {:>5}  {}", tc.count, tc.term);
    }
}

pub fn explore(config: Config) -> Result<()> {
    println!("Store overview");
    println!("================================");

    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let store = pipeline
        .open_store(false)
        .context("Failed to open database")?;

    let summary = store.summary().context("Failed to read table sizes")?;
    for (table, rows) in &summary.tables {
        println!("  {table:<18} {rows:>7}");
    }

    print_counts("Publications per period", &store.briefs_per_period()?);
    print_counts("Top keywords", &store.top_keywords(TOP_N)?);
    print_counts("Top countries", &store.top_geo(GeoType::Country, TOP_N)?);
    print_counts("Top regions", &store.top_geo(GeoType::Region, TOP_N)?);
    print_counts("Top donors", &store.top_funding(FundingType::Donor, TOP_N)?);
    print_counts("Top series", &store.top_series(TOP_N)?);
    for tag_type in TagType::all() {
        print_counts(tag_type.as_str(), &store.tag_counts(tag_type)?);
    }

    println!("\nMetadata completeness by year");
    println!("  {:<6} {:>6} {:>8} {:>8} {:>8}", "year", "total", "country", "funding", "keywords");
    for row in store.completeness_by_year()? {
        let year = row.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<6} {:>6} {:>8} {:>8} {:>8}",
            year, row.total, row.with_country, row.with_funding, row.with_keywords
        );
    }

    Ok(())
}
