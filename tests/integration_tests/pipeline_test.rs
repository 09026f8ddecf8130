//! Pipeline integration tests
//!
//! Tests the complete flow: flat file → store → normalize → trends → co-occurrence
//! against on-disk databases and output directories.

use briefscope::analytics::{TrendClassifier, TrendMatrix};
use briefscope::normalize::{AttributeClass, CanonicalMap, Canonicalizer};
use briefscope::output::{DECLINING_FILE, EMERGING_FILE, MATRIX_FILE, STABLE_FILE, SUMMARY_FILE};
use briefscope::pipeline::Pipeline;
use briefscope::storage::{load_file, Store};
use tempfile::TempDir;

use super::fixtures::{
    period, record, series_records, store_with, test_config, write_file, SAMPLE_CSV,
    SAMPLE_JSONL, SAMPLE_MAPPINGS,
};

// ============================================================================
// Spelled-out scenarios
// ============================================================================

#[test]
fn test_variant_merge_feeds_matrix() {
    let mut store = store_with(&[
        record("P1", "2023Q1", &["climatic change"]),
        record("P2", "2023Q1", &["climate change"]),
    ]);

    let map = CanonicalMap::new(
        AttributeClass::Keyword,
        [("climatic change", "climate change")],
    )
    .unwrap();
    let report = Canonicalizer::new().apply(&mut store, &map).unwrap();
    assert_eq!(report.merged, 1);

    let matrix = TrendMatrix::build(&store).unwrap();
    assert_eq!(matrix.get("climate change", period("2023Q1")), 2);
    assert!(matrix.row("climatic change").is_none());

    let variants: i64 = store
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM keywords WHERE keyword_raw = 'climatic change'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(variants, 0);
}

#[test]
fn test_front_loaded_term_is_declining() {
    let mut records = series_records("rice", &[6, 6, 6, 0, 0]);
    // keeps the last two periods present in the matrix
    records.extend(series_records("filler", &[1, 1, 1, 1, 1]));
    let store = store_with(&records);

    let matrix = TrendMatrix::build(&store).unwrap();
    assert_eq!(matrix.dims(), (2, 5));
    assert_eq!(matrix.row("rice").unwrap(), &[6, 6, 6, 0, 0]);

    let result = TrendClassifier::default().classify(&matrix);
    assert!(!result.degenerate);
    assert_eq!(result.declining.len(), 1);
    assert_eq!(result.declining[0].term, "rice");
    assert_eq!(result.declining[0].early_freq, 18);
    assert_eq!(result.declining[0].recent_freq, 0);
    assert!(result.emerging.iter().all(|e| e.term != "rice"));
}

// ============================================================================
// Full runs
// ============================================================================

#[test]
fn test_full_run_from_csv() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "briefs.csv", SAMPLE_CSV);
    let config = test_config(dir.path());
    let out_dir = config.output.dir.clone();

    let pipeline = Pipeline::new(config).unwrap();
    let report = pipeline.run(Some(&input), None).unwrap();

    let load = report.load.as_ref().unwrap();
    assert_eq!(load.records_loaded, 13);
    assert_eq!(load.records_skipped, 0);

    // two SDG rewrites plus two "climatic change" links
    assert_eq!(report.normalization.total_merged(), 4);

    assert_eq!(report.matrix.terms, 4);
    assert_eq!(report.matrix.periods, 5);
    assert_eq!(report.matrix.first_period, Some(period("2023Q1")));
    assert_eq!(report.matrix.last_period, Some(period("2024Q1")));

    assert!(!report.trends.degenerate);
    assert_eq!(report.trends.emerging, 1);
    assert_eq!(report.trends.declining, 1);
    assert_eq!(report.trends.stable, 0);

    assert_eq!(report.cooccurrence.period, Some(period("2024Q1")));
    assert_eq!(report.cooccurrence.pairs, 1);

    for name in [
        MATRIX_FILE,
        EMERGING_FILE,
        DECLINING_FILE,
        STABLE_FILE,
        "cooccurrence_2024Q1.csv",
        SUMMARY_FILE,
    ] {
        assert!(out_dir.join(name).exists(), "missing {name}");
    }

    let emerging = std::fs::read_to_string(out_dir.join(EMERGING_FILE)).unwrap();
    assert_eq!(
        emerging.lines().collect::<Vec<_>>(),
        vec!["keyword,recent_freq,early_freq,growth", "climate finance,5,0,5"]
    );

    let declining = std::fs::read_to_string(out_dir.join(DECLINING_FILE)).unwrap();
    assert_eq!(declining.lines().nth(1), Some("rice,7,0,7"));

    let pairs = std::fs::read_to_string(out_dir.join("cooccurrence_2024Q1.csv")).unwrap();
    assert_eq!(
        pairs.lines().collect::<Vec<_>>(),
        vec!["term_a,term_b,count", "climate finance,water,3"]
    );

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.join(SUMMARY_FILE)).unwrap())
            .unwrap();
    assert_eq!(summary["matrix"]["terms"], 4);
    assert_eq!(summary["cooccurrence"]["period"], "2024Q1");
}

#[test]
fn test_rerun_without_input_is_stable() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "briefs.csv", SAMPLE_CSV);
    let pipeline = Pipeline::new(test_config(dir.path())).unwrap();

    let first = pipeline.run(Some(&input), None).unwrap();
    let second = pipeline.run(None, None).unwrap();

    assert!(second.load.is_none());
    assert_eq!(second.normalization.total_merged(), 0);
    assert_eq!(second.matrix.terms, first.matrix.terms);
    assert_eq!(second.trends.emerging, first.trends.emerging);
    assert_eq!(second.cooccurrence.pairs, first.cooccurrence.pairs);
}

#[test]
fn test_mapping_file_overlays_builtins() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "briefs.csv", SAMPLE_CSV);
    let mappings = write_file(dir.path(), "mappings.toml", SAMPLE_MAPPINGS);
    let pipeline = Pipeline::new(test_config(dir.path())).unwrap();

    pipeline.run(Some(&input), Some(&mappings)).unwrap();

    let store = pipeline.open_store(false).unwrap();
    let matrix = TrendMatrix::build(&store).unwrap();
    assert!(matrix.row("water").is_none());
    assert_eq!(matrix.get("water resources", period("2024Q1")), 3);

    let countries = store
        .top_geo(briefscope::models::GeoType::Country, 10)
        .unwrap();
    assert!(countries.iter().any(|c| c.term == "peru (republic of)" && c.count == 4));
    assert!(countries.iter().all(|c| c.term != "peru"));

    let donors = store
        .top_funding(briefscope::models::FundingType::Donor, 10)
        .unwrap();
    assert_eq!(donors.len(), 1);
    assert_eq!(donors[0].term, "Bill & Melinda Gates Foundation");
    assert_eq!(donors[0].count, 2);
}

#[test]
fn test_jsonl_load_and_cooccurrence_override() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "briefs.jsonl", SAMPLE_JSONL);
    let mut config = test_config(dir.path());
    config.cooccurrence.min_freq = 1;
    let pipeline = Pipeline::new(config).unwrap();

    let mut store = pipeline.open_store(true).unwrap();
    let report = load_file(&mut store, &input).unwrap();
    assert_eq!(report.records_loaded, 2);
    assert_eq!(report.geo_links, 1);
    assert_eq!(report.tag_links, 1);

    let writer = briefscope::output::TableWriter::new(&pipeline.config().output.dir).unwrap();
    let matrix = TrendMatrix::build(&store).unwrap();
    assert_eq!(matrix.periods(), &[period("2022Q2"), period("2022Q3")]);

    let outcome = pipeline
        .cooccur(&store, &writer, &matrix, Some(period("2022Q2")), None)
        .unwrap()
        .unwrap();
    assert_eq!(outcome.period, period("2022Q2"));
    assert_eq!(outcome.pairs.len(), 1);
    assert_eq!(outcome.pairs[0].term_a, "soil");
    assert_eq!(outcome.pairs[0].term_b, "water");
    assert!(outcome.output.ends_with("cooccurrence_2022Q2.csv"));
}

#[test]
fn test_reload_replaces_associations() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("briefs.sqlite");

    let mut store = Store::create(&db).unwrap();
    let first = write_file(dir.path(), "a.csv", "brief_id,issued_date,dcterms_subject\nx,2023-01-01,soil | water\n");
    load_file(&mut store, &first).unwrap();
    let second = write_file(dir.path(), "b.csv", "brief_id,issued_date,dcterms_subject\nx,2023-05-01,soil\n");
    load_file(&mut store, &second).unwrap();
    drop(store);

    let store = Store::open(&db).unwrap();
    let matrix = TrendMatrix::build(&store).unwrap();
    assert_eq!(matrix.periods(), &[period("2023Q2")]);
    assert_eq!(matrix.get("soil", period("2023Q2")), 1);
    assert!(matrix.row("water").is_none());
}
