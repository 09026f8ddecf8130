//! Error scenario integration tests
//!
//! Tests failure modes and degenerate input:
//! 1. Unloaded stores (missing tables) abort with a configuration error
//! 2. Invalid mapping files are rejected before touching the store
//! 3. Too few periods yield empty, flagged trend sets
//! 4. Unknown periods and absent variants are absorbed
//! 5. Malformed input files

use briefscope::analytics::{CooccurrenceAnalyzer, TrendClassifier, TrendMatrix};
use briefscope::error::{BriefscopeErrorTrait, ErrorCategory};
use briefscope::normalize::{AttributeClass, CanonicalMap, Canonicalizer, MappingSet};
use briefscope::output::{EMERGING_FILE, MATRIX_FILE};
use briefscope::pipeline::Pipeline;
use briefscope::storage::{load_file, Store};
use tempfile::TempDir;

use super::fixtures::{
    period, record, series_records, store_with, test_config, write_file, CHAINED_MAPPINGS,
};

// ============================================================================
// Configuration errors
// ============================================================================

#[test]
fn test_unloaded_store_is_fatal_for_every_stage() {
    let dir = TempDir::new().unwrap();
    let path = write_file(dir.path(), "empty.sqlite", "");
    let mut store = Store::open(&path).unwrap();

    let err = TrendMatrix::build(&store).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Config);
    assert!(err.is_fatal());
    assert!(err.to_string().contains("briefs"));

    let map = CanonicalMap::new(AttributeClass::Keyword, [("a", "b")]).unwrap();
    let err = Canonicalizer::new().apply(&mut store, &map).unwrap_err();
    assert!(err.is_fatal());

    let err = CooccurrenceAnalyzer::default()
        .analyze(&store, period("2024Q1"))
        .unwrap_err();
    assert!(err.is_fatal());

    assert!(store.summary().unwrap_err().is_fatal());
}

#[test]
fn test_run_without_input_on_missing_database_aborts() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    std::fs::create_dir_all(config.database.sqlite_path.parent().unwrap()).unwrap();
    let db = config.database.sqlite_path.clone();
    let out_dir = config.output.dir.clone();

    let err = Pipeline::new(config).unwrap().run(None, None).unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("does not exist"));
    assert!(!db.exists());
    assert!(!out_dir.join(MATRIX_FILE).exists());
}

#[test]
fn test_run_without_input_in_missing_directory_aborts() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let db_dir = config.database.sqlite_path.parent().unwrap().to_path_buf();

    let err = Pipeline::new(config).unwrap().run(None, None).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Config);
    assert!(!db_dir.exists());
}

#[test]
fn test_chained_mapping_file_is_rejected() {
    let err = MappingSet::from_toml_str(CHAINED_MAPPINGS).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Config);

    let dir = TempDir::new().unwrap();
    let mappings = write_file(dir.path(), "bad.toml", CHAINED_MAPPINGS);
    let pipeline = Pipeline::new(test_config(dir.path())).unwrap();
    assert!(pipeline.mappings(Some(&mappings)).unwrap_err().is_fatal());
}

#[test]
fn test_mapping_file_chaining_into_builtins_is_rejected() {
    let dir = TempDir::new().unwrap();
    // "climate change" is a builtin canonical; making it a variant forms a chain
    let mappings = write_file(
        dir.path(),
        "chain.toml",
        "[keywords]\n\"climate change\" = \"climate\"\n",
    );
    let pipeline = Pipeline::new(test_config(dir.path())).unwrap();
    assert!(pipeline.mappings(Some(&mappings)).is_err());
}

#[test]
fn test_invalid_thresholds_are_rejected() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.trends.min_avg = -1.0;
    let err = Pipeline::new(config).err().unwrap();
    assert!(err.is_fatal());
}

// ============================================================================
// Degenerate input
// ============================================================================

#[test]
fn test_four_periods_are_degenerate() {
    let store = store_with(&series_records("soil", &[9, 9, 9, 9]));
    let matrix = TrendMatrix::build(&store).unwrap();
    assert_eq!(matrix.periods().len(), 4);

    let result = TrendClassifier::default().classify(&matrix);
    assert!(result.degenerate);
    assert!(result.is_empty());
}

#[test]
fn test_degenerate_run_still_writes_tables() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        dir.path(),
        "few.csv",
        "brief_id,issued_date,dcterms_subject\n\
         a,2023-01-01,soil | water\n\
         b,2023-02-01,soil | water\n\
         c,2023-04-01,soil\n",
    );
    let config = test_config(dir.path());
    let out_dir = config.output.dir.clone();

    let report = Pipeline::new(config).unwrap().run(Some(&input), None).unwrap();
    assert!(report.trends.degenerate);
    assert_eq!(report.trends.emerging, 0);
    assert_eq!(report.cooccurrence.period, Some(period("2023Q2")));
    assert_eq!(report.cooccurrence.pairs, 0);

    let emerging = std::fs::read_to_string(out_dir.join(EMERGING_FILE)).unwrap();
    assert_eq!(emerging.trim(), "keyword,recent_freq,early_freq,growth");
}

#[test]
fn test_unknown_period_yields_empty_table() {
    let store = store_with(&[
        record("a", "2023Q1", &["soil", "water"]),
        record("b", "2023Q1", &["soil", "water"]),
        record("c", "2023Q1", &["soil", "water"]),
    ]);
    let analyzer = CooccurrenceAnalyzer::default();
    assert_eq!(analyzer.analyze(&store, period("2023Q1")).unwrap().len(), 1);
    assert!(analyzer.analyze(&store, period("2030Q4")).unwrap().is_empty());
}

#[test]
fn test_empty_store_has_no_cooccurrence_period() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let pipeline = Pipeline::new(config).unwrap();
    let store = pipeline.open_store(true).unwrap();
    let writer = briefscope::output::TableWriter::new(&pipeline.config().output.dir).unwrap();

    let matrix = TrendMatrix::build(&store).unwrap();
    assert!(matrix.is_empty());
    assert!(pipeline
        .cooccur(&store, &writer, &matrix, None, None)
        .unwrap()
        .is_none());
}

#[test]
fn test_absent_variants_are_skipped() {
    let mut store = store_with(&[record("a", "2023Q1", &["soil"])]);
    let map = CanonicalMap::new(
        AttributeClass::Keyword,
        [("suelo", "soil"), ("agua", "water")],
    )
    .unwrap();

    let report = Canonicalizer::new().apply(&mut store, &map).unwrap();
    assert_eq!(report.merged, 0);
    assert_eq!(report.skipped, 2);
    assert!(report.applied.is_empty());

    // no canonical row is created for an absent variant
    let n = store.count_rows("keywords").unwrap();
    assert_eq!(n, 1);
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn test_malformed_jsonl_fails_without_partial_load() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        dir.path(),
        "bad.jsonl",
        "{\"brief_id\": \"ok\", \"dcterms_subject\": \"soil\"}\n{not json\n",
    );
    let mut store = Store::in_memory().unwrap();

    let err = load_file(&mut store, &input).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Input);
    assert_eq!(store.count_rows("briefs").unwrap(), 0);
}

#[test]
fn test_non_object_json_row_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "bad.json", "[{\"brief_id\": \"a\"}, 42]");
    let mut store = Store::in_memory().unwrap();
    let err = load_file(&mut store, &input).unwrap_err();
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn test_rows_without_id_are_skipped() {
    let dir = TempDir::new().unwrap();
    let input = write_file(
        dir.path(),
        "ids.csv",
        "brief_id,dcterms_subject\n,soil\nx,soil\n",
    );
    let mut store = Store::in_memory().unwrap();
    let report = load_file(&mut store, &input).unwrap();
    assert_eq!(report.records_loaded, 1);
    assert_eq!(report.records_skipped, 1);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let input = write_file(dir.path(), "briefs.xlsx", "");
    let mut store = Store::in_memory().unwrap();
    assert!(load_file(&mut store, &input).is_err());
}
