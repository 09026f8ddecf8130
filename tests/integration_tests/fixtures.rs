//! Test fixtures for integration tests
//!
//! Sample harvester exports plus helpers for building stores and configs

use std::path::Path;

use briefscope::config::Config;
use briefscope::models::{Period, PublicationRecord};
use briefscope::storage::{load_records, Store};

/// Harvester CSV export covering five quarters
///
/// `rice` fades out, `climate finance` appears late, `climatic change` and
/// `Climate Change` are variants of `climate change`.
pub const SAMPLE_CSV: &str = "\
brief_id,title,issued_date,dcterms_subject,cg_coverage_country,cg_subject_sdg,cg_contributor_donor,dc_contributor_author
b01,Rice One,2023-01-10,rice | water,Kenya,SDG 2 - Zero Hunger,Gates,Doe J. | Roe K.
b02,Rice Two,2023-02-14,rice | climatic change,Kenya,SDG 2 - Zero hunger,,Doe J.
b03,Rice Three,2023-03-01,rice | water | climatic change,Peru,SDG 13 - Climate Action,,
b04,Rice Four,2023-04-20,rice | water,Peru,SDG 13 - Climate action,Gates,
b05,Rice Five,2023-05-20,rice | Climate Change,,,,
b06,Rice Six,2023-07-02,rice,India,,,
b07,Rice Seven,2023-08-02,rice | water,India,,,
b08,Late One,2023-10-05,climate finance | water | climate change,Kenya,,,
b09,Late Two,2023-11-05,climate finance | water | climate change,Kenya,,,
b10,Late Three,2024-01-05,climate finance | water | climate change,Peru,,,
b11,Late Four,2024-02-05,climate finance | water,Peru,,,
b12,Late Five,2024-03-05,Climate Finance | Water,,,,
b13,Undated,,rice | orphan,,,,
";

/// Same shape as JSON Lines, with list-valued fields
pub const SAMPLE_JSONL: &str = r#"{"brief_id": "j1", "issued_date": "2022-05-01", "dcterms_subject": ["soil", "water"], "cg_coverage_region": ["Africa"]}
{"brief_id": "j2", "year_quarter": "2022Q3", "dcterms_subject": "soil | drought", "cg_subject_impactArea": ["Climate adaptation & mitigation"]}
"#;

/// Mapping file overlaid on the built-ins
pub const SAMPLE_MAPPINGS: &str = r#"
[keywords]
"water" = "water resources"

[geo.country]
"peru" = "Peru (Republic of)"

[funding.donor]
"gates" = "Bill & Melinda Gates Foundation"
"#;

/// A mapping file whose keyword table is chained
pub const CHAINED_MAPPINGS: &str = r#"
[keywords]
"a" = "b"
"b" = "c"
"#;

pub fn period(s: &str) -> Period {
    s.parse().unwrap()
}

/// Quarters `2023Q1` onward
pub fn periods(n: usize) -> Vec<Period> {
    (0..n)
        .map(|i| Period::new(2023 + (i / 4) as i32, (i % 4) as u32 + 1).unwrap())
        .collect()
}

pub fn record(id: &str, p: &str, keywords: &[&str]) -> PublicationRecord {
    PublicationRecord {
        brief_id: id.to_string(),
        period: Some(period(p)),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        ..Default::default()
    }
}

/// One publication per unit of `counts[i]` in period `i`, all tagged `term`
pub fn series_records(term: &str, counts: &[u64]) -> Vec<PublicationRecord> {
    let mut out = Vec::new();
    for (p, &n) in periods(counts.len()).iter().zip(counts) {
        for i in 0..n {
            out.push(PublicationRecord {
                brief_id: format!("{term}-{p}-{i}"),
                period: Some(*p),
                keywords: vec![term.to_string()],
                ..Default::default()
            });
        }
    }
    out
}

pub fn store_with(records: &[PublicationRecord]) -> Store {
    let mut store = Store::in_memory().unwrap();
    load_records(&mut store, records).unwrap();
    store
}

/// Config pointing the database and output tables into `dir`
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.database.sqlite_path = dir.join("db").join("briefs.sqlite");
    config.output.dir = dir.join("tables");
    config
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
