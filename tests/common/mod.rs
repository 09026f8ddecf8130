//! Common test utilities

use std::collections::HashMap;

/// One harvester row as the loader sees it, before splitting
pub fn flat_row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A fully populated harvester row
#[allow(dead_code)]
pub fn sample_row() -> HashMap<String, String> {
    flat_row(&[
        ("brief_id", "10568/131000"),
        ("title", "Climate-smart rice in East Africa"),
        ("issued_date", "2023-08-15"),
        ("dcterms_subject", "rice | climate change |  | Water"),
        ("dc_contributor_author", "Doe, J. | Roe, K."),
        ("cg_coverage_country", "Kenya | Tanzania"),
        ("cg_coverage_region", "Eastern Africa"),
        ("cg_subject_sdg", "SDG 2 - Zero hunger"),
        ("cg_contributor_donor", "Gates"),
        ("cg_reviewStatus", "Peer Review"),
    ])
}
