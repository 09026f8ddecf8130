//! Store-level normalization properties
//!
//! Idempotence, retirement of every variant, and conservation of the
//! publications attached to a canonical term.

use std::collections::BTreeSet;

use briefscope::models::{normalize_surface, GeoType, PublicationRecord, TagType};
use briefscope::normalize::builtin::builtin_mappings;
use briefscope::normalize::{AttributeClass, CanonicalMap, Canonicalizer, MappingSet};
use briefscope::storage::Store;

use super::fixtures::{record, store_with};

fn mixed_store() -> Store {
    let mut records = vec![
        record("a", "2023Q1", &["climatic change", "gender equity"]),
        record("b", "2023Q1", &["Climatic Change", "climate change"]),
        record("c", "2023Q2", &["climate change", "cambio climático"]),
        record("d", "2023Q3", &["seguridad alimentaria", "food insecurity"]),
        record("e", "2023Q4", &["food security", "rice"]),
    ];
    records.push(PublicationRecord {
        brief_id: "f".into(),
        period: "2023Q4".parse().ok(),
        geo: vec![
            (GeoType::Country, "Tanzania".into()),
            (GeoType::Region, "tanzania".into()),
        ],
        tags: vec![
            (TagType::Sdg, "SDG 13 - Climate Action".into()),
            (TagType::Sdg, "SDG 13 - Climate action".into()),
        ],
        ..Default::default()
    });
    store_with(&records)
}

fn mappings() -> MappingSet {
    let mut set = builtin_mappings().unwrap();
    set.insert(
        CanonicalMap::new(
            AttributeClass::Geo(GeoType::Country),
            [("tanzania", "United Republic of Tanzania")],
        )
        .unwrap(),
    )
    .unwrap();
    set
}

fn snapshot(store: &Store) -> Vec<String> {
    let mut out = Vec::new();
    for sql in [
        "SELECT keyword_raw || '|' || keyword_norm FROM keywords ORDER BY 1",
        "SELECT bk.brief_id || '|' || k.keyword_raw FROM brief_keywords bk
         JOIN keywords k ON k.keyword_id = bk.keyword_id ORDER BY 1",
        "SELECT geo_type || '|' || value_raw FROM geo ORDER BY 1",
        "SELECT brief_id || '|' || geo_id FROM brief_geo ORDER BY 1",
        "SELECT brief_id || '|' || tag_type || '|' || tag_value FROM brief_tags ORDER BY 1",
    ] {
        let mut stmt = store.conn().prepare(sql).unwrap();
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        out.extend(rows);
        out.push("--".to_string());
    }
    out
}

fn briefs_with_keyword_norm(store: &Store, norms: &BTreeSet<String>) -> BTreeSet<String> {
    let mut stmt = store
        .conn()
        .prepare(
            "SELECT bk.brief_id, k.keyword_norm FROM brief_keywords bk
             JOIN keywords k ON k.keyword_id = bk.keyword_id",
        )
        .unwrap();
    stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .unwrap()
        .filter_map(|r| r.ok())
        .filter(|(_, norm)| norms.contains(norm))
        .map(|(id, _)| id)
        .collect()
}

#[test]
fn test_second_application_is_a_no_op() {
    let mut store = mixed_store();
    let set = mappings();
    let canonicalizer = Canonicalizer::new();

    let first = canonicalizer.apply_all(&mut store, &set).unwrap();
    assert!(first.total_merged() > 0);
    let after_first = snapshot(&store);

    let second = canonicalizer.apply_all(&mut store, &set).unwrap();
    assert_eq!(second.total_merged(), 0);
    assert!(second.classes.iter().all(|c| c.applied.is_empty()));
    assert_eq!(snapshot(&store), after_first);
}

#[test]
fn test_no_association_references_a_variant() {
    let mut store = mixed_store();
    let set = mappings();
    Canonicalizer::new().apply_all(&mut store, &set).unwrap();

    let keyword_map = set.get(AttributeClass::Keyword).unwrap();
    for (variant, _) in keyword_map.iter() {
        let n: i64 = store
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM brief_keywords bk
                 JOIN keywords k ON k.keyword_id = bk.keyword_id
                 WHERE k.keyword_norm = ?1",
                [normalize_surface(variant)],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(n, 0, "variant '{variant}' still referenced");
    }

    let sdg_map = set.get(AttributeClass::Tag(TagType::Sdg)).unwrap();
    for (variant, _) in sdg_map.iter() {
        let n: i64 = store
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM brief_tags WHERE tag_type = 'sdg' AND tag_value = ?1",
                [variant],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(n, 0, "tag '{variant}' still present");
    }

    store.verify_integrity().unwrap();
}

#[test]
fn test_publications_are_conserved_per_canonical() {
    let mut store = mixed_store();
    let set = mappings();
    let keyword_map = set.get(AttributeClass::Keyword).unwrap().clone();

    let canonicals: BTreeSet<String> = keyword_map.iter().map(|(_, c)| c.to_string()).collect();
    let mut expected = Vec::new();
    for canonical in &canonicals {
        let mut norms: BTreeSet<String> = keyword_map
            .iter()
            .filter(|(_, c)| *c == canonical.as_str())
            .map(|(v, _)| normalize_surface(v))
            .collect();
        norms.insert(normalize_surface(canonical));
        expected.push((canonical.clone(), briefs_with_keyword_norm(&store, &norms)));
    }

    Canonicalizer::new().apply_all(&mut store, &set).unwrap();

    for (canonical, before) in expected {
        let after = briefs_with_keyword_norm(
            &store,
            &BTreeSet::from([normalize_surface(&canonical)]),
        );
        assert_eq!(after, before, "publications changed for '{canonical}'");
    }

    // spot checks
    let climate = briefs_with_keyword_norm(&store, &BTreeSet::from(["climate change".to_string()]));
    assert_eq!(climate, BTreeSet::from(["a".into(), "b".into(), "c".into()]));
    let food = briefs_with_keyword_norm(&store, &BTreeSet::from(["food security".to_string()]));
    assert_eq!(food, BTreeSet::from(["d".into(), "e".into()]));
}

#[test]
fn test_merge_into_publication_that_has_both_forms() {
    let mut store = mixed_store();
    let set = mappings();
    let report = Canonicalizer::new().apply_all(&mut store, &set).unwrap();

    // "d" carries two variants of food security; it keeps a single link
    let n: i64 = store
        .conn()
        .query_row(
            "SELECT COUNT(*) FROM brief_keywords bk
             JOIN keywords k ON k.keyword_id = bk.keyword_id
             WHERE bk.brief_id = 'd' AND k.keyword_norm = 'food security'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(n, 1);

    // SDG duplicate on "f" collapses into one tag row
    let tags = store.tag_counts(TagType::Sdg).unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].term, "SDG 13 - Climate action");
    assert_eq!(tags[0].count, 1);

    let sdg = report
        .classes
        .iter()
        .find(|c| c.class == AttributeClass::Tag(TagType::Sdg))
        .unwrap();
    assert_eq!(sdg.merged, 1);
}

#[test]
fn test_geo_mapping_is_scoped_to_its_type() {
    let mut store = mixed_store();
    Canonicalizer::new().apply_all(&mut store, &mappings()).unwrap();

    let countries = store.top_geo(GeoType::Country, 10).unwrap();
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].term, "united republic of tanzania");

    let regions = store.top_geo(GeoType::Region, 10).unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].term, "tanzania");
}
