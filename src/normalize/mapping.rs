//! Validated variant→canonical mapping tables

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use super::{AttributeClass, MappingError};
use crate::error::{Error, Result};
use crate::models::{normalize_surface, FundingType, GeoType, TagType};

/// A transitively reduced variant→canonical table for one attribute class
///
/// Construction rejects chains (a canonical value that is also a variant),
/// self-mappings and blank entries. Dictionary classes are compared on their
/// normalized surface form, tags on the literal value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMap {
    class: AttributeClass,
    entries: BTreeMap<String, String>,
}

impl CanonicalMap {
    /// Build and validate a mapping table
    pub fn new<I, K, V>(class: AttributeClass, entries: I) -> std::result::Result<Self, MappingError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let label = class.to_string();
        let mut map: BTreeMap<String, String> = BTreeMap::new();

        for (variant, canonical) in entries {
            let variant = variant.into();
            let canonical = canonical.into();

            if variant.trim().is_empty() || canonical.trim().is_empty() {
                return Err(MappingError::EmptyEntry { class: label });
            }

            if let Some(existing) = map.get(&variant) {
                if existing != &canonical {
                    return Err(MappingError::Conflict {
                        class: label,
                        variant,
                        first: existing.clone(),
                        second: canonical,
                    });
                }
                continue;
            }
            map.insert(variant, canonical);
        }

        let key = |s: &str| {
            if class.is_dictionary() {
                normalize_surface(s)
            } else {
                s.to_string()
            }
        };

        let variant_keys: BTreeSet<String> = map.keys().map(|v| key(v)).collect();

        for (variant, canonical) in &map {
            if variant == canonical {
                return Err(MappingError::SelfMapping {
                    class: label,
                    variant: variant.clone(),
                });
            }
            // A dictionary entry that only fixes casing normalizes onto itself
            let target = key(canonical);
            if target != key(variant) && variant_keys.contains(&target) {
                return Err(MappingError::ChainedMapping {
                    class: label,
                    variant: variant.clone(),
                    canonical: canonical.clone(),
                });
            }
        }

        Ok(Self {
            class,
            entries: map,
        })
    }

    pub fn class(&self) -> AttributeClass {
        self.class
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Canonical value for a variant, if mapped
    pub fn canonical(&self, variant: &str) -> Option<&str> {
        self.entries.get(variant).map(String::as_str)
    }

    /// Entries in variant order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Combine with another table for the same class, `other` winning on conflicts
    pub fn merged_with(&self, other: &CanonicalMap) -> std::result::Result<Self, MappingError> {
        let mut entries = self.entries.clone();
        entries.extend(other.entries.clone());
        Self::new(self.class, entries)
    }
}

/// Mapping tables for several attribute classes, applied in class order
#[derive(Debug, Clone, Default)]
pub struct MappingSet {
    maps: BTreeMap<AttributeClass, CanonicalMap>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MappingFile {
    tags: BTreeMap<String, BTreeMap<String, String>>,
    keywords: BTreeMap<String, String>,
    geo: BTreeMap<String, BTreeMap<String, String>>,
    funding: BTreeMap<String, BTreeMap<String, String>>,
}

impl MappingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, merging with any existing table for the same class
    pub fn insert(&mut self, map: CanonicalMap) -> std::result::Result<(), MappingError> {
        let merged = match self.maps.get(&map.class()) {
            Some(existing) => existing.merged_with(&map)?,
            None => map,
        };
        self.maps.insert(merged.class(), merged);
        Ok(())
    }

    pub fn get(&self, class: AttributeClass) -> Option<&CanonicalMap> {
        self.maps.get(&class)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalMap> {
        self.maps.values()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Parse a TOML mapping file
    ///
    /// ```toml
    /// [tags.sdg]
    /// "SDG 1 - No Poverty" = "SDG 1 - No poverty"
    ///
    /// [keywords]
    /// "climatic change" = "climate change"
    ///
    /// [geo.country]
    /// "tanzania" = "united republic of tanzania"
    ///
    /// [funding.donor]
    /// "bmgf" = "bill & melinda gates foundation"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: MappingFile = toml::from_str(content)?;
        let mut set = Self::new();

        for (name, entries) in file.tags {
            let t = TagType::parse(&name).ok_or_else(|| MappingError::UnknownClass(format!("tags.{name}")))?;
            set.insert(CanonicalMap::new(AttributeClass::Tag(t), entries)?)?;
        }
        if !file.keywords.is_empty() {
            set.insert(CanonicalMap::new(AttributeClass::Keyword, file.keywords)?)?;
        }
        for (name, entries) in file.geo {
            let t = GeoType::parse(&name).ok_or_else(|| MappingError::UnknownClass(format!("geo.{name}")))?;
            set.insert(CanonicalMap::new(AttributeClass::Geo(t), entries)?)?;
        }
        for (name, entries) in file.funding {
            let t = FundingType::parse(&name)
                .ok_or_else(|| MappingError::UnknownClass(format!("funding.{name}")))?;
            set.insert(CanonicalMap::new(AttributeClass::Funding(t), entries)?)?;
        }

        Ok(set)
    }

    /// Read a TOML mapping file from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::with_source(format!("Failed to read mapping file: {}", path.display()), e)
        })?;
        Self::from_toml_str(&content)
    }

    /// Overlay another set on this one, class by class
    pub fn extend(&mut self, other: MappingSet) -> std::result::Result<(), MappingError> {
        for map in other.maps.into_values() {
            self.insert(map)?;
        }
        Ok(())
    }
}
