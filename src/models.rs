// Core data structures for briefscope

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Delimiter used by the harvester to join multi-valued fields
pub const MULTI_VALUE_DELIMITER: char = '|';

static PERIOD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})Q([1-4])$").expect("valid period regex"));

/// Year-quarter bucket formatted as `YYYYQn`
///
/// Ordering is chronological, which also matches the lexicographic order of
/// the formatted string because the year is zero-padded to four digits and the
/// quarter is a single digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: u16,
    quarter: u8,
}

impl Period {
    /// Create a period, returning `None` for a quarter outside 1..=4
    /// or a year that does not fit four digits
    #[must_use]
    pub fn new(year: i32, quarter: u32) -> Option<Self> {
        if !(1..=4).contains(&quarter) || !(0..=9999).contains(&year) {
            return None;
        }
        Some(Self {
            year: year as u16,
            quarter: quarter as u8,
        })
    }

    /// Period containing the given calendar date
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), (date.month() - 1) / 3 + 1)
    }

    pub fn year(&self) -> i32 {
        i32::from(self.year)
    }

    pub fn quarter(&self) -> u32 {
        u32::from(self.quarter)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}Q{}", self.year, self.quarter)
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = PERIOD_REGEX
            .captures(s.trim())
            .ok_or_else(|| format!("invalid period '{s}', expected YYYYQn"))?;
        let year: i32 = caps[1].parse().map_err(|_| format!("invalid year in '{s}'"))?;
        let quarter: u32 = caps[2]
            .parse()
            .map_err(|_| format!("invalid quarter in '{s}'"))?;
        Self::new(year, quarter).ok_or_else(|| format!("invalid period '{s}'"))
    }
}

impl Serialize for Period {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse an ISO partial issued date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`)
///
/// A bare year resolves to January 1st, a year-month to the first of the month.
/// A full date may carry a time component after `T` or a space. Anything else,
/// including out-of-range months, is unparseable.
pub fn parse_issued_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    match raw.len() {
        4 if raw.bytes().all(|b| b.is_ascii_digit()) => {
            NaiveDate::from_ymd_opt(raw.parse().ok()?, 1, 1)
        }
        7 => NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok(),
        n if n >= 10 => {
            let (date, rest) = raw.split_at_checked(10)?;
            if !(rest.is_empty() || rest.starts_with('T') || rest.starts_with(' ')) {
                return None;
            }
            NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
        }
        _ => None,
    }
}

/// Split a harvester multi-value field into trimmed, non-empty values
pub fn split_multi(value: &str) -> Vec<String> {
    value
        .split(MULTI_VALUE_DELIMITER)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

/// Normalized surface form assigned at load time
pub fn normalize_surface(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Closed-vocabulary tag classes stored in `brief_tags`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TagType {
    #[serde(rename = "sdg")]
    Sdg,
    #[serde(rename = "impactArea")]
    ImpactArea,
    #[serde(rename = "actionArea")]
    ActionArea,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sdg => "sdg",
            Self::ImpactArea => "impactArea",
            Self::ActionArea => "actionArea",
        }
    }

    /// Source column in the flat record table
    pub fn column(&self) -> &'static str {
        match self {
            Self::Sdg => "cg_subject_sdg",
            Self::ImpactArea => "cg_subject_impactArea",
            Self::ActionArea => "cg_subject_actionArea",
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Sdg, Self::ImpactArea, Self::ActionArea]
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|t| t.as_str() == s)
    }
}

/// Geographic term classes stored in `geo`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeoType {
    Country,
    Region,
    Subregion,
}

impl GeoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Country => "country",
            Self::Region => "region",
            Self::Subregion => "subregion",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Country => "cg_coverage_country",
            Self::Region => "cg_coverage_region",
            Self::Subregion => "cg_coverage_subregion",
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Country, Self::Region, Self::Subregion]
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|t| t.as_str() == s)
    }
}

/// Funding and program entity classes stored in `funding_entities`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FundingType {
    #[serde(rename = "donor")]
    Donor,
    #[serde(rename = "initiative")]
    Initiative,
    #[serde(rename = "programAccelerator")]
    ProgramAccelerator,
    #[serde(rename = "crp")]
    Crp,
    #[serde(rename = "project")]
    Project,
    #[serde(rename = "affiliation")]
    Affiliation,
}

impl FundingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Donor => "donor",
            Self::Initiative => "initiative",
            Self::ProgramAccelerator => "programAccelerator",
            Self::Crp => "crp",
            Self::Project => "project",
            Self::Affiliation => "affiliation",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Donor => "cg_contributor_donor",
            Self::Initiative => "cg_contributor_initiative",
            Self::ProgramAccelerator => "cg_contributor_programAccelerator",
            Self::Crp => "cg_contributor_crp",
            Self::Project => "cg_identifier_project",
            Self::Affiliation => "cg_contributor_affiliation",
        }
    }

    pub fn all() -> [Self; 6] {
        [
            Self::Donor,
            Self::Initiative,
            Self::ProgramAccelerator,
            Self::Crp,
            Self::Project,
            Self::Affiliation,
        ]
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::all().into_iter().find(|t| t.as_str() == s)
    }
}

/// Column holding free-text keywords
pub const KEYWORD_COLUMN: &str = "dcterms_subject";

/// Column holding the ordered author list
pub const AUTHOR_COLUMN: &str = "dc_contributor_author";

/// A publication record as stored in `briefs`, with its multi-valued
/// attributes already split into ordered sequences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublicationRecord {
    pub brief_id: String,
    pub uuid: String,
    pub uri: String,
    pub title: String,
    pub issued_date: String,
    pub year: Option<i32>,
    pub quarter: Option<u32>,
    pub period: Option<Period>,
    pub type_raw: String,
    pub abstract_text: String,
    pub language: String,
    pub publisher: String,
    pub series: String,
    pub access_rights: String,
    pub license: String,
    pub cg_number: String,
    pub review_status: String,
    pub last_harvested_at: String,

    pub keywords: Vec<String>,
    pub authors: Vec<String>,
    pub geo: Vec<(GeoType, String)>,
    pub funding: Vec<(FundingType, String)>,
    pub tags: Vec<(TagType, String)>,
}

impl PublicationRecord {
    /// Build a record from one flat harvester row
    ///
    /// Returns `None` when the row has no `brief_id`.
    pub fn from_flat(row: &HashMap<String, String>) -> Option<Self> {
        let field = |name: &str| row.get(name).map(|v| v.trim().to_string()).unwrap_or_default();
        let multi = |name: &str| row.get(name).map(|v| split_multi(v)).unwrap_or_default();

        let brief_id = field("brief_id");
        if brief_id.is_empty() {
            return None;
        }

        let issued_date = field("issued_date");
        let explicit_period = row
            .get("year_quarter")
            .and_then(|v| v.parse::<Period>().ok());
        let period = explicit_period
            .or_else(|| parse_issued_date(&issued_date).and_then(Period::from_date));

        let year = row
            .get("year")
            .and_then(|v| parse_int_like(v))
            .or_else(|| period.map(|p| p.year()));
        let quarter = row
            .get("quarter")
            .and_then(|v| parse_int_like(v))
            .and_then(|q| u32::try_from(q).ok())
            .or_else(|| period.map(|p| p.quarter()));

        let geo = GeoType::all()
            .into_iter()
            .flat_map(|t| multi(t.column()).into_iter().map(move |v| (t, v)))
            .collect();
        let funding = FundingType::all()
            .into_iter()
            .flat_map(|t| multi(t.column()).into_iter().map(move |v| (t, v)))
            .collect();
        let tags = TagType::all()
            .into_iter()
            .flat_map(|t| multi(t.column()).into_iter().map(move |v| (t, v)))
            .collect();

        let review_status = row
            .get("cg_reviewStatus")
            .or_else(|| row.get("cg_review_status"))
            .map(|v| v.trim().to_string())
            .unwrap_or_default();

        Some(Self {
            brief_id,
            uuid: field("uuid"),
            uri: field("uri"),
            title: field("title"),
            issued_date,
            year,
            quarter,
            period,
            type_raw: field("type_raw"),
            abstract_text: field("abstract"),
            language: field("language"),
            publisher: field("publisher"),
            series: field("series_raw"),
            access_rights: field("access_rights"),
            license: field("license"),
            cg_number: field("cg_number"),
            review_status,
            last_harvested_at: field("last_harvested_at"),
            keywords: multi(KEYWORD_COLUMN),
            authors: multi(AUTHOR_COLUMN),
            geo,
            funding,
            tags,
        })
    }
}

// Dataframe exports may carry integers as "2023.0"
fn parse_int_like(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    raw.parse::<i32>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|f| f.fract() == 0.0).map(|f| f as i32))
}
