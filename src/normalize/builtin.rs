//! Stock mapping tables observed in the brief collection
//!
//! SDG and impact area labels differ only in casing and conjunctions across
//! submission forms. Keywords mix English and Spanish, singular and plural,
//! and a few harvester artifacts where two subject terms were glued with `-`.

use super::{AttributeClass, CanonicalMap, MappingError, MappingSet};
use crate::models::TagType;

pub const SDG_MAP: &[(&str, &str)] = &[
    ("SDG 1 - No Poverty", "SDG 1 - No poverty"),
    ("SDG 2 - Zero Hunger", "SDG 2 - Zero hunger"),
    ("SDG 3 - Good Health and Well-Being", "SDG 3 - Good health and well-being"),
    ("SDG 4 - Quality Education", "SDG 4 - Quality education"),
    ("SDG 5 - Gender Equality", "SDG 5 - Gender equality"),
    ("SDG 6 - Clean Water and Sanitation", "SDG 6 - Clean water and sanitation"),
    ("SDG 7 - Affordable and Clean Energy", "SDG 7 - Affordable and clean energy"),
    ("SDG 8 - Decent Work and Economic Growth", "SDG 8 - Decent work and economic growth"),
    (
        "SDG 9 - Industry, Innovation and Infrastructure",
        "SDG 9 - Industry, innovation and infrastructure",
    ),
    ("SDG 10 - Reduce Inequalities", "SDG 10 - Reduced inequalities"),
    ("SDG 10 - Reduced Inequality", "SDG 10 - Reduced inequalities"),
    (
        "SDG 11 - Sustainable Cities and Communities",
        "SDG 11 - Sustainable cities and communities",
    ),
    (
        "SDG 12 - Responsible Consumption and Production",
        "SDG 12 - Responsible consumption and production",
    ),
    (
        "SDG 12 - Responsible production and consumption",
        "SDG 12 - Responsible consumption and production",
    ),
    ("SDG 13 - Climate Action", "SDG 13 - Climate action"),
    ("SDG 14 - Life Below Water", "SDG 14 - Life below water"),
    ("SDG 15 - Life on Land", "SDG 15 - Life on land"),
    (
        "SDG 16 - Peace, Justice and Strong Institutions",
        "SDG 16 - Peace, justice and strong institutions",
    ),
    ("SDG 17 - Partnerships for the Goals", "SDG 17 - Partnerships for the goals"),
];

pub const IMPACT_AREA_MAP: &[(&str, &str)] = &[
    ("Climate adaptation & mitigation", "Climate adaptation and mitigation"),
    ("Environmental health & biodiversity", "Environmental health and biodiversity"),
    ("Nutrition, health & food security", "Nutrition, health and food security"),
    ("Nutrition, health, and food security", "Nutrition, health and food security"),
    ("Poverty reduction, livelihoods & jobs", "Poverty reduction, livelihoods and jobs"),
    (
        "Gender equality, youth & social inclusion",
        "Gender equality, youth and social inclusion",
    ),
];

pub const KEYWORD_MAP: &[(&str, &str)] = &[
    // climate change
    ("climatic change", "climate change"),
    ("cambio climático", "climate change"),
    ("climate change impacts", "climate change"),
    ("climate change impact", "climate change"),
    // climate smart agriculture
    ("climate-smart agriculture", "climate smart agriculture"),
    (
        "climate smart agriculture-climate smart agriculture",
        "climate smart agriculture",
    ),
    // gender
    ("gender equity", "gender equality"),
    ("gender mainstreaming", "gender equality"),
    ("gender-responsive approaches", "gender equality"),
    ("gender-transformative approaches", "gender equality"),
    // food security
    ("seguridad alimentaria", "food security"),
    ("food insecurity", "food security"),
    // agrifood systems
    ("agrifood system", "agrifood systems"),
    ("sistema alimentario", "agrifood systems"),
    ("resiliencia al clima", "climate resilience"),
    ("cadena de valor", "value chains"),
    // livestock
    ("ganadería", "livestock"),
    ("livestock production", "livestock"),
    ("livestock systems", "livestock"),
    // sustainability
    ("sostenibilidad", "sustainability"),
    ("sustainable development", "sustainability"),
    ("agroecología", "agroecology"),
    ("deforestación", "deforestation"),
    // nutrition
    ("nutrición", "nutrition"),
    ("malnutrition", "nutrition"),
    // capacity
    ("capacity building", "capacity development"),
    ("capacity development-capacity building", "capacity development"),
    // innovation scaling
    ("innovation scaling", "scaling of innovations"),
    ("innovation scaling-scaling of innovations", "scaling of innovations"),
    ("climate services-climate information services", "climate services"),
    ("financiación relacionada con el cambio climático", "climate finance"),
    ("seguimiento y evaluación", "monitoring and evaluation"),
    ("evaluación", "evaluation"),
    ("evaluación de capacidades", "capacity assessment"),
    ("mitigación del cambio climático", "climate change mitigation"),
    ("gas de efecto invernadero", "greenhouse gas emissions"),
    ("proyecto", "project design"),
    // women
    ("women farmers", "women"),
    ("women's empowerment", "empowerment"),
    ("women's participation", "women"),
    ("decision-making", "decision making"),
    ("decision support systems", "decision-support systems"),
    ("leche", "milk"),
];

/// The stock tables as a validated set
pub fn builtin_mappings() -> Result<MappingSet, MappingError> {
    let mut set = MappingSet::new();
    set.insert(CanonicalMap::new(
        AttributeClass::Tag(TagType::Sdg),
        SDG_MAP.iter().copied(),
    )?)?;
    set.insert(CanonicalMap::new(
        AttributeClass::Tag(TagType::ImpactArea),
        IMPACT_AREA_MAP.iter().copied(),
    )?)?;
    set.insert(CanonicalMap::new(
        AttributeClass::Keyword,
        KEYWORD_MAP.iter().copied(),
    )?)?;
    Ok(set)
}
