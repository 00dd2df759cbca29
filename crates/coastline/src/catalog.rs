//! Feature-class vocabulary of the chart feature source.
//!
//! The defaults follow S-57 object and attribute acronyms. Callers targeting
//! another chart specification (or a different construction-category table)
//! supply their own [`FeatureCatalog`].

use geojson::{Feature, JsonObject, JsonValue};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{traits::CategoryLookup, types::SubType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FeatureCatalog {
    /// Property holding the feature-class identifier
    pub class_key: String,
    pub coastline_class: String,
    pub construction_class: String,
    pub depth_area_class: String,
    pub land_area_class: String,
    /// Property holding the minimum depth of an area
    pub min_depth_key: String,
    /// Property holding the shoreline-construction category code
    pub category_key: String,
    /// Construction category code to subtype
    pub category_subtypes: Vec<CategoryMapping>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CategoryMapping {
    pub code: u32,
    pub sub_type: SubType,
}

impl Default for FeatureCatalog {
    fn default() -> Self {
        let piers = [4, 5, 6].map(|code| (code, SubType::Pier));
        let seawalls = [1, 2, 3, 7, 8, 9, 10].map(|code| (code, SubType::Seawall));
        let wharves = (11..=17).map(|code| (code, SubType::Wharf));
        let mut category_subtypes: Vec<CategoryMapping> = piers
            .into_iter()
            .chain(seawalls)
            .chain(wharves)
            .map(|(code, sub_type)| CategoryMapping { code, sub_type })
            .collect();
        category_subtypes.sort_by_key(|mapping| mapping.code);

        Self {
            class_key: "_featureType".to_string(),
            coastline_class: "COALNE".to_string(),
            construction_class: "SLCONS".to_string(),
            depth_area_class: "DEPARE".to_string(),
            land_area_class: "LNDARE".to_string(),
            min_depth_key: "DRVAL1".to_string(),
            category_key: "CATSLC".to_string(),
            category_subtypes,
        }
    }
}

impl FeatureCatalog {
    /// Feature-class identifier of a feature, if present
    pub fn feature_class<'a>(&self, feature: &'a Feature) -> Option<&'a str> {
        feature
            .properties
            .as_ref()
            .and_then(|props| props.get(&self.class_key))
            .and_then(JsonValue::as_str)
    }

    pub fn min_depth(&self, feature: &Feature) -> Option<f64> {
        numeric_property(feature.properties.as_ref()?, &self.min_depth_key)
    }

    pub fn category(&self, feature: &Feature) -> Option<u32> {
        let value = numeric_property(feature.properties.as_ref()?, &self.category_key)?;
        (value >= 0.0 && value.fract() == 0.0).then_some(value as u32)
    }
}

impl CategoryLookup for FeatureCatalog {
    fn subtype_for(&self, category: u32) -> Option<SubType> {
        self.category_subtypes
            .iter()
            .find(|mapping| mapping.code == category)
            .map(|mapping| mapping.sub_type)
    }
}

/// Read a number that may have been encoded as a JSON number or a numeric string
fn numeric_property(props: &JsonObject, key: &str) -> Option<f64> {
    match props.get(key)? {
        JsonValue::Number(n) => n.as_f64(),
        // S-57 list attributes arrive as comma separated strings; the first entry wins
        JsonValue::String(s) => s.split(',').next()?.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(properties: JsonValue) -> Feature {
        Feature {
            bbox: None,
            geometry: None,
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        }
    }

    #[test]
    fn test_default_table_maps_code_six_to_pier() {
        let catalog = FeatureCatalog::default();
        assert_eq!(catalog.subtype_for(6), Some(SubType::Pier));
        assert_eq!(catalog.subtype_for(10), Some(SubType::Seawall));
        assert_eq!(catalog.subtype_for(15), Some(SubType::Wharf));
        assert_eq!(catalog.subtype_for(99), None);
    }

    #[test]
    fn test_reads_class_and_numeric_properties() {
        let catalog = FeatureCatalog::default();
        let f = feature(json!({ "_featureType": "DEPARE", "DRVAL1": 0, "CATSLC": "6" }));
        assert_eq!(catalog.feature_class(&f), Some("DEPARE"));
        assert_eq!(catalog.min_depth(&f), Some(0.0));
        assert_eq!(catalog.category(&f), Some(6));
    }

    #[test]
    fn test_list_attribute_uses_first_entry() {
        let catalog = FeatureCatalog::default();
        let f = feature(json!({ "CATSLC": "10,6" }));
        assert_eq!(catalog.category(&f), Some(10));
    }

    #[test]
    fn test_missing_properties() {
        let catalog = FeatureCatalog::default();
        let f = feature(json!({}));
        assert_eq!(catalog.feature_class(&f), None);
        assert_eq!(catalog.min_depth(&f), None);
        assert_eq!(catalog.category(&f), None);
    }

    #[test]
    fn test_catalog_deserializes_with_defaults() {
        let catalog: FeatureCatalog = serde_json::from_value(json!({ "coastline_class": "COAST" }))
            .expect("Should deserialize partial catalog");
        assert_eq!(catalog.coastline_class, "COAST");
        assert_eq!(catalog.land_area_class, "LNDARE");
    }
}
