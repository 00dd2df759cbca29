use std::path::Path;

use geo_types::Polygon;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use crate::{
    error::Result,
    geometry::polygon_from_ring,
    typed_geojson::{CoastlineGeoJson, CoastlineProperties, TypedFeature, TypedFeatureCollection},
    types::{AnnotatedCoastline, CoastlineResult},
};

fn line_geometry(coastline: &AnnotatedCoastline) -> Geometry {
    Geometry::new(Value::LineString(
        coastline.segment.coordinates.iter().map(|&[lon, lat]| vec![lon, lat]).collect(),
    ))
}

impl CoastlineResult {
    fn foreign_members(&self) -> Result<JsonObject> {
        let mut foreign_members = JsonObject::new();
        foreign_members.insert("coastline_count".to_string(), serde_json::Value::from(self.coastlines.len()));
        foreign_members.insert("gap_count".to_string(), serde_json::Value::from(self.gaps.len()));
        foreign_members.insert("stats".to_string(), serde_json::to_value(&self.stats)?);
        Ok(foreign_members)
    }

    /// Export to typed GeoJSON format
    pub fn to_typed_geojson(&self) -> Result<CoastlineGeoJson> {
        let features = self
            .coastlines
            .iter()
            .enumerate()
            .map(|(i, coastline)| {
                TypedFeature::new(
                    Some(line_geometry(coastline)),
                    CoastlineProperties::from_coastline(i as u32, coastline),
                )
            })
            .collect();

        Ok(CoastlineGeoJson::FeatureCollection(TypedFeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(self.foreign_members()?),
        }))
    }

    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let mut features = Vec::with_capacity(self.coastlines.len());

        for (i, coastline) in self.coastlines.iter().enumerate() {
            let properties = serde_json::to_value(CoastlineProperties::from_coastline(i as u32, coastline))?;
            features.push(Feature {
                bbox: None,
                geometry: Some(line_geometry(coastline)),
                id: Some(geojson::feature::Id::Number(serde_json::Number::from(i))),
                properties: properties.as_object().cloned(),
                foreign_members: None,
            });
        }

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(self.foreign_members()?),
        })
    }

    /// Export to GeoJSON and serialize to JSON string
    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    /// Save GeoJSON to file
    pub fn save_geojson(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }
}

/// Parse input features from a FeatureCollection, a single Feature or a bare Geometry
pub fn features_from_geojson_str(geojson_str: &str) -> Result<Vec<Feature>> {
    let features = match geojson_str.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    };
    Ok(features)
}

/// Load input features from a GeoJSON file
pub fn load_features_from_file(path: impl AsRef<Path>) -> Result<Vec<Feature>> {
    let geojson_str = std::fs::read_to_string(path)?;
    features_from_geojson_str(&geojson_str)
}

/// Exterior rings of every Polygon and MultiPolygon geometry, regardless of class
pub fn polygons_from_features(features: &[Feature]) -> Vec<Polygon<f64>> {
    let mut polygons = Vec::new();
    for feature in features {
        let Some(geometry) = feature.geometry.as_ref() else {
            continue;
        };
        let rings: Vec<&Vec<Vec<f64>>> = match &geometry.value {
            Value::Polygon(rings) => rings.first().into_iter().collect(),
            Value::MultiPolygon(polygons) => polygons.iter().filter_map(|rings| rings.first()).collect(),
            _ => continue,
        };
        for ring in rings {
            let coords: Option<Vec<[f64; 2]>> = ring
                .iter()
                .map(|position| match position.as_slice() {
                    [x, y, ..] => Some([*x, *y]),
                    _ => None,
                })
                .collect();
            if let Some(coords) = coords.filter(|coords| coords.len() >= 4) {
                polygons.push(polygon_from_ring(&coords));
            }
        }
    }
    polygons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        algorithms::CoastlineProcessor,
        types::{Segment, SourceKind, SubType},
    };

    fn sample_result() -> CoastlineResult {
        let segments = vec![
            Segment::new(vec![[0.0, 0.0], [0.01, 0.0]], SourceKind::Explicit, "COALNE")
                .with_sub_type(SubType::Mainland),
            Segment::new(
                vec![[1.0, 1.0], [1.01, 1.0], [1.01, 1.01], [1.0, 1.0]],
                SourceKind::Derived,
                "LNDARE",
            )
            .with_sub_type(SubType::Island),
        ];
        CoastlineResult {
            coastlines: CoastlineProcessor::default().process_all(&segments, &[]),
            ..CoastlineResult::default()
        }
    }

    #[test]
    fn test_geojson_export() {
        let collection = sample_result().to_geojson().expect("Should export GeoJSON");
        assert_eq!(collection.features.len(), 2);

        let first = &collection.features[0];
        assert!(matches!(
            first.geometry.as_ref().map(|g| &g.value),
            Some(Value::LineString(coords)) if coords.len() == 2
        ));
        let properties = first.properties.as_ref().expect("Should have properties");
        assert_eq!(properties["sub_type"], "mainland");
        assert_eq!(properties["source_features"][0], "COALNE");

        let foreign = collection.foreign_members.as_ref().expect("Should have foreign members");
        assert_eq!(foreign["coastline_count"], 2);
        assert!(foreign.contains_key("stats"));
    }

    #[test]
    fn test_typed_geojson_queries() {
        let typed = sample_result().to_typed_geojson().expect("Should export typed GeoJSON");
        assert_eq!(typed.features_by_sub_type(SubType::Island).len(), 1);
        assert_eq!(typed.continuous_features().len(), 1);
        assert_eq!(typed.coastline_count(), Some(2));
        assert!(typed.stats().is_some());

        let longest = typed.longest_feature().expect("Should find longest feature");
        let props = longest.properties().expect("Should have typed properties");
        assert_eq!(props.sub_type, Some(SubType::Island));
    }

    #[test]
    fn test_geojson_string_parses_back() {
        let json = sample_result().to_geojson_string().expect("Should serialize");
        let features = features_from_geojson_str(&json).expect("Should parse back");
        assert_eq!(features.len(), 2);
    }

    #[test]
    fn test_features_from_single_geometry() {
        let features = features_from_geojson_str(r#"{"type":"LineString","coordinates":[[0,0],[1,1]]}"#)
            .expect("Should parse bare geometry");
        assert_eq!(features.len(), 1);
        assert!(features[0].properties.is_none());
    }

    #[test]
    fn test_polygons_from_features() {
        let features = features_from_geojson_str(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{},"geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1],[0,0]]]}},
                {"type":"Feature","properties":{},"geometry":{"type":"MultiPolygon","coordinates":[[[[2,2],[3,2],[3,3],[2,2]]],[[[4,4],[5,4],[5,5],[4,4]]]]}},
                {"type":"Feature","properties":{},"geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]}}
            ]}"#,
        )
        .expect("Should parse collection");
        assert_eq!(polygons_from_features(&features).len(), 3);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = std::env::temp_dir().join(format!("coastline_io_test_{}.geojson", std::process::id()));
        sample_result().save_geojson(&path).expect("Should save GeoJSON");
        let features = load_features_from_file(&path).expect("Should load GeoJSON");
        assert_eq!(features.len(), 2);
        let _ = std::fs::remove_file(&path);
    }
}
