use std::marker::PhantomData;
use serde::{Deserialize, Serialize};
use geojson::{Geometry, JsonObject};
use ts_rs::TS;
use schemars::JsonSchema;

use crate::types::{AnnotatedCoastline, CoastType, ProcessingStats, SourceKind, SubType, WaterSide};

/// Properties for coastline features
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS, JsonSchema)]
#[ts(export)]
#[schemars(description = "Properties for reconstructed coastline features")]
pub struct CoastlineProperties {
    #[schemars(description = "Position of the coastline in the result")]
    pub id: u32,
    #[schemars(description = "Natural or constructed shoreline, when known")]
    pub coast_type: Option<CoastType>,
    #[schemars(description = "Mainland, island, pier, wharf or seawall")]
    pub sub_type: Option<SubType>,
    #[schemars(description = "Explicit shoreline feature or derived area boundary")]
    pub source: SourceKind,
    #[schemars(description = "Feature classes that contributed to the coastline")]
    pub source_features: Vec<String>,
    pub stitched: bool,
    #[schemars(description = "Number of input segments joined into this coastline")]
    pub merged_count: usize,
    #[schemars(description = "Number of synthesized gap fills")]
    pub gap_count: usize,
    pub gap_filled: bool,
    #[schemars(description = "Side of the line, in drawing direction, that is water")]
    pub water_side: WaterSide,
    #[schemars(description = "Whether the coastline closes on itself")]
    pub continuous: bool,
    #[schemars(description = "Length in meters")]
    pub length_m: f64,
    #[schemars(description = "Length in nautical miles")]
    pub length_nm: f64,
    #[schemars(description = "Mean bearing in degrees")]
    pub orientation: f64,
    pub point_count: usize,
}

impl CoastlineProperties {
    pub fn from_coastline(id: u32, coastline: &AnnotatedCoastline) -> Self {
        let segment = &coastline.segment;
        Self {
            id,
            coast_type: segment.coast_type,
            sub_type: segment.sub_type,
            source: segment.source,
            source_features: segment.source_features.iter().cloned().collect(),
            stitched: segment.stitched,
            merged_count: segment.merged_count,
            gap_count: segment.gap_count,
            gap_filled: segment.gap_filled,
            water_side: coastline.water_side,
            continuous: coastline.continuous,
            length_m: coastline.metrics.length_m,
            length_nm: coastline.metrics.length_nm,
            orientation: coastline.metrics.orientation,
            point_count: segment.point_count(),
        }
    }
}

/// Type alias for coastline GeoJSON
pub type CoastlineGeoJson = TypedGeoJson<CoastlineProperties>;

/// A typed GeoJSON Feature that is generic over its properties.
#[derive(Serialize, Deserialize, Debug)]
pub struct TypedFeature<P> {
    #[serde(flatten)]
    pub feature: geojson::Feature,
    #[serde(skip)]
    _properties: PhantomData<P>,
}

impl<P> TypedFeature<P>
where
    for<'de> P: Serialize + Deserialize<'de>,
{
    /// Creates a new TypedFeature.
    pub fn new(geometry: Option<Geometry>, properties: P) -> Self {
        let feature = geojson::Feature {
            bbox: None,
            geometry,
            id: None,
            properties: serde_json::to_value(properties).ok().and_then(|v| v.as_object().cloned()),
            foreign_members: None,
        };
        Self {
            feature,
            _properties: PhantomData,
        }
    }

    /// Tries to access the typed properties of the feature.
    pub fn properties(&self) -> Option<P> {
        self.feature.properties.as_ref().and_then(|p| {
            serde_json::from_value(serde_json::Value::Object(p.clone())).ok()
        })
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct TypedFeatureCollection<P> {
    pub bbox: Option<Vec<f64>>,
    pub features: Vec<TypedFeature<P>>,
    pub foreign_members: Option<JsonObject>,
}

#[derive(Serialize, Deserialize, Debug)]
pub enum TypedGeoJson<P> {
    Geometry(Geometry),
    Feature(TypedFeature<P>),
    FeatureCollection(TypedFeatureCollection<P>),
}

impl<P> TypedGeoJson<P> {
    /// Get the underlying FeatureCollection if this is a FeatureCollection variant
    pub fn as_feature_collection(&self) -> Option<&TypedFeatureCollection<P>> {
        match self {
            TypedGeoJson::FeatureCollection(fc) => Some(fc),
            _ => None,
        }
    }

    /// Convert to FeatureCollection, consuming self
    pub fn into_feature_collection(self) -> Option<TypedFeatureCollection<P>> {
        match self {
            TypedGeoJson::FeatureCollection(fc) => Some(fc),
            _ => None,
        }
    }
}

impl<P> TypedFeatureCollection<P> {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[TypedFeature<P>] {
        &self.features
    }
}

impl CoastlineGeoJson {
    fn features_where(&self, keep: impl Fn(&CoastlineProperties) -> bool) -> Vec<&TypedFeature<CoastlineProperties>> {
        match self.as_feature_collection() {
            Some(fc) => fc
                .features
                .iter()
                .filter(|feature| feature.properties().is_some_and(|props| keep(&props)))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Get features of one coastline subtype
    pub fn features_by_sub_type(&self, sub_type: SubType) -> Vec<&TypedFeature<CoastlineProperties>> {
        self.features_where(|props| props.sub_type == Some(sub_type))
    }

    /// Get closed (continuous) coastlines
    pub fn continuous_features(&self) -> Vec<&TypedFeature<CoastlineProperties>> {
        self.features_where(|props| props.continuous)
    }

    /// Get the longest coastline
    pub fn longest_feature(&self) -> Option<&TypedFeature<CoastlineProperties>> {
        self.as_feature_collection()?.features.iter().max_by(|a, b| {
            let length_a = a.properties().map(|p| p.length_m).unwrap_or(0.0);
            let length_b = b.properties().map(|p| p.length_m).unwrap_or(0.0);
            length_a.total_cmp(&length_b)
        })
    }

    /// Get processing statistics from foreign members
    pub fn stats(&self) -> Option<ProcessingStats> {
        let foreign = self.as_feature_collection()?.foreign_members.as_ref()?;
        serde_json::from_value(foreign.get("stats")?.clone()).ok()
    }

    /// Get coastline count from foreign members
    pub fn coastline_count(&self) -> Option<usize> {
        self.as_feature_collection()?
            .foreign_members
            .as_ref()
            .and_then(|foreign| foreign.get("coastline_count"))
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
    }
}
