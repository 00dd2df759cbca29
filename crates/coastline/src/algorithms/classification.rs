use crate::{
    catalog::FeatureCatalog,
    traits::CategoryLookup,
    types::{Segment, SubType},
};

/// What the classifier needs to know about the caller's feature catalog
#[derive(Clone, Copy)]
pub struct ClassificationContext<'a> {
    pub construction_class: &'a str,
    pub lookup: &'a dyn CategoryLookup,
}

impl<'a> From<&'a FeatureCatalog> for ClassificationContext<'a> {
    fn from(catalog: &'a FeatureCatalog) -> Self {
        Self {
            construction_class: &catalog.construction_class,
            lookup: catalog,
        }
    }
}

/// Closed segments are islands; segments with shoreline-construction
/// provenance resolve through the category lookup (falling back to wharf);
/// everything else is mainland.
pub fn classify_coastline_type(segment: &Segment, context: ClassificationContext<'_>) -> SubType {
    if segment.is_closed() {
        return SubType::Island;
    }

    if segment.source_features.contains(context.construction_class) {
        return segment
            .category
            .and_then(|code| context.lookup.subtype_for(code))
            .unwrap_or(SubType::Wharf);
    }

    SubType::Mainland
}

/// Classify every segment, returning new annotated instances
pub fn classify_segments(segments: &[Segment], context: ClassificationContext<'_>) -> Vec<Segment> {
    segments
        .iter()
        .map(|segment| {
            let sub_type = classify_coastline_type(segment, context);
            segment.clone().with_sub_type(sub_type)
        })
        .collect()
}
