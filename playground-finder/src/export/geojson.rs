//! Export GeoJSON (WGS84) des équipements visibles

use std::path::Path;

use ::geojson::feature::Id;
use ::geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use anyhow::{Context, Result};
use facility_map::Facility;
use geo::Point;

/// Construit une FeatureCollection de points
pub fn to_feature_collection(facilities: &[&Facility]) -> FeatureCollection {
    let features = facilities.iter().map(|f| to_feature(f)).collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn to_feature(facility: &Facility) -> Feature {
    let point = Point::from(facility.position());

    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), JsonValue::from(facility.name.clone()));
    properties.insert(
        "description".to_string(),
        JsonValue::from(facility.description.clone()),
    );
    properties.insert(
        "category".to_string(),
        JsonValue::from(facility.category.as_str()),
    );
    properties.insert("is_free".to_string(), JsonValue::from(facility.is_free));
    properties.insert(
        "has_night_light".to_string(),
        JsonValue::from(facility.has_night_light),
    );
    properties.insert("has_parking".to_string(), JsonValue::from(facility.has_parking));
    if facility.inferred.any() {
        // Valeurs estimées, pas issues de la source
        let inferred = serde_json::to_value(facility.inferred).unwrap_or(JsonValue::Null);
        properties.insert("inferred".to_string(), inferred);
    }

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(::geojson::Value::from(&point))),
        id: Some(Id::String(facility.id.clone())),
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Écrit les équipements dans un fichier GeoJSON
pub fn export_to_geojson(facilities: &[&Facility], output_path: &Path) -> Result<()> {
    let collection = to_feature_collection(facilities);
    let json = serde_json::to_string_pretty(&collection)?;

    std::fs::write(output_path, json)
        .context(format!("Failed to create file: {}", output_path.display()))?;

    Ok(())
}
