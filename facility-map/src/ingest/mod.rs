//! Normalisation des réponses de la source de données
//!
//! La source publique (« 전국체육시설현황 ») renvoie des formes variables:
//! `response.body.items.item`, `items`, un objet seul au lieu d'une liste,
//! des coordonnées en texte. Ce module ramène tout cela à des
//! [`FacilityRecord`], et fournit le jeu d'échantillons de repli.

pub mod attributes;

use serde_json::Value;
use tracing::{debug, info};

pub use attributes::AttributeSeed;

use crate::types::{Category, FacilityRecord, InferredFields};
use crate::FacilityError;

use attributes::{AMENITY_PROBABILITY, FREE_PROBABILITY};

const ID_KEYS: &[&str] = &["fclty_id", "fcltyId", "id"];
const NAME_KEYS: &[&str] = &["fclty_nm", "fcltyNm", "facilName", "name"];
const TYPE_KEYS: &[&str] = &["fclty_cl_nm", "fclty_type", "type", "category"];
const LAT_KEYS: &[&str] = &["fclty_la", "lat", "latitude"];
const LNG_KEYS: &[&str] = &["fclty_lo", "lng", "longitude"];
const ADDRESS_KEYS: &[&str] = &["rdnmadr_nm", "addr", "fclty_road_nm_addr", "description"];

const DEFAULT_NAME: &str = "Unnamed facility";
const DEFAULT_DESCRIPTION: &str = "No address information";

/// Jeu d'échantillons embarqué (sept équipements autour de Séoul)
const SAMPLE_JSON: &str = include_str!("sample.json");

/// Parse une réponse texte et la normalise en enregistrements
///
/// # Errors
///
/// - [`FacilityError::Parse`] si le texte n'est pas du JSON (réponse XML, CORS…)
/// - [`FacilityError::EmptyResponse`] si aucun élément n'est trouvé
pub fn normalize_response(
    text: &str,
    seed: &AttributeSeed,
) -> Result<Vec<FacilityRecord>, FacilityError> {
    let data: Value = serde_json::from_str(text)?;
    let items = extract_items(&data);

    match items.first() {
        None => return Err(FacilityError::EmptyResponse),
        Some(first) if !is_truthy(first) => return Err(FacilityError::EmptyResponse),
        Some(_) => {}
    }

    let records = normalize_items(&items, seed);
    info!(items = records.len(), "Normalized source response");
    Ok(records)
}

/// Normalise une liste d'éléments bruts
pub fn normalize_items(items: &[Value], seed: &AttributeSeed) -> Vec<FacilityRecord> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| normalize_item(index, item, seed))
        .collect()
}

/// Retourne les enregistrements de repli embarqués
pub fn sample_records() -> Result<Vec<FacilityRecord>, FacilityError> {
    let records: Vec<FacilityRecord> = serde_json::from_str(SAMPLE_JSON)?;
    debug!(count = records.len(), "Loaded embedded sample facilities");
    Ok(records)
}

/// Extrait la liste d'éléments quelle que soit la forme de la réponse
fn extract_items(data: &Value) -> Vec<Value> {
    let found = data
        .pointer("/response/body/items/item")
        .filter(|v| is_truthy(v))
        .or_else(|| data.get("items").filter(|v| is_truthy(v)));

    match found {
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
        None => match data {
            Value::Array(items) => items.clone(),
            _ => Vec::new(),
        },
    }
}

fn normalize_item(index: usize, item: &Value, seed: &AttributeSeed) -> FacilityRecord {
    let id = field_str(item, ID_KEYS).unwrap_or_else(|| format!("API_{}", index));
    let name_field = field_str(item, NAME_KEYS);
    let raw_type = field_str(item, TYPE_KEYS).unwrap_or_default();

    let mut inferred = InferredFields::default();

    let is_free = match name_field.as_deref() {
        Some(name) if name_says_free(name) => true,
        _ => {
            inferred.is_free = true;
            seed.flag(&id, "free", FREE_PROBABILITY)
        }
    };

    inferred.has_night_light = true;
    inferred.has_parking = true;
    let has_night_light = seed.flag(&id, "night_light", AMENITY_PROBABILITY);
    let has_parking = seed.flag(&id, "parking", AMENITY_PROBABILITY);

    FacilityRecord {
        name: name_field.unwrap_or_else(|| DEFAULT_NAME.to_string()),
        description: field_str(item, ADDRESS_KEYS)
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        category: parse_facility_type(&raw_type),
        is_free,
        has_night_light,
        has_parking,
        latitude: field_coordinate(item, LAT_KEYS),
        longitude: field_coordinate(item, LNG_KEYS),
        inferred,
        id,
    }
}

/// Déduit la catégorie du libellé de type de la source
pub fn parse_facility_type(raw: &str) -> Category {
    let raw = raw.trim();
    if raw.is_empty() {
        return Category::Other;
    }
    if raw.contains("농구") {
        Category::Basketball
    } else if raw.contains("풋살") || raw.contains("축구") {
        Category::Futsal
    } else if raw.contains("테니스") || raw.contains("배드민턴") {
        Category::Tennis
    } else if raw.contains("체육공원") || raw.contains("체력단련") {
        Category::HorizontalBar
    } else {
        raw.parse().unwrap_or(Category::Other)
    }
}

/// Les équipements de parc ou de plein air sont gratuits
fn name_says_free(name: &str) -> bool {
    name.contains("공원") || name.contains("야외")
}

/// Parse une coordonnée comme `parseFloat`: plus long préfixe numérique
pub fn parse_coordinate(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let (value, consumed) = fast_float::parse_partial::<f64, _>(trimmed).ok()?;
    if consumed == 0 || !value.is_finite() {
        return None;
    }
    Some(value)
}

/// Première valeur non vide parmi les clés, en texte
fn field_str(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find_map(|value| match value {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// Première valeur non vide parmi les clés, interprétée comme coordonnée
///
/// Une valeur présente mais illisible n'est pas remplacée par la clé
/// suivante: l'enregistrement sera rejeté par le store.
fn field_coordinate(item: &Value, keys: &[&str]) -> Option<f64> {
    let value = keys
        .iter()
        .filter_map(|key| item.get(*key))
        .find(|value| is_truthy(value))?;

    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_coordinate(s),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(true, |v| v != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}
