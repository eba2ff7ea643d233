//! Types de données pour le crate facility-map

use std::fmt;
use std::str::FromStr;

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};

use crate::FacilityError;

/// Coordonnée WGS84 (degrés)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Vérifie que les deux composantes sont des nombres finis
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Distance orthodromique en mètres
    pub fn distance_m(&self, other: &LatLng) -> f64 {
        Point::from(*self).haversine_distance(&Point::from(*other))
    }
}

impl From<LatLng> for Point<f64> {
    fn from(value: LatLng) -> Self {
        Point::new(value.lng, value.lat)
    }
}

impl FromStr for LatLng {
    type Err = FacilityError;

    /// Format attendu: `lat,lng`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| FacilityError::Parse(format!("expected 'lat,lng', got '{}'", s)))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| FacilityError::Parse(format!("{}: {}", v.trim(), e)))
        };
        let point = LatLng::new(parse(lat)?, parse(lng)?);
        if !point.is_finite() {
            return Err(FacilityError::Parse(format!("non-finite coordinate '{}'", s)));
        }
        Ok(point)
    }
}

/// Catégorie de l'équipement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Basketball,
    Futsal,
    Tennis,
    HorizontalBar,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Basketball,
        Category::Futsal,
        Category::Tennis,
        Category::HorizontalBar,
        Category::Other,
    ];

    /// Libellé affiché dans les overlays
    pub fn label(&self) -> &'static str {
        match self {
            Category::Basketball => "Basketball",
            Category::Futsal => "Futsal",
            Category::Tennis => "Tennis",
            Category::HorizontalBar => "Horizontal bar",
            Category::Other => "Other",
        }
    }

    /// Nom sérialisé (kebab-case)
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Basketball => "basketball",
            Category::Futsal => "futsal",
            Category::Tennis => "tennis",
            Category::HorizontalBar => "horizontal-bar",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = FacilityError;

    /// Accepte le nom kebab-case ou le libellé coréen des chips de l'UI
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basketball" | "농구" => Ok(Category::Basketball),
            "futsal" | "풋살" => Ok(Category::Futsal),
            "tennis" | "테니스" => Ok(Category::Tennis),
            "horizontal-bar" | "horizontal_bar" | "horizontalbar" | "철봉" => {
                Ok(Category::HorizontalBar)
            }
            "other" | "기타" => Ok(Category::Other),
            _ => Err(FacilityError::UnknownCategory(s.to_string())),
        }
    }
}

/// Attributs synthétisés (non issus de la source) pour un équipement
///
/// Ces valeurs sont des estimations de démonstration et ne doivent pas être
/// présentées comme des faits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InferredFields {
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub has_night_light: bool,
    #[serde(default)]
    pub has_parking: bool,
}

impl InferredFields {
    pub fn any(&self) -> bool {
        self.is_free || self.has_night_light || self.has_parking
    }
}

/// Enregistrement brut produit par une source, avant validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub is_free: bool,
    #[serde(default)]
    pub has_night_light: bool,
    #[serde(default)]
    pub has_parking: bool,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub inferred: InferredFields,
}

/// Un équipement validé, immuable une fois dans le store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub is_free: bool,
    pub has_night_light: bool,
    pub has_parking: bool,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub inferred: InferredFields,
}

impl Facility {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

impl TryFrom<FacilityRecord> for Facility {
    type Error = FacilityError;

    fn try_from(record: FacilityRecord) -> Result<Self, Self::Error> {
        let (latitude, longitude) = match (record.latitude, record.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => (lat, lng),
            (None, _) | (_, None) => {
                return Err(FacilityError::invalid_coordinates(
                    record.id,
                    "missing latitude or longitude",
                ))
            }
            (Some(lat), Some(lng)) => {
                return Err(FacilityError::invalid_coordinates(
                    record.id,
                    format!("non-finite coordinates ({}, {})", lat, lng),
                ))
            }
        };

        Ok(Facility {
            id: record.id,
            name: record.name,
            description: record.description,
            category: record.category,
            is_free: record.is_free,
            has_night_light: record.has_night_light,
            has_parking: record.has_parking,
            latitude,
            longitude,
            inferred: record.inferred,
        })
    }
}
