//! Types d'erreurs pour le crate facility-map

use thiserror::Error;

/// Erreurs pouvant survenir lors de l'ingestion, du filtrage ou du rendu
#[derive(Debug, Error)]
pub enum FacilityError {
    /// Erreur d'I/O lors de la lecture d'une source de données
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Réponse illisible (JSON invalide, XML, page d'erreur…)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Réponse lisible mais sans aucun élément exploitable
    #[error("Response contained no facility items")]
    EmptyResponse,

    /// Coordonnées absentes ou non numériques
    #[error("Invalid coordinates for {id}: {reason}")]
    InvalidCoordinates { id: String, reason: String },

    /// Emprise de carte incohérente
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    /// Catégorie inconnue
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Le widget carte n'est pas chargé
    #[error("Map widget is not available")]
    MapUnavailable,

    /// Aucun marqueur rendu pour cet identifiant
    #[error("No rendered marker for facility {0}")]
    UnknownMarker(String),

    /// La source de données n'a pas pu être jointe
    #[error("Data source unavailable: {0}")]
    SourceUnavailable(String),

    /// Géolocalisation refusée ou indisponible
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),
}

impl FacilityError {
    /// Crée une erreur de coordonnées avec contexte
    pub fn invalid_coordinates(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCoordinates {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for FacilityError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value.to_string())
    }
}
