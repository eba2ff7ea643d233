//! Collaborateurs asynchrones: source de données et géolocalisation

use std::path::Path;

use facility_map::ingest::normalize_response;
use facility_map::{AttributeSeed, FacilityError, FacilityRecord, LatLng};
use tracing::{debug, info};

/// Variable d'environnement fournissant une position `lat,lng`
pub const LOCATION_ENV: &str = "PLAYGROUND_LOCATION";

/// Lit et normalise une réponse de la source de données
///
/// # Errors
///
/// - [`FacilityError::SourceUnavailable`] sans source configurée
/// - [`FacilityError::Io`] si le fichier est illisible
/// - [`FacilityError::Parse`] / [`FacilityError::EmptyResponse`] selon la réponse
pub async fn fetch_facilities(
    path: Option<&Path>,
    seed: &AttributeSeed,
) -> Result<Vec<FacilityRecord>, FacilityError> {
    let path = path.ok_or_else(|| FacilityError::SourceUnavailable("no data source configured".into()))?;

    debug!(path = %path.display(), "Fetching facilities");
    let text = tokio::fs::read_to_string(path).await?;
    let records = normalize_response(&text, seed)?;

    info!(path = %path.display(), records = records.len(), "Fetched facilities");
    Ok(records)
}

/// Résout la position de l'appareil
///
/// La position vient du paramètre, sinon de `PLAYGROUND_LOCATION`.
pub async fn locate(fix: Option<&str>) -> Result<LatLng, FacilityError> {
    let raw = match fix {
        Some(raw) => raw.to_string(),
        None => std::env::var(LOCATION_ENV)
            .map_err(|_| FacilityError::LocationUnavailable("no location provider".into()))?,
    };

    raw.parse::<LatLng>()
        .map_err(|e| FacilityError::LocationUnavailable(e.to_string()))
}

/// Une position est-elle disponible (paramètre ou environnement)
pub fn location_requested(fix: Option<&str>) -> bool {
    fix.is_some() || std::env::var(LOCATION_ENV).map_or(false, |v| !v.is_empty())
}
