//! Overlays de détail et exclusivité
//!
//! Au plus un overlay est ouvert à un instant donné: activer un marqueur
//! ferme tous les overlays ouverts avant d'ouvrir le sien, un clic sur le
//! fond de carte les ferme tous.

use serde::Serialize;
use tracing::debug;

use super::reconcile::RenderedSet;
use super::MapWidget;
use crate::types::Facility;
use crate::FacilityError;

/// Étiquette affichée sous le titre d'un overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayTag {
    pub label: String,
    /// Valeur synthétisée, à ne pas présenter comme un fait
    pub estimated: bool,
}

impl OverlayTag {
    fn new(label: &str, estimated: bool) -> Self {
        Self {
            label: label.to_string(),
            estimated,
        }
    }
}

/// Contenu d'un overlay de détail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayContent {
    pub title: String,
    pub description: String,
    pub tags: Vec<OverlayTag>,
}

impl OverlayContent {
    pub fn for_facility(facility: &Facility) -> Self {
        let inferred = facility.inferred;
        let mut tags = Vec::new();

        let price = if facility.is_free { "Free" } else { "Paid" };
        tags.push(OverlayTag::new(price, inferred.is_free));
        if facility.has_night_light {
            tags.push(OverlayTag::new("Night light", inferred.has_night_light));
        }
        if facility.has_parking {
            tags.push(OverlayTag::new("Parking", inferred.has_parking));
        }
        tags.push(OverlayTag::new(facility.category.label(), false));

        Self {
            title: facility.name.clone(),
            description: facility.description.clone(),
            tags,
        }
    }

    /// Rendu texte sur une ligne (les estimations sont suffixées de `?`)
    pub fn to_text(&self) -> String {
        let tags: Vec<String> = self
            .tags
            .iter()
            .map(|t| {
                if t.estimated {
                    format!("{}?", t.label)
                } else {
                    t.label.clone()
                }
            })
            .collect();
        format!("{} | {} | {}", self.title, self.description, tags.join(", "))
    }
}

/// Ferme tous les overlays ouverts, retourne leur nombre
pub fn close_all<W: MapWidget>(
    widget: &mut W,
    rendered: &mut RenderedSet<W::Marker, W::Overlay>,
) -> usize {
    let mut closed = 0;
    for entry in rendered.iter_mut().filter(|e| e.overlay_open) {
        widget.hide_overlay(&entry.overlay);
        entry.overlay_open = false;
        closed += 1;
    }
    closed
}

/// Ouvre l'overlay d'un marqueur après avoir fermé les autres
///
/// # Errors
///
/// [`FacilityError::UnknownMarker`] si l'identifiant n'est pas rendu; dans
/// ce cas aucun overlay n'est modifié.
pub fn activate<W: MapWidget>(
    widget: &mut W,
    rendered: &mut RenderedSet<W::Marker, W::Overlay>,
    id: &str,
) -> Result<(), FacilityError> {
    if !rendered.contains(id) {
        return Err(FacilityError::UnknownMarker(id.to_string()));
    }

    let closed = close_all(widget, rendered);

    let entry = rendered
        .get_mut(id)
        .ok_or_else(|| FacilityError::UnknownMarker(id.to_string()))?;
    widget.show_overlay(&entry.overlay);
    entry.overlay_open = true;

    debug!(id = id, closed = closed, "Overlay opened");
    Ok(())
}

/// Identifiant de l'équipement dont l'overlay est ouvert
pub fn open_overlay_id<M, O>(rendered: &RenderedSet<M, O>) -> Option<&str> {
    rendered.iter().find(|e| e.overlay_open).map(|e| e.id())
}
