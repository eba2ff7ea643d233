//! Rendu des marqueurs sur le widget carte
//!
//! Le widget (Kakao Maps, Leaflet, un rendu headless…) est un collaborateur
//! externe décrit par [`MapWidget`]. Ce module ne fait que lui envoyer des
//! ordres de création/destruction et recevoir ses événements.

pub mod headless;
pub mod overlay;
pub mod reconcile;

pub use headless::HeadlessMap;
pub use overlay::{OverlayContent, OverlayTag};
pub use reconcile::{reconcile, ReconcilePolicy, ReconcileReport, RenderedMarker, RenderedSet};

use crate::filter::Bounds;
use crate::types::{Facility, LatLng};

/// Événements émis par le widget carte
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// La carte a fini de bouger ou de zoomer
    Idle,
    /// Clic sur le marqueur d'un équipement
    MarkerClicked(String),
    /// Clic sur une zone vide de la carte
    BackgroundClicked,
}

/// Primitives attendues du widget carte
///
/// `add_marker` doit relier le clic du marqueur à l'identifiant de
/// l'équipement: le widget le signale ensuite par
/// [`MapEvent::MarkerClicked`].
pub trait MapWidget {
    /// Poignée d'un marqueur attaché à la carte
    type Marker;
    /// Poignée d'un overlay de détail
    type Overlay;

    /// Le widget est chargé et utilisable
    fn is_ready(&self) -> bool;

    /// Emprise actuellement visible
    fn bounds(&self) -> Bounds;

    /// Recentre la carte (un `Idle` suivra)
    fn set_center(&mut self, center: LatLng);

    fn add_marker(&mut self, facility: &Facility) -> Self::Marker;

    fn remove_marker(&mut self, marker: Self::Marker);

    /// Crée un overlay dormant (non affiché)
    fn create_overlay(&mut self, facility: &Facility, content: &OverlayContent) -> Self::Overlay;

    fn show_overlay(&mut self, overlay: &Self::Overlay);

    fn hide_overlay(&mut self, overlay: &Self::Overlay);

    fn remove_overlay(&mut self, overlay: Self::Overlay);
}
