//! Widget carte headless
//!
//! Implémentation en mémoire de [`MapWidget`], sans affichage: utile pour les
//! tests, les benchmarks et le pilotage en ligne de commande. Elle tient le
//! compte des marqueurs et overlays vivants et file les événements qu'un vrai
//! widget émettrait.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use super::overlay::OverlayContent;
use super::{MapEvent, MapWidget};
use crate::filter::Bounds;
use crate::types::{Facility, LatLng};

/// Niveau de zoom de référence (style Kakao: 1 = le plus proche)
pub const REFERENCE_LEVEL: u8 = 5;
/// Étendue en latitude au niveau de référence (degrés)
pub const REFERENCE_LAT_SPAN: f64 = 0.15;
/// Étendue en longitude au niveau de référence (degrés)
pub const REFERENCE_LNG_SPAN: f64 = 0.09;

const MIN_LEVEL: u8 = 1;
const MAX_LEVEL: u8 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerHandle(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayHandle(u64);

/// Compteurs d'opérations reçues par le widget
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeadlessStats {
    pub markers_added: usize,
    pub markers_removed: usize,
    pub overlays_created: usize,
    pub overlays_removed: usize,
    pub overlays_shown: usize,
    pub overlays_hidden: usize,
}

#[derive(Debug)]
struct HeadlessOverlay {
    facility_id: String,
    content: OverlayContent,
    open: bool,
}

/// Carte sans rendu
#[derive(Debug)]
pub struct HeadlessMap {
    center: LatLng,
    level: u8,
    ready: bool,
    fitted: Option<Bounds>,
    next_handle: u64,
    markers: HashMap<u64, String>,
    overlays: HashMap<u64, HeadlessOverlay>,
    events: VecDeque<MapEvent>,
    stats: HeadlessStats,
}

impl HeadlessMap {
    pub fn new(center: LatLng, level: u8) -> Self {
        Self {
            center,
            level: level.clamp(MIN_LEVEL, MAX_LEVEL),
            ready: true,
            fitted: None,
            next_handle: 0,
            markers: HashMap::new(),
            overlays: HashMap::new(),
            events: VecDeque::new(),
            stats: HeadlessStats::default(),
        }
    }

    /// Widget dont le script n'a pas chargé
    pub fn unavailable() -> Self {
        Self {
            ready: false,
            ..Self::new(LatLng::new(0.0, 0.0), REFERENCE_LEVEL)
        }
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Change le niveau de zoom; l'étendue double à chaque niveau
    pub fn set_level(&mut self, level: u8) {
        self.level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        self.fitted = None;
        self.events.push_back(MapEvent::Idle);
    }

    /// Déplace la vue comme le ferait un glisser de l'utilisateur
    pub fn pan_to(&mut self, center: LatLng) {
        self.set_center(center);
    }

    /// Cadre la vue exactement sur une emprise
    pub fn fit_bounds(&mut self, bounds: Bounds) {
        self.center = bounds.center();
        self.fitted = Some(bounds);
        self.events.push_back(MapEvent::Idle);
    }

    /// Simule un clic sur le marqueur d'un équipement
    ///
    /// Retourne `false` si aucun marqueur n'est affiché pour cet identifiant.
    pub fn click_marker(&mut self, facility_id: &str) -> bool {
        if !self.markers.values().any(|id| id == facility_id) {
            return false;
        }
        self.events
            .push_back(MapEvent::MarkerClicked(facility_id.to_string()));
        true
    }

    pub fn click_background(&mut self) {
        self.events.push_back(MapEvent::BackgroundClicked);
    }

    /// Prochain événement en attente
    pub fn poll_event(&mut self) -> Option<MapEvent> {
        self.events.pop_front()
    }

    pub fn live_markers(&self) -> usize {
        self.markers.len()
    }

    pub fn live_overlays(&self) -> usize {
        self.overlays.len()
    }

    pub fn open_overlays(&self) -> usize {
        self.overlays.values().filter(|o| o.open).count()
    }

    /// Identifiants des équipements ayant un marqueur, triés
    pub fn marker_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.markers.values().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Contenu de l'overlay ouvert, s'il y en a un
    pub fn open_overlay(&self) -> Option<(&str, &OverlayContent)> {
        self.overlays
            .values()
            .find(|o| o.open)
            .map(|o| (o.facility_id.as_str(), &o.content))
    }

    pub fn stats(&self) -> &HeadlessStats {
        &self.stats
    }

    fn next_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl MapWidget for HeadlessMap {
    type Marker = MarkerHandle;
    type Overlay = OverlayHandle;

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn bounds(&self) -> Bounds {
        if let Some(bounds) = self.fitted {
            return bounds;
        }
        let scale = 2f64.powi(i32::from(self.level) - i32::from(REFERENCE_LEVEL));
        Bounds::around(
            self.center,
            REFERENCE_LAT_SPAN * scale,
            REFERENCE_LNG_SPAN * scale,
        )
        .unwrap_or(Bounds::WORLD)
    }

    fn set_center(&mut self, center: LatLng) {
        self.center = center;
        self.fitted = None;
        self.events.push_back(MapEvent::Idle);
    }

    fn add_marker(&mut self, facility: &Facility) -> MarkerHandle {
        let handle = self.next_handle();
        self.markers.insert(handle, facility.id.clone());
        self.stats.markers_added += 1;
        MarkerHandle(handle)
    }

    fn remove_marker(&mut self, marker: MarkerHandle) {
        if self.markers.remove(&marker.0).is_some() {
            self.stats.markers_removed += 1;
        }
    }

    fn create_overlay(&mut self, facility: &Facility, content: &OverlayContent) -> OverlayHandle {
        let handle = self.next_handle();
        self.overlays.insert(
            handle,
            HeadlessOverlay {
                facility_id: facility.id.clone(),
                content: content.clone(),
                open: false,
            },
        );
        self.stats.overlays_created += 1;
        OverlayHandle(handle)
    }

    fn show_overlay(&mut self, overlay: &OverlayHandle) {
        if let Some(o) = self.overlays.get_mut(&overlay.0) {
            o.open = true;
            self.stats.overlays_shown += 1;
        }
    }

    fn hide_overlay(&mut self, overlay: &OverlayHandle) {
        if let Some(o) = self.overlays.get_mut(&overlay.0) {
            o.open = false;
            self.stats.overlays_hidden += 1;
        }
    }

    fn remove_overlay(&mut self, overlay: OverlayHandle) {
        if self.overlays.remove(&overlay.0).is_some() {
            self.stats.overlays_removed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_follow_center_and_level() {
        let mut map = HeadlessMap::new(LatLng::new(37.475, 126.945), REFERENCE_LEVEL);
        let b = map.bounds();
        assert!((b.lat_span() - REFERENCE_LAT_SPAN).abs() < 1e-9);
        assert!((b.lng_span() - REFERENCE_LNG_SPAN).abs() < 1e-9);

        map.set_level(REFERENCE_LEVEL + 1);
        assert!((map.bounds().lat_span() - 2.0 * REFERENCE_LAT_SPAN).abs() < 1e-9);
        assert_eq!(map.poll_event(), Some(MapEvent::Idle));
        assert_eq!(map.poll_event(), None);
    }

    #[test]
    fn test_fit_bounds_then_pan() {
        let mut map = HeadlessMap::new(LatLng::new(0.0, 0.0), 3);
        let target = Bounds::new(37.40, 126.90, 37.55, 126.99).unwrap();
        map.fit_bounds(target);
        assert_eq!(map.bounds(), target);

        map.pan_to(LatLng::new(35.0, 129.0));
        assert_ne!(map.bounds(), target);
        assert_eq!(map.center(), LatLng::new(35.0, 129.0));
    }

    #[test]
    fn test_click_marker_requires_marker() {
        let mut map = HeadlessMap::new(LatLng::new(37.5, 126.9), 5);
        assert!(!map.click_marker("P001"));

        let f = crate::types::fixtures::facility("P001", 37.5, 126.9);
        let handle = map.add_marker(&f);
        assert!(map.click_marker("P001"));
        assert_eq!(map.poll_event(), Some(MapEvent::MarkerClicked("P001".to_string())));

        map.remove_marker(handle);
        assert_eq!(map.live_markers(), 0);
        assert_eq!(map.stats().markers_removed, 1);
    }

    #[test]
    fn test_level_is_clamped() {
        let map = HeadlessMap::new(LatLng::new(0.0, 0.0), 40);
        assert_eq!(map.level(), 14);
        assert!(!HeadlessMap::unavailable().is_ready());
    }
}
