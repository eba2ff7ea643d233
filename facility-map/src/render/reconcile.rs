//! Réconciliation des marqueurs rendus avec l'ensemble visible
//!
//! Après chaque passe, les identifiants rendus sont exactement ceux de
//! l'ensemble visible, dans son ordre, sans doublon.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use super::overlay::OverlayContent;
use super::MapWidget;
use crate::types::Facility;

/// Stratégie de réconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcilePolicy {
    /// Tout détruire puis tout recréer
    Rebuild,
    /// Ne créer/détruire que le delta, par identifiant
    #[default]
    Keyed,
}

/// Un marqueur affiché et son overlay
#[derive(Debug)]
pub struct RenderedMarker<M, O> {
    pub facility: Facility,
    pub marker: M,
    pub overlay: O,
    pub overlay_open: bool,
}

impl<M, O> RenderedMarker<M, O> {
    pub fn id(&self) -> &str {
        &self.facility.id
    }
}

/// Ensemble rendu, indexé par identifiant d'équipement
#[derive(Debug)]
pub struct RenderedSet<M, O> {
    entries: Vec<RenderedMarker<M, O>>,
}

impl<M, O> Default for RenderedSet<M, O> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<M, O> RenderedSet<M, O> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderedMarker<M, O>> {
        self.entries.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut RenderedMarker<M, O>> {
        self.entries.iter_mut()
    }

    /// Identifiants rendus, dans l'ordre d'affichage
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&RenderedMarker<M, O>> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut RenderedMarker<M, O>> {
        self.entries.iter_mut().find(|e| e.id() == id)
    }

    /// Nombre d'overlays ouverts
    pub fn open_count(&self) -> usize {
        self.entries.iter().filter(|e| e.overlay_open).count()
    }
}

/// Bilan d'une passe de réconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Marqueurs créés pour un nouvel équipement
    pub created: usize,
    /// Marqueurs conservés tels quels
    pub retained: usize,
    /// Marqueurs recréés car l'équipement a changé
    pub replaced: usize,
    /// Marqueurs détruits
    pub removed: usize,
    /// Identifiants en double ignorés dans l'ensemble visible
    pub skipped_duplicates: usize,
}

impl ReconcileReport {
    /// Taille de l'ensemble rendu après la passe
    pub fn rendered(&self) -> usize {
        self.created + self.retained + self.replaced
    }

    /// La passe n'a rien changé sur la carte
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.replaced == 0 && self.removed == 0
    }
}

/// Aligne l'ensemble rendu sur l'ensemble visible
///
/// # Arguments
/// * `widget` - Widget carte recevant les créations/destructions
/// * `current` - Ensemble rendu actuel (consommé)
/// * `visible` - Ensemble visible nouvellement calculé
/// * `policy` - Reconstruction complète ou delta par identifiant
///
/// # Returns
/// Le nouvel ensemble rendu et le bilan de la passe
pub fn reconcile<W: MapWidget>(
    widget: &mut W,
    current: RenderedSet<W::Marker, W::Overlay>,
    visible: &[&Facility],
    policy: ReconcilePolicy,
) -> (RenderedSet<W::Marker, W::Overlay>, ReconcileReport) {
    let (rendered, report) = match policy {
        ReconcilePolicy::Rebuild => rebuild(widget, current, visible),
        ReconcilePolicy::Keyed => keyed(widget, current, visible),
    };

    info!(
        policy = ?policy,
        rendered = rendered.len(),
        created = report.created,
        retained = report.retained,
        replaced = report.replaced,
        removed = report.removed,
        "Reconciled markers"
    );

    (rendered, report)
}

fn rebuild<W: MapWidget>(
    widget: &mut W,
    current: RenderedSet<W::Marker, W::Overlay>,
    visible: &[&Facility],
) -> (RenderedSet<W::Marker, W::Overlay>, ReconcileReport) {
    let mut report = ReconcileReport::default();

    for entry in current.entries {
        destroy(widget, entry);
        report.removed += 1;
    }

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(visible.len());
    for facility in visible {
        if !seen.insert(facility.id.as_str()) {
            report.skipped_duplicates += 1;
            continue;
        }
        entries.push(create(widget, facility));
        report.created += 1;
    }

    (RenderedSet { entries }, report)
}

fn keyed<W: MapWidget>(
    widget: &mut W,
    current: RenderedSet<W::Marker, W::Overlay>,
    visible: &[&Facility],
) -> (RenderedSet<W::Marker, W::Overlay>, ReconcileReport) {
    let mut report = ReconcileReport::default();

    let mut previous: HashMap<String, RenderedMarker<W::Marker, W::Overlay>> = current
        .entries
        .into_iter()
        .map(|e| (e.facility.id.clone(), e))
        .collect();

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(visible.len());

    for facility in visible {
        if !seen.insert(facility.id.as_str()) {
            report.skipped_duplicates += 1;
            continue;
        }

        match previous.remove(&facility.id) {
            Some(existing) if existing.facility == **facility => {
                trace!(id = %facility.id, "Marker retained");
                entries.push(existing);
                report.retained += 1;
            }
            Some(stale) => {
                debug!(id = %facility.id, "Facility changed, replacing marker");
                destroy(widget, stale);
                entries.push(create(widget, facility));
                report.replaced += 1;
            }
            None => {
                entries.push(create(widget, facility));
                report.created += 1;
            }
        }
    }

    for (_, entry) in previous {
        destroy(widget, entry);
        report.removed += 1;
    }

    (RenderedSet { entries }, report)
}

/// Crée un marqueur et son overlay dormant
fn create<W: MapWidget>(widget: &mut W, facility: &Facility) -> RenderedMarker<W::Marker, W::Overlay> {
    let marker = widget.add_marker(facility);
    let content = OverlayContent::for_facility(facility);
    let overlay = widget.create_overlay(facility, &content);
    trace!(id = %facility.id, "Marker created");

    RenderedMarker {
        facility: facility.clone(),
        marker,
        overlay,
        overlay_open: false,
    }
}

/// Libère le marqueur et l'overlay (fermé au préalable s'il est ouvert)
fn destroy<W: MapWidget>(widget: &mut W, entry: RenderedMarker<W::Marker, W::Overlay>) {
    trace!(id = %entry.facility.id, "Marker destroyed");
    if entry.overlay_open {
        widget.hide_overlay(&entry.overlay);
    }
    widget.remove_overlay(entry.overlay);
    widget.remove_marker(entry.marker);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessMap;
    use crate::types::fixtures::facility;
    use crate::types::LatLng;

    fn map() -> HeadlessMap {
        HeadlessMap::new(LatLng::new(37.5, 126.95), 5)
    }

    fn facilities(ids: &[&str]) -> Vec<Facility> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| facility(id, 37.45 + i as f64 * 0.01, 126.92))
            .collect()
    }

    fn refs(facilities: &[Facility]) -> Vec<&Facility> {
        facilities.iter().collect()
    }

    const POLICIES: [ReconcilePolicy; 2] = [ReconcilePolicy::Rebuild, ReconcilePolicy::Keyed];

    #[test]
    fn test_rendered_matches_visible() {
        for policy in POLICIES {
            let mut widget = map();
            let first = facilities(&["A", "B", "C"]);
            let (rendered, report) = reconcile(&mut widget, RenderedSet::new(), &refs(&first), policy);
            assert_eq!(rendered.ids(), vec!["A", "B", "C"]);
            assert_eq!(report.created, 3);
            assert_eq!(widget.live_markers(), 3);

            let second = facilities(&["C", "D"]);
            let (rendered, _) = reconcile(&mut widget, rendered, &refs(&second), policy);
            assert_eq!(rendered.ids(), vec!["C", "D"]);
            assert_eq!(widget.live_markers(), 2);
            assert_eq!(widget.live_overlays(), 2);
        }
    }

    #[test]
    fn test_rebuild_recreates_everything() {
        let mut widget = map();
        let data = facilities(&["A", "B"]);
        let (rendered, _) = reconcile(&mut widget, RenderedSet::new(), &refs(&data), ReconcilePolicy::Rebuild);
        let (rendered, report) = reconcile(&mut widget, rendered, &refs(&data), ReconcilePolicy::Rebuild);

        assert_eq!(report.removed, 2);
        assert_eq!(report.created, 2);
        assert_eq!(rendered.ids(), vec!["A", "B"]);
        assert_eq!(widget.stats().markers_added, 4);
    }

    #[test]
    fn test_keyed_is_idempotent() {
        let mut widget = map();
        let data = facilities(&["A", "B", "C"]);
        let (rendered, _) = reconcile(&mut widget, RenderedSet::new(), &refs(&data), ReconcilePolicy::Keyed);
        let (rendered, report) = reconcile(&mut widget, rendered, &refs(&data), ReconcilePolicy::Keyed);

        assert!(report.is_noop());
        assert_eq!(report.retained, 3);
        assert_eq!(rendered.ids(), vec!["A", "B", "C"]);
        assert_eq!(widget.stats().markers_added, 3);
        assert_eq!(widget.stats().markers_removed, 0);
    }

    #[test]
    fn test_keyed_follows_new_order() {
        let mut widget = map();
        let data = facilities(&["A", "B", "C"]);
        let (rendered, _) = reconcile(&mut widget, RenderedSet::new(), &refs(&data), ReconcilePolicy::Keyed);

        let reordered = vec![&data[2], &data[0]];
        let (rendered, report) = reconcile(&mut widget, rendered, &reordered, ReconcilePolicy::Keyed);
        assert_eq!(rendered.ids(), vec!["C", "A"]);
        assert_eq!(report.retained, 2);
        assert_eq!(report.removed, 1);
    }

    #[test]
    fn test_keyed_replaces_changed_facility() {
        let mut widget = map();
        let data = facilities(&["A"]);
        let (rendered, _) = reconcile(&mut widget, RenderedSet::new(), &refs(&data), ReconcilePolicy::Keyed);

        let mut moved = data[0].clone();
        moved.latitude += 0.001;
        let (rendered, report) = reconcile(&mut widget, rendered, &[&moved], ReconcilePolicy::Keyed);

        assert_eq!(report.replaced, 1);
        assert_eq!(rendered.get("A").unwrap().facility.latitude, moved.latitude);
        assert_eq!(widget.live_markers(), 1);
    }

    #[test]
    fn test_duplicates_are_skipped() {
        for policy in POLICIES {
            let mut widget = map();
            let data = facilities(&["A", "B"]);
            let visible = vec![&data[0], &data[1], &data[0]];
            let (rendered, report) = reconcile(&mut widget, RenderedSet::new(), &visible, policy);

            assert_eq!(rendered.ids(), vec!["A", "B"]);
            assert_eq!(report.skipped_duplicates, 1);
            assert_eq!(widget.live_markers(), 2);
        }
    }

    #[test]
    fn test_empty_visible_clears_everything() {
        for policy in POLICIES {
            let mut widget = map();
            let data = facilities(&["A", "B"]);
            let (rendered, _) = reconcile(&mut widget, RenderedSet::new(), &refs(&data), policy);
            let (rendered, report) = reconcile(&mut widget, rendered, &[], policy);

            assert!(rendered.is_empty());
            assert_eq!(report.removed, 2);
            assert_eq!(widget.live_markers(), 0);
            assert_eq!(widget.live_overlays(), 0);
        }
    }

    #[test]
    fn test_empty_to_empty() {
        let mut widget = map();
        let (rendered, report) = reconcile(&mut widget, RenderedSet::new(), &[], ReconcilePolicy::Rebuild);
        assert!(rendered.is_empty());
        assert_eq!(report, ReconcileReport::default());
    }

    #[test]
    fn test_removed_open_overlay_is_hidden() {
        let mut widget = map();
        let data = facilities(&["A", "B"]);
        let (mut rendered, _) = reconcile(&mut widget, RenderedSet::new(), &refs(&data), ReconcilePolicy::Keyed);
        crate::render::overlay::activate(&mut widget, &mut rendered, "A").unwrap();
        assert_eq!(widget.open_overlays(), 1);

        let (rendered, _) = reconcile(&mut widget, rendered, &[&data[1]], ReconcilePolicy::Keyed);
        assert_eq!(rendered.open_count(), 0);
        assert_eq!(widget.open_overlays(), 0);
    }
}
