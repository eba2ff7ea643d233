//! Contrôleur de carte
//!
//! Porte explicitement l'état de l'application (store, règles, ensemble
//! rendu, centre) et route les événements déclencheurs: carte au repos,
//! changement de filtres, fin de chargement des données, clics, fin de
//! géolocalisation.
//!
//! Les réponses asynchrones sont associées à un [`RequestToken`]; seule la
//! requête la plus récente de chaque type peut modifier l'état.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::filter::{visible_facilities, FilterRule};
use crate::ingest;
use crate::render::headless::REFERENCE_LEVEL;
use crate::render::{overlay, reconcile, HeadlessMap, MapEvent, MapWidget, ReconcilePolicy};
use crate::render::{ReconcileReport, RenderedSet};
use crate::store::{FacilityStore, LoadReport};
use crate::types::{FacilityRecord, LatLng};
use crate::FacilityError;

/// Centre par défaut: Boramae, Séoul
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 37.4938,
    lng: 126.9189,
};

/// Options de construction du contrôleur
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub policy: ReconcilePolicy,
    pub default_center: LatLng,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            policy: ReconcilePolicy::default(),
            default_center: DEFAULT_CENTER,
        }
    }
}

/// Type de requête asynchrone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestKind {
    Data,
    Location,
}

/// Jeton identifiant une requête en vol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    kind: RequestKind,
    seq: u64,
}

impl RequestToken {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Provenance des données chargées
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataOrigin {
    /// Réponse de la source
    Remote,
    /// Jeu d'exemple embarqué, après échec de la source
    Fallback,
}

/// Bilan d'un chargement de données
#[derive(Debug, Clone, Serialize)]
pub struct DataLoadSummary {
    pub origin: DataOrigin,
    pub load: LoadReport,
    pub reconcile: ReconcileReport,
    /// Erreur de la source ayant provoqué le repli
    pub error: Option<String>,
}

/// Issue d'une géolocalisation
#[derive(Debug, Clone, PartialEq)]
pub enum LocateOutcome {
    /// Carte recentrée sur la position
    Moved(LatLng),
    /// Position refusée ou indisponible: le centre est conservé
    Denied { notice: String },
    /// Réponse d'une requête remplacée depuis, ignorée
    Stale,
}

/// État de l'application autour d'un widget carte
pub struct MapController<W: MapWidget> {
    widget: W,
    store: FacilityStore,
    rules: FilterRule,
    rendered: RenderedSet<W::Marker, W::Overlay>,
    policy: ReconcilePolicy,
    center: LatLng,
    next_seq: u64,
    latest_data: Option<u64>,
    latest_location: Option<u64>,
}

impl<W: MapWidget> MapController<W> {
    /// Prend possession du widget et le centre sur la position par défaut
    ///
    /// # Errors
    ///
    /// [`FacilityError::MapUnavailable`] si le widget n'est pas chargé.
    pub fn new(mut widget: W, options: ControllerOptions) -> Result<Self, FacilityError> {
        if !widget.is_ready() {
            return Err(FacilityError::MapUnavailable);
        }
        widget.set_center(options.default_center);

        Ok(Self {
            widget,
            store: FacilityStore::new(),
            rules: FilterRule::default(),
            rendered: RenderedSet::new(),
            policy: options.policy,
            center: options.default_center,
            next_seq: 0,
            latest_data: None,
            latest_location: None,
        })
    }

    /// Recalcule l'ensemble visible et réconcilie les marqueurs
    pub fn refresh(&mut self) -> ReconcileReport {
        let bounds = self.widget.bounds();
        self.center = bounds.center();

        let visible = visible_facilities(self.store.all(), &bounds, &self.rules);
        debug!(
            store = self.store.len(),
            visible = visible.len(),
            "Computed visible facilities"
        );

        let current = std::mem::take(&mut self.rendered);
        let (rendered, report) = reconcile(&mut self.widget, current, &visible, self.policy);
        self.rendered = rendered;
        report
    }

    /// Remplace les règles de filtrage puis rafraîchit
    pub fn set_rules(&mut self, rules: FilterRule) -> ReconcileReport {
        debug!(rules = ?rules, "Filter rules changed");
        self.rules = rules;
        self.refresh()
    }

    pub fn set_policy(&mut self, policy: ReconcilePolicy) {
        self.policy = policy;
    }

    /// Route un événement du widget
    ///
    /// Retourne le bilan de réconciliation quand l'événement en a déclenché une.
    pub fn handle_event(&mut self, event: MapEvent) -> Option<ReconcileReport> {
        match event {
            MapEvent::Idle => Some(self.refresh()),
            MapEvent::MarkerClicked(id) => {
                if let Err(e) = overlay::activate(&mut self.widget, &mut self.rendered, &id) {
                    warn!(error = %e, "Ignoring click");
                }
                None
            }
            MapEvent::BackgroundClicked => {
                let closed = overlay::close_all(&mut self.widget, &mut self.rendered);
                debug!(closed = closed, "Background clicked");
                None
            }
        }
    }

    /// Ouvre une requête; toute requête précédente du même type devient obsolète
    pub fn begin_request(&mut self, kind: RequestKind) -> RequestToken {
        self.next_seq += 1;
        let seq = self.next_seq;
        match kind {
            RequestKind::Data => self.latest_data = Some(seq),
            RequestKind::Location => self.latest_location = Some(seq),
        }
        debug!(kind = ?kind, seq = seq, "Request started");
        RequestToken { kind, seq }
    }

    /// Le jeton est celui de la dernière requête de son type
    pub fn is_current(&self, token: RequestToken) -> bool {
        let latest = match token.kind {
            RequestKind::Data => self.latest_data,
            RequestKind::Location => self.latest_location,
        };
        latest == Some(token.seq)
    }

    /// Termine un chargement de données
    ///
    /// En cas d'échec de la source, le jeu d'exemple embarqué est utilisé.
    /// Retourne `None` si le jeton est obsolète.
    pub fn complete_data_load(
        &mut self,
        token: RequestToken,
        result: Result<Vec<FacilityRecord>, FacilityError>,
    ) -> Option<DataLoadSummary> {
        if token.kind != RequestKind::Data || !self.is_current(token) {
            warn!(seq = token.seq, "Discarding stale data load");
            return None;
        }
        self.latest_data = None;

        let (origin, records, error) = match result {
            Ok(records) => (DataOrigin::Remote, records, None),
            Err(e) => {
                warn!(error = %e, "Data source failed, using sample data");
                let records = ingest::sample_records().unwrap_or_else(|sample_err| {
                    warn!(error = %sample_err, "Sample data unreadable");
                    Vec::new()
                });
                (DataOrigin::Fallback, records, Some(e.to_string()))
            }
        };

        let load = self.store.load(records);
        let reconcile = self.refresh();

        info!(
            origin = ?origin,
            accepted = load.accepted,
            rendered = reconcile.rendered(),
            "Data load completed"
        );

        Some(DataLoadSummary {
            origin,
            load,
            reconcile,
            error,
        })
    }

    /// Termine une géolocalisation
    pub fn complete_locate(
        &mut self,
        token: RequestToken,
        result: Result<LatLng, FacilityError>,
    ) -> LocateOutcome {
        if token.kind != RequestKind::Location || !self.is_current(token) {
            warn!(seq = token.seq, "Discarding stale location");
            return LocateOutcome::Stale;
        }
        self.latest_location = None;

        match result {
            Ok(position) if position.is_finite() => {
                info!(lat = position.lat, lng = position.lng, "Centering on current location");
                self.widget.set_center(position);
                self.center = position;
                LocateOutcome::Moved(position)
            }
            Ok(position) => LocateOutcome::Denied {
                notice: format!(
                    "Received an invalid location ({}, {}); showing the default area",
                    position.lat, position.lng
                ),
            },
            Err(e) => {
                warn!(error = %e, "Geolocation unavailable");
                LocateOutcome::Denied {
                    notice: format!("Could not get your location ({}); showing the default area", e),
                }
            }
        }
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    pub fn store(&self) -> &FacilityStore {
        &self.store
    }

    pub fn rules(&self) -> &FilterRule {
        &self.rules
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    pub fn rendered(&self) -> &RenderedSet<W::Marker, W::Overlay> {
        &self.rendered
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    /// Identifiant de l'équipement dont l'overlay est ouvert
    pub fn open_overlay(&self) -> Option<&str> {
        overlay::open_overlay_id(&self.rendered)
    }
}

impl MapController<HeadlessMap> {
    /// Contrôleur sur une carte headless au niveau de zoom de référence
    pub fn headless(options: ControllerOptions) -> Result<Self, FacilityError> {
        Self::new(HeadlessMap::new(options.default_center, REFERENCE_LEVEL), options)
    }

    /// Traite tous les événements en attente sur la carte headless
    pub fn pump(&mut self) -> Vec<ReconcileReport> {
        let mut reports = Vec::new();
        while let Some(event) = self.widget.poll_event() {
            if let Some(report) = self.handle_event(event) {
                reports.push(report);
            }
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::fixtures::record;

    fn controller() -> MapController<HeadlessMap> {
        let mut c = MapController::headless(ControllerOptions::default()).unwrap();
        c.pump();
        c
    }

    #[test]
    fn test_unavailable_widget_is_rejected() {
        let err = MapController::new(HeadlessMap::unavailable(), ControllerOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, FacilityError::MapUnavailable));
    }

    #[test]
    fn test_new_centers_on_default() {
        let c = controller();
        assert_eq!(c.widget().center(), DEFAULT_CENTER);
        assert!(c.rendered().is_empty());
    }

    #[test]
    fn test_stale_data_load_is_discarded() {
        let mut c = controller();
        let old = c.begin_request(RequestKind::Data);
        let new = c.begin_request(RequestKind::Data);
        assert!(new.seq() > old.seq());

        let summary = c
            .complete_data_load(new, Ok(vec![record("NEW", Some(37.49), Some(126.92))]))
            .unwrap();
        assert_eq!(summary.origin, DataOrigin::Remote);

        assert!(c
            .complete_data_load(old, Ok(vec![record("OLD", Some(37.49), Some(126.92))]))
            .is_none());
        assert!(c.store().get("NEW").is_some());
        assert!(c.store().get("OLD").is_none());
    }

    #[test]
    fn test_failed_load_uses_sample() {
        let mut c = controller();
        let token = c.begin_request(RequestKind::Data);
        let summary = c
            .complete_data_load(token, Err(FacilityError::EmptyResponse))
            .unwrap();

        assert_eq!(summary.origin, DataOrigin::Fallback);
        assert_eq!(summary.load.accepted, 7);
        assert!(summary.error.is_some());
        assert!(!c.rendered().is_empty());
    }

    #[test]
    fn test_locate_denied_keeps_center() {
        let mut c = controller();
        let token = c.begin_request(RequestKind::Location);
        let outcome = c.complete_locate(
            token,
            Err(FacilityError::LocationUnavailable("permission denied".into())),
        );

        assert!(matches!(outcome, LocateOutcome::Denied { .. }));
        assert_eq!(c.widget().center(), DEFAULT_CENTER);
    }

    #[test]
    fn test_locate_moves_map_and_stale_is_ignored() {
        let mut c = controller();
        let first = c.begin_request(RequestKind::Location);
        let second = c.begin_request(RequestKind::Location);
        let here = LatLng::new(37.5273, 126.9351);

        assert_eq!(c.complete_locate(second, Ok(here)), LocateOutcome::Moved(here));
        assert_eq!(
            c.complete_locate(first, Ok(LatLng::new(0.0, 0.0))),
            LocateOutcome::Stale
        );
        assert_eq!(c.widget().center(), here);
    }

    #[test]
    fn test_tokens_are_per_kind() {
        let mut c = controller();
        let data = c.begin_request(RequestKind::Data);
        let location = c.begin_request(RequestKind::Location);
        assert_eq!(data.kind(), RequestKind::Data);
        assert_eq!(location.kind(), RequestKind::Location);
        assert!(c.is_current(data));
        assert!(c.is_current(location));
    }

    #[test]
    fn test_switching_policy_rebuilds_unchanged_markers() {
        let mut c = controller();
        let token = c.begin_request(RequestKind::Data);
        c.complete_data_load(
            token,
            Ok(vec![
                record("B", Some(37.50), Some(126.91)),
                record("A", Some(37.49), Some(126.92)),
            ]),
        )
        .unwrap();
        assert_eq!(c.widget().marker_ids(), vec!["A", "B"]);

        let kept = c.refresh();
        assert_eq!(kept.retained, 2);
        assert_eq!(kept.created, 0);

        c.set_policy(ReconcilePolicy::Rebuild);
        assert_eq!(c.policy(), ReconcilePolicy::Rebuild);
        let rebuilt = c.refresh();
        assert_eq!(rebuilt.removed, 2);
        assert_eq!(rebuilt.created, 2);
        assert_eq!(c.widget().marker_ids(), vec!["A", "B"]);
        assert_eq!(c.widget().stats().markers_added, 4);
    }

    #[test]
    fn test_parsed_response_without_coordinates_stays_remote() {
        let mut c = controller();
        let token = c.begin_request(RequestKind::Data);
        let summary = c
            .complete_data_load(
                token,
                Ok(vec![record("X1", None, None), record("X2", Some(37.5), None)]),
            )
            .unwrap();

        assert_eq!(summary.origin, DataOrigin::Remote);
        assert_eq!(summary.load.accepted, 0);
        assert!(summary.error.is_none());
        assert!(c.store().is_empty());
        assert!(c.rendered().is_empty());
    }

    #[test]
    fn test_unknown_click_is_ignored() {
        let mut c = controller();
        assert!(c.handle_event(MapEvent::MarkerClicked("nope".into())).is_none());
        assert!(c.open_overlay().is_none());
    }
}
