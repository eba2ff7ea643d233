//! Session interactive pilotée sans interface
//!
//! Relie la configuration, les collaborateurs asynchrones et le contrôleur
//! de carte headless, et alimente le rapport de session.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use facility_map::{
    Bounds, Facility, FacilityError, FacilityRecord, FilterRule, HeadlessMap, LatLng,
    LocateOutcome, MapController, OverlayContent, RequestKind, RequestToken,
};
use tracing::{debug, info};

use crate::config::Settings;
use crate::replay::Step;
use crate::report::{NoticeLevel, SessionReport};
use crate::sources;

/// Session sur une carte headless
pub struct Session {
    controller: MapController<HeadlessMap>,
    settings: Settings,
    report: SessionReport,
    started: Instant,
}

impl Session {
    /// Ouvre la carte sur le centre et le niveau configurés
    pub fn new(settings: Settings) -> Result<Self> {
        let widget = HeadlessMap::new(settings.center, settings.level);
        let mut controller = MapController::new(widget, settings.controller_options())
            .context("Failed to open the map")?;
        controller.set_rules(settings.rules);

        let mut session = Self {
            controller,
            report: SessionReport::new(&settings.name),
            settings,
            started: Instant::now(),
        };
        session.pump();
        Ok(session)
    }

    /// Lance en parallèle le chargement des données et la géolocalisation
    ///
    /// La géolocalisation n'est demandée que si une position est fournie
    /// (paramètre ou `PLAYGROUND_LOCATION`).
    pub async fn start(&mut self, location: Option<&str>) -> Result<()> {
        let seed = self.settings.seed();
        let data_path = self.settings.data.clone();

        let data_token = self.controller.begin_request(RequestKind::Data);

        if sources::location_requested(location) {
            let location_token = self.controller.begin_request(RequestKind::Location);
            let (data, position) = tokio::join!(
                sources::fetch_facilities(data_path.as_deref(), &seed),
                sources::locate(location)
            );
            self.finish_load(data_token, data);
            self.finish_locate(location_token, position);
        } else {
            let data = sources::fetch_facilities(data_path.as_deref(), &seed).await;
            self.finish_load(data_token, data);
        }

        self.pump();
        Ok(())
    }

    /// Recharge les données, éventuellement depuis un autre fichier
    pub async fn reload(&mut self, data: Option<PathBuf>) -> Result<()> {
        if data.is_some() {
            self.settings.data = data;
        }
        let seed = self.settings.seed();
        let token = self.controller.begin_request(RequestKind::Data);
        let result = sources::fetch_facilities(self.settings.data.as_deref(), &seed).await;
        self.finish_load(token, result);
        self.pump();
        Ok(())
    }

    /// Rejoue une étape de script
    pub async fn apply(&mut self, step: &Step) -> Result<()> {
        debug!(step = ?step, "Applying step");
        match step {
            Step::Pan { lat, lng } => {
                let center = LatLng::new(*lat, *lng);
                if !center.is_finite() {
                    anyhow::bail!("Invalid pan target ({}, {})", lat, lng);
                }
                self.controller.widget_mut().pan_to(center);
            }
            Step::Zoom { level } => self.controller.widget_mut().set_level(*level),
            Step::Fit {
                south,
                west,
                north,
                east,
            } => {
                let bounds = Bounds::new(*south, *west, *north, *east)?;
                self.controller.widget_mut().fit_bounds(bounds);
            }
            Step::Rules { rules } => self.set_rules(*rules),
            Step::Click { id } => {
                if !self.controller.widget_mut().click_marker(id) {
                    self.report
                        .record_notice(NoticeLevel::Info, format!("No marker to click for {}", id));
                }
            }
            Step::Background => self.controller.widget_mut().click_background(),
            Step::Reload { data } => self.reload(data.clone()).await?,
            Step::Locate { position } => {
                let token = self.controller.begin_request(RequestKind::Location);
                let result = sources::locate(position.as_deref()).await;
                self.finish_locate(token, result);
            }
        }
        self.pump();
        Ok(())
    }

    /// Remplace les règles de filtrage
    pub fn set_rules(&mut self, rules: FilterRule) {
        let report = self.controller.set_rules(rules);
        self.report.record_reconcile(&report);
    }

    /// Cadre la carte sur une emprise explicite
    pub fn fit(&mut self, bounds: Bounds) {
        self.controller.widget_mut().fit_bounds(bounds);
        self.pump();
    }

    /// Équipements affichés, dans l'ordre de rendu
    pub fn visible(&self) -> Vec<&Facility> {
        self.controller.rendered().iter().map(|e| &e.facility).collect()
    }

    /// Contenu de l'overlay ouvert
    pub fn open_overlay(&self) -> Option<(&str, &OverlayContent)> {
        self.controller.widget().open_overlay()
    }

    pub fn controller(&self) -> &MapController<HeadlessMap> {
        &self.controller
    }

    pub fn report(&self) -> &SessionReport {
        &self.report
    }

    /// Clôt la session et retourne le rapport finalisé
    pub fn finish(mut self) -> SessionReport {
        self.report.set_duration(self.started.elapsed());
        self.report.finalize();
        info!(summary = %self.report.summary(), "Session finished");
        self.report
    }

    fn pump(&mut self) {
        for report in self.controller.pump() {
            self.report.record_reconcile(&report);
        }
    }

    fn finish_load(
        &mut self,
        token: RequestToken,
        result: Result<Vec<FacilityRecord>, FacilityError>,
    ) {
        if let Some(summary) = self.controller.complete_data_load(token, result) {
            let fingerprint = self.controller.store().fingerprint();
            self.report.record_load(&summary, fingerprint);
        }
    }

    fn finish_locate(
        &mut self,
        token: RequestToken,
        result: Result<LatLng, FacilityError>,
    ) {
        match self.controller.complete_locate(token, result) {
            LocateOutcome::Moved(position) => {
                self.report.record_notice(
                    NoticeLevel::Info,
                    format!("Centered on your location ({:.4}, {:.4})", position.lat, position.lng),
                );
            }
            LocateOutcome::Denied { notice } => {
                self.report.record_notice(NoticeLevel::Warning, notice);
            }
            LocateOutcome::Stale => {}
        }
    }
}
