//! Rapport de session avec dégradation gracieuse
//!
//! Collecte les chargements, les passes de réconciliation et les avis
//! non fatals (repli sur les données d'exemple, position refusée).

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use facility_map::{DataLoadSummary, DataOrigin, ReconcileReport};
use serde::Serialize;

/// Statut global de la session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    /// Données de la source, aucun avis
    Success,
    /// Session utilisable avec des replis
    Degraded,
    /// Aucun équipement chargé
    Failed,
}

/// Niveau d'un avis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Avis destiné à l'utilisateur
#[derive(Debug, Clone, Serialize)]
pub struct SessionNotice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Rapport complet de session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    /// Configuration utilisée
    pub config: String,
    /// Durée de la session
    pub duration_secs: f64,
    /// Statut global
    pub status: SessionStatus,

    /// Provenance du dernier chargement
    pub data_origin: Option<DataOrigin>,
    /// Empreinte blake3 du jeu de données (hex)
    pub dataset_fingerprint: Option<String>,
    /// Nombre de chargements de données
    pub loads: usize,
    /// Équipements acceptés au dernier chargement
    pub facilities_loaded: usize,
    /// Enregistrements rejetés au dernier chargement
    pub facilities_rejected: usize,

    // Compteurs de réconciliation cumulés
    /// Nombre de passes
    pub passes: usize,
    pub markers_created: usize,
    pub markers_retained: usize,
    pub markers_replaced: usize,
    pub markers_removed: usize,
    /// Marqueurs affichés après la dernière passe
    pub markers_visible: usize,

    /// Avis non fatals
    pub notices: Vec<SessionNotice>,
}

impl SessionReport {
    pub fn new(config: &str) -> Self {
        Self {
            config: config.to_string(),
            duration_secs: 0.0,
            status: SessionStatus::Success,
            data_origin: None,
            dataset_fingerprint: None,
            loads: 0,
            facilities_loaded: 0,
            facilities_rejected: 0,
            passes: 0,
            markers_created: 0,
            markers_retained: 0,
            markers_replaced: 0,
            markers_removed: 0,
            markers_visible: 0,
            notices: Vec::new(),
        }
    }

    /// Enregistre un chargement de données et la passe qu'il a déclenchée
    pub fn record_load(&mut self, summary: &DataLoadSummary, fingerprint: [u8; 32]) {
        self.loads += 1;
        self.data_origin = Some(summary.origin);
        self.dataset_fingerprint = Some(hex::encode(fingerprint));
        self.facilities_loaded = summary.load.accepted;
        self.facilities_rejected = summary.load.total_rejected();

        if summary.origin == DataOrigin::Fallback {
            let reason = summary.error.as_deref().unwrap_or("unknown error");
            self.record_notice(
                NoticeLevel::Warning,
                format!("Data source failed ({}); showing sample facilities", reason),
            );
        }
        self.record_reconcile(&summary.reconcile);
    }

    /// Enregistre une passe de réconciliation
    pub fn record_reconcile(&mut self, report: &ReconcileReport) {
        self.passes += 1;
        self.markers_created += report.created;
        self.markers_retained += report.retained;
        self.markers_replaced += report.replaced;
        self.markers_removed += report.removed;
        self.markers_visible = report.rendered();
    }

    pub fn record_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(SessionNotice {
            level,
            message: message.into(),
        });
    }

    /// Définit la durée de la session
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        let has_warnings = self.notices.iter().any(|n| n.level == NoticeLevel::Warning);

        self.status = if self.loads == 0 || self.facilities_loaded == 0 {
            SessionStatus::Failed
        } else if has_warnings || self.data_origin == Some(DataOrigin::Fallback) {
            SessionStatus::Degraded
        } else {
            SessionStatus::Success
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("SESSION REPORT - {}", self.config);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- DATA ---");
        match self.data_origin {
            Some(origin) => println!(
                "Origin: {:?} ({} loads), {} facilities, {} rejected",
                origin, self.loads, self.facilities_loaded, self.facilities_rejected
            ),
            None => println!("No data loaded"),
        }
        if let Some(ref fingerprint) = self.dataset_fingerprint {
            println!("Fingerprint: {}", &fingerprint[..16.min(fingerprint.len())]);
        }

        println!("\n--- MARKERS ---");
        println!(
            "{} passes: {} created, {} retained, {} replaced, {} removed",
            self.passes,
            self.markers_created,
            self.markers_retained,
            self.markers_replaced,
            self.markers_removed
        );
        println!("Visible: {}", self.markers_visible);

        if !self.notices.is_empty() {
            println!("\n--- NOTICES ({}) ---", self.notices.len());
            for n in &self.notices {
                println!("  {:?} {}", n.level, n.message);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).context(format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} facilities, {} visible, {} passes, {} notices",
            self.config,
            self.facilities_loaded,
            self.markers_visible,
            self.passes,
            self.notices.len()
        )
    }
}
