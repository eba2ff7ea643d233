//! # facility-map
//!
//! Moteur de carte d'équipements borné par l'emprise visible.
//!
//! ## Features
//!
//! - Normalisation des réponses de la source publique (formes variables,
//!   coordonnées texte) et jeu d'échantillons de repli
//! - Filtre par emprise (antiméridien compris) puis par facettes
//!   (gratuit, éclairage, parking, catégorie)
//! - Réconciliation des marqueurs par identifiant, sans fuite ni doublon
//! - Au plus un overlay de détail ouvert
//! - Contrôleur explicite, jetons de requête contre les réponses obsolètes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use facility_map::{ControllerOptions, MapController, RequestKind};
//!
//! let mut controller = MapController::headless(ControllerOptions::default())?;
//! let token = controller.begin_request(RequestKind::Data);
//! let summary = controller.complete_data_load(token, facility_map::ingest::sample_records());
//!
//! for id in controller.rendered().ids() {
//!     println!("{}", id);
//! }
//! ```

pub mod controller;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod render;
pub mod store;
pub mod types;

pub use controller::{
    ControllerOptions, DataLoadSummary, DataOrigin, LocateOutcome, MapController, RequestKind,
    RequestToken, DEFAULT_CENTER,
};
pub use error::FacilityError;
pub use filter::{select_by_rules, select_in_bounds, visible_facilities, Bounds, CategoryFilter, FilterRule};
pub use ingest::AttributeSeed;
pub use render::{
    reconcile, HeadlessMap, MapEvent, MapWidget, OverlayContent, ReconcilePolicy, ReconcileReport,
    RenderedSet,
};
pub use store::{FacilityStore, LoadReport};
pub use types::{Category, Facility, FacilityRecord, InferredFields, LatLng};
