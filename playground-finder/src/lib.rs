//! # playground-finder
//!
//! Recherche d'équipements sportifs publics autour de soi, sur une carte
//! bornée par l'emprise visible.
//!
//! ## Features
//!
//! - Presets de configuration embarqués (`seoul`, `han-river`) ou fichier JSON
//! - Chargement des données et géolocalisation en parallèle, avec repli
//! - Rejeu de scripts d'événements carte
//! - Export GeoJSON de l'ensemble visible
//! - Rapport de session
//!
//! ## Usage CLI
//!
//! ```bash
//! # Équipements gratuits de basket autour de Boramae
//! playground-finder --data ./response.json --free --category basketball
//!
//! # Position fournie, export GeoJSON
//! playground-finder render --locate 37.5273,126.9351 --geojson visible.geojson
//!
//! # Rejeu d'un script
//! playground-finder replay --script ./scripts/tour.json
//! ```

pub mod config;
pub mod export;
pub mod replay;
pub mod report;
pub mod session;
pub mod sources;

pub use config::Settings;
pub use report::{SessionReport, SessionStatus};
pub use session::Session;
