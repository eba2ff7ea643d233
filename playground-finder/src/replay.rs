//! Scripts d'événements carte rejoués par la session
//!
//! Un script est une liste JSON d'étapes:
//!
//! ```json
//! [
//!   { "action": "fit", "south": 37.40, "west": 126.90, "north": 37.55, "east": 126.99 },
//!   { "action": "rules", "rules": { "free_only": true, "category": "basketball" } },
//!   { "action": "click", "id": "P001" },
//!   { "action": "background" }
//! ]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use facility_map::FilterRule;
use serde::{Deserialize, Serialize};

/// Une étape du script
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Step {
    /// Glisser la carte vers un centre
    Pan { lat: f64, lng: f64 },
    /// Changer le niveau de zoom
    Zoom { level: u8 },
    /// Cadrer sur une emprise
    Fit {
        south: f64,
        west: f64,
        north: f64,
        east: f64,
    },
    /// Remplacer les règles de filtrage
    Rules { rules: FilterRule },
    /// Cliquer sur un marqueur
    Click { id: String },
    /// Cliquer sur le fond de carte
    Background,
    /// Recharger les données (depuis un autre fichier si précisé)
    Reload {
        #[serde(default)]
        data: Option<PathBuf>,
    },
    /// Demander la position
    Locate {
        #[serde(default)]
        position: Option<String>,
    },
}

/// Charge un script depuis un fichier
pub fn load_script(path: &Path) -> Result<Vec<Step>> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read replay script: {}", path.display()))?;
    parse_script(&content).context(format!("Invalid replay script: {}", path.display()))
}

pub fn parse_script(json: &str) -> Result<Vec<Step>> {
    Ok(serde_json::from_str(json)?)
}
