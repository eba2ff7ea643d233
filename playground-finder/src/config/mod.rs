//! Configuration de la session

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use facility_map::render::headless::REFERENCE_LEVEL;
use facility_map::{AttributeSeed, ControllerOptions, FilterRule, LatLng, ReconcilePolicy, DEFAULT_CENTER};
use serde::{Deserialize, Serialize};

/// Presets embarqués
pub const PRESETS: [&str; 2] = ["seoul", "han-river"];

/// Preset utilisé quand aucune configuration n'est donnée
pub const DEFAULT_PRESET: &str = "seoul";

/// Configuration principale
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Nom affiché dans le rapport
    pub name: String,

    /// Centre initial de la carte (avant géolocalisation)
    pub center: LatLng,

    /// Niveau de zoom initial
    pub level: u8,

    /// Stratégie de réconciliation des marqueurs
    pub policy: ReconcilePolicy,

    /// Sel de synthèse des attributs manquants
    pub attribute_salt: String,

    /// Fichier de réponse de la source de données
    pub data: Option<PathBuf>,

    /// Règles de filtrage initiales
    pub rules: FilterRule,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            name: DEFAULT_PRESET.to_string(),
            center: DEFAULT_CENTER,
            level: REFERENCE_LEVEL,
            policy: ReconcilePolicy::default(),
            attribute_salt: AttributeSeed::default().salt().to_string(),
            data: None,
            rules: FilterRule::default(),
        }
    }
}

impl Settings {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let settings: Self = serde_json::from_str(&content).context("Failed to parse config JSON")?;
        settings.validate()
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "seoul" => Self::load_embedded(include_str!("presets/seoul.json")),
            "han-river" => Self::load_embedded(include_str!("presets/han-river.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: {}", preset, PRESETS.join(", ")),
        }
    }

    /// Preset par nom, sinon chemin de fichier
    pub fn load_spec(spec: &str) -> Result<Self> {
        if PRESETS.contains(&spec) {
            Self::from_preset(spec)
        } else {
            Self::load(Path::new(spec))
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json).context("Failed to parse embedded config")?;
        settings.validate()
    }

    fn validate(self) -> Result<Self> {
        if !self.center.is_finite() {
            anyhow::bail!("Config center must be finite, got {:?}", self.center);
        }
        Ok(self)
    }

    /// Surcharges par variables d'environnement
    ///
    /// - `PLAYGROUND_DATA`: fichier de données
    /// - `PLAYGROUND_SALT`: sel de synthèse des attributs
    pub fn apply_env(&mut self) {
        if let Ok(data) = std::env::var("PLAYGROUND_DATA") {
            if !data.is_empty() {
                self.data = Some(PathBuf::from(data));
            }
        }
        if let Ok(salt) = std::env::var("PLAYGROUND_SALT") {
            if !salt.is_empty() {
                self.attribute_salt = salt;
            }
        }
    }

    pub fn seed(&self) -> AttributeSeed {
        AttributeSeed::new(self.attribute_salt.clone())
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            policy: self.policy,
            default_center: self.center,
        }
    }
}
