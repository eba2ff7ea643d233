//! Définition et implémentation des commandes CLI
//!
//! - `render` (défaut): charge les données, filtre, affiche l'ensemble visible
//! - `replay`: rejoue un script d'événements carte

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use facility_map::{Bounds, CategoryFilter, FilterRule, OverlayContent};
use tracing::{info, warn};

use playground_finder::config::{Settings, DEFAULT_PRESET};
use playground_finder::export::export_to_geojson;
use playground_finder::replay::load_script;
use playground_finder::{Session, SessionReport, SessionStatus};

#[derive(Subcommand)]
pub enum Commands {
    /// Load facilities and print those visible on the map
    Render(RenderArgs),

    /// Replay a JSON script of map events
    Replay {
        /// Path to the replay script
        #[arg(short, long)]
        script: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },
}

/// Arguments partagés par les commandes
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Config preset name (seoul/han-river) or path to a JSON config
    #[arg(long)]
    pub config: Option<String>,

    /// Facility data file (source response JSON). Défaut : env PLAYGROUND_DATA
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Device location as "lat,lng". Défaut : env PLAYGROUND_LOCATION
    #[arg(long)]
    pub locate: Option<String>,

    /// Write the session report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

/// Arguments de la commande render
#[derive(Args, Debug, Clone, Default)]
pub struct RenderArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Explicit map bounds "south,west,north,east"
    #[arg(long)]
    pub bounds: Option<String>,

    /// Only free facilities
    #[arg(long)]
    pub free: bool,

    /// Only facilities with night lighting
    #[arg(long)]
    pub night_light: bool,

    /// Only facilities with parking
    #[arg(long)]
    pub parking: bool,

    /// Category: all, basketball, futsal, tennis, horizontal-bar, other
    #[arg(long)]
    pub category: Option<CategoryFilter>,

    /// Export visible facilities to a GeoJSON file
    #[arg(long)]
    pub geojson: Option<PathBuf>,
}

impl RenderArgs {
    /// Applique les drapeaux de filtrage sur les règles configurées
    fn rules(&self, base: FilterRule) -> FilterRule {
        FilterRule {
            free_only: base.free_only || self.free,
            need_night_light: base.need_night_light || self.night_light,
            need_parking: base.need_parking || self.parking,
            category: self.category.unwrap_or(base.category),
        }
    }
}

/// Exécute la commande render
pub async fn cmd_render(args: &RenderArgs) -> Result<()> {
    let settings = load_settings(&args.common)?;
    let bounds = args.bounds.as_deref().map(parse_bounds).transpose()?;
    let rules = args.rules(settings.rules);

    info!(
        config = %settings.name,
        data = ?settings.data,
        rules = ?rules,
        "Starting render"
    );

    let mut session = Session::new(settings)?;
    session.start(args.common.locate.as_deref()).await?;
    if let Some(bounds) = bounds {
        session.fit(bounds);
    }
    session.set_rules(rules);

    print_visible(&session);

    if let Some(ref path) = args.geojson {
        export_to_geojson(&session.visible(), path)?;
        println!("GeoJSON: {} facilities written to {}", session.visible().len(), path.display());
    }

    finish(session, args.common.report.as_deref())
}

/// Exécute la commande replay
pub async fn cmd_replay(script: &Path, common: &CommonArgs) -> Result<()> {
    let steps = load_script(script)?;
    let settings = load_settings(common)?;

    info!(script = %script.display(), steps = steps.len(), "Starting replay");

    let mut session = Session::new(settings)?;
    session.start(common.locate.as_deref()).await?;

    for (index, step) in steps.iter().enumerate() {
        session
            .apply(step)
            .await
            .context(format!("Step {} failed", index + 1))?;
        println!(
            "[{}] {:?} -> {} visible{}",
            index + 1,
            step,
            session.visible().len(),
            session
                .open_overlay()
                .map(|(id, _)| format!(", overlay {}", id))
                .unwrap_or_default()
        );
    }

    print_visible(&session);
    finish(session, common.report.as_deref())
}

fn load_settings(common: &CommonArgs) -> Result<Settings> {
    let spec = common.config.as_deref().unwrap_or(DEFAULT_PRESET);
    let mut settings = Settings::load_spec(spec)?;
    settings.apply_env();
    if let Some(ref data) = common.data {
        settings.data = Some(data.clone());
    }
    Ok(settings)
}

/// Parse une emprise "south,west,north,east"
fn parse_bounds(raw: &str) -> Result<Bounds> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| anyhow::anyhow!("Invalid number in bounds: '{}'", v.trim()))
        })
        .collect::<Result<_>>()?;

    match values.as_slice() {
        [south, west, north, east] => {
            let bounds = Bounds::new(*south, *west, *north, *east)?;
            if bounds.crosses_antimeridian() {
                warn!(
                    west = bounds.west(),
                    east = bounds.east(),
                    lng_span = bounds.lng_span(),
                    "West is greater than east: bounds cross the antimeridian (swapped values?)"
                );
            }
            Ok(bounds)
        }
        _ => anyhow::bail!(
            "Invalid bounds: '{}'. Expected south,west,north,east",
            raw
        ),
    }
}

fn print_visible(session: &Session) {
    let center = session.controller().center();
    let visible = session.visible();

    println!("=== {} visible facilities ===", visible.len());
    for facility in visible {
        let distance = center.distance_m(&facility.position());
        println!(
            "{:>8} {:>6.0} m  {}",
            facility.id,
            distance,
            OverlayContent::for_facility(facility).to_text()
        );
    }

    if let Some((id, content)) = session.open_overlay() {
        println!("\nOpen overlay [{}]: {}", id, content.to_text());
    }
}

fn finish(session: Session, report_path: Option<&Path>) -> Result<()> {
    let report: SessionReport = session.finish();
    report.display();

    if let Some(path) = report_path {
        report.save_to_file(path)?;
        println!("Report saved to {}", path.display());
    }

    if report.status == SessionStatus::Failed {
        anyhow::bail!("No facilities could be loaded");
    }
    Ok(())
}
