//! Point d'entrée CLI pour playground-finder

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::{Commands, RenderArgs};

/// Trouver les équipements sportifs publics visibles sur la carte
#[derive(Parser)]
#[command(name = "playground-finder")]
#[command(author, version)]
#[command(about = "Find public sports facilities visible on the map (default) or replay map events")]
#[command(long_about = "Charge les équipements sportifs publics, filtre par emprise visible et par facettes, et affiche les marqueurs.\n\nPar défaut, exécute 'render'. Utilisez 'replay' pour rejouer un script d'événements carte.")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Sous-commande (défaut: render)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments de render (commande par défaut)
    #[command(flatten)]
    render: Option<RenderArgs>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Render(args)) => cli::cmd_render(&args).await?,
        Some(Commands::Replay { script, common }) => cli::cmd_replay(&script, &common).await?,
        None => {
            let args = cli.render.unwrap_or_default();
            cli::cmd_render(&args).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
