//! Point d'entrée CLI pour arbolado-map

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use arbolado_map::render::RenderOptions;

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

use cli::{Commands, SourceArgs};

/// Rendu des couches d'inventaire arboré d'un projet vers GeoJSON
#[derive(Parser)]
#[command(name = "arbolado-map")]
#[command(author, version)]
#[command(about = "Charger les couches d'un projet (arbres, segments, polygones) et exporter le rendu en GeoJSON")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    source: SourceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Projects => cli::cmd_projects(&cli.source).await?,
        Commands::Layers { project } => cli::cmd_layers(&cli.source, &project).await?,
        Commands::Render {
            project,
            output,
            report,
            config,
            hide_layer,
            hide_element,
            no_cluster,
        } => {
            info!(project = %project, output = %output.display(), "Render");
            let options = RenderOptions {
                project_id: project,
                hidden_layers: hide_layer,
                hidden_elements: hide_element,
                clustering: !no_cluster,
            };
            cli::cmd_render(&cli.source, options, &config, &output, report.as_deref()).await?;
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
