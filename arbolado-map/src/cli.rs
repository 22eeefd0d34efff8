//! Définition et implémentation des commandes CLI
//!
//! - `projects` : liste des projets
//! - `layers` : couches d'un projet
//! - `render` : chargement d'un projet → GeoJSON + rapport

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use geolayers::DataSource;
use tracing::info;

use arbolado_map::config::Config;
use arbolado_map::export::export_to_geojson;
use arbolado_map::render::{render, RenderOptions};
use arbolado_map::source::pool::{create_pool, test_connection, DatabaseConfig, DatabaseOverrides};
use arbolado_map::source::{AnySource, JsonDirSource, PgSource};

/// Source des tables : répertoire JSON, sinon PostgreSQL
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Directory of exported tables (<table>.json); PostgreSQL is used when absent
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// PostgreSQL schema holding the tables (défaut : search_path)
    #[arg(long, global = true)]
    pub schema: Option<String>,

    /// PostgreSQL host (défaut : env PGHOST / localhost)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// PostgreSQL database name (défaut : env PGDATABASE / arbolado)
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// PostgreSQL user (défaut : env PGUSER / postgres)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// PostgreSQL password (défaut : env PGPASSWORD)
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// PostgreSQL port (défaut : env PGPORT / 5432)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// SSL mode: disable, prefer, require (défaut : env PGSSLMODE / disable)
    #[arg(long, global = true)]
    pub ssl: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List projects
    Projects,

    /// List the layers of a project
    Layers {
        /// Project id
        #[arg(short, long)]
        project: String,
    },

    /// Load every layer of a project and export the visible elements to GeoJSON
    Render {
        /// Project id
        #[arg(short, long)]
        project: String,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Write the JSON render report to this file
        #[arg(long)]
        report: Option<PathBuf>,

        /// Config preset name (default/english) or path to a JSON config
        #[arg(long, default_value = "default")]
        config: String,

        /// Layer id to disable after loading (repeatable)
        #[arg(long = "hide-layer")]
        hide_layer: Vec<String>,

        /// Element to hide, as LAYER/ELEMENT (repeatable)
        #[arg(long = "hide-element", value_parser = parse_element_ref)]
        hide_element: Vec<(String, String)>,

        /// Render without point clustering
        #[arg(long)]
        no_cluster: bool,
    },
}

/// `LAYER/ELEMENT`, ex. `12/12-3`
fn parse_element_ref(s: &str) -> Result<(String, String), String> {
    match s.split_once('/') {
        Some((layer, element)) if !layer.is_empty() && !element.is_empty() => {
            Ok((layer.to_string(), element.to_string()))
        }
        _ => Err(format!("Invalid element reference: {}. Use LAYER/ELEMENT", s)),
    }
}

/// Ouvre la source choisie (vérifie la connexion PostgreSQL)
pub async fn open_source(args: &SourceArgs) -> Result<AnySource> {
    if let Some(dir) = &args.data {
        if !dir.is_dir() {
            anyhow::bail!("Data directory not found: {}", dir.display());
        }
        return Ok(AnySource::Json(JsonDirSource::new(dir)));
    }

    let mut db_config = DatabaseConfig::from_env();
    db_config.apply(DatabaseOverrides {
        host: args.host.clone(),
        database: args.database.clone(),
        user: args.user.clone(),
        password: args.password.clone(),
        port: args.port,
        ssl: args.ssl.clone(),
    })?;
    println!(
        "Database: {}@{}:{}/{} (SSL: {:?})",
        db_config.user, db_config.host, db_config.port, db_config.dbname, db_config.ssl_mode
    );

    let pool = create_pool(&db_config)?;
    test_connection(&pool).await?;

    let mut source = PgSource::new(pool, &db_config);
    if let Some(schema) = &args.schema {
        source = source.with_schema(schema.clone());
    }
    Ok(AnySource::Postgres(source))
}

/// Exécute la commande projects
pub async fn cmd_projects(args: &SourceArgs) -> Result<()> {
    let source = open_source(args).await?;
    let projects = source.projects().await?;

    println!("=== Projects ({}) ===", source.description());
    for project in &projects {
        println!("  {}  {}", project.id, project.name);
    }
    println!("{} project(s)", projects.len());
    Ok(())
}

/// Exécute la commande layers
pub async fn cmd_layers(args: &SourceArgs, project: &str) -> Result<()> {
    let source = open_source(args).await?;
    let layers = source.layers(project).await?;

    println!("=== Layers of project {} ===", project);
    for layer in &layers {
        println!(
            "  {}  {} [{} -> {}]",
            layer.id,
            layer.name,
            layer.kind,
            layer.kind.table()
        );
    }
    println!("{} layer(s)", layers.len());
    Ok(())
}

/// Exécute la commande render
pub async fn cmd_render(
    args: &SourceArgs,
    options: RenderOptions,
    config_spec: &str,
    output: &Path,
    report_path: Option<&Path>,
) -> Result<()> {
    let config = Config::resolve(config_spec)
        .with_context(|| format!("Failed to load config: {}", config_spec))?;
    let source = open_source(args).await?;

    println!("=== Render project {} ===", options.project_id);
    println!("Source: {}", source.description());
    println!("Config: {}", config_spec);
    println!("Clustering: {}", options.clustering);

    let (session, mut report) = render(&source, &config, &options).await?;

    let written = export_to_geojson(&session, output)?;
    report.features_written = written;
    info!(output = %output.display(), features = written, "GeoJSON written");

    report.display();
    if let Some(path) = report_path {
        report.save_to_file(path)?;
        println!("Report saved to {}", path.display());
    }
    println!("{}", report.summary());

    Ok(())
}
