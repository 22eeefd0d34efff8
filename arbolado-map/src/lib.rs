//! # arbolado-map
//!
//! Rendu headless des couches d'inventaire arboré d'un projet, au-dessus du
//! moteur `geolayers`.
//!
//! ## Features
//!
//! - Source PostgreSQL avec pool de connexions (TLS optionnel)
//! - Source alternative : répertoire de tables exportées en JSON
//! - Surface de carte en mémoire, export GeoJSON des éléments visibles
//! - Rapport de rendu par couche
//!
//! ## Usage CLI
//!
//! ```bash
//! # Projets et couches
//! arbolado-map projects
//! arbolado-map layers --project 3
//!
//! # Rendu d'un projet depuis des tables JSON
//! arbolado-map --data ./tablas render --project 3 --output ./proyecto-3.geojson
//! ```

pub mod config;
pub mod export;
pub mod render;
pub mod report;
pub mod source;
pub mod surface;

pub use config::Config;
pub use render::{render, RenderOptions};
pub use report::{RenderReport, RenderStatus};
pub use surface::SnapshotSurface;
