//! Rendu headless d'un projet : chargement, visibilité, bilan

use std::time::Instant;

use anyhow::{Context, Result};
use geolayers::{DataSource, LoadOutcome, Session};
use tracing::{info, warn};

use crate::config::Config;
use crate::report::RenderReport;
use crate::surface::SnapshotSurface;

/// Paramètres d'un rendu
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub project_id: String,
    /// Couches désactivées après chargement
    pub hidden_layers: Vec<String>,
    /// Éléments masqués, `(id couche, id élément)`
    pub hidden_elements: Vec<(String, String)>,
    /// Surface capable de clustering
    pub clustering: bool,
}

/// Ouvre le projet, applique la visibilité demandée et retourne la session
///
/// # Errors
///
/// Projet inconnu, ou échec de la liste des projets ou des couches. Un
/// échec de couche est seulement rapporté.
pub async fn render<S: DataSource>(
    source: &S,
    config: &Config,
    options: &RenderOptions,
) -> Result<(Session<SnapshotSurface>, RenderReport)> {
    let start = Instant::now();

    let projects = source.projects().await.context("Failed to list projects")?;
    let project = projects
        .into_iter()
        .find(|p| p.id == options.project_id)
        .with_context(|| format!("Unknown project: {}", options.project_id))?;

    let mut report = RenderReport::new(&project.id, &project.name);
    let mut session = Session::new(
        SnapshotSurface::new(options.clustering),
        config.registry(),
        config.fit.clone(),
    );

    let load = session
        .open_project(source, Some(project))
        .await
        .context("Failed to load project layers")?;

    for (layer, outcome) in &load.outcomes {
        report.record_outcome(layer, outcome);
    }
    info!(
        project = %options.project_id,
        layers = load.outcomes.len(),
        failed = load.outcomes.iter().filter(|(_, o)| matches!(o, LoadOutcome::Failed(_))).count(),
        "Project loaded"
    );

    let mut bounds = load.bounds;
    let mut hidden_any = false;
    for layer_id in &options.hidden_layers {
        if !session.layers().iter().any(|l| &l.id == layer_id) {
            warn!(layer_id, "Layer not in project, nothing to hide");
            continue;
        }
        match session.set_layer_visible(source, layer_id, false).await {
            Ok(_) => {
                report.record_layer_hidden(layer_id);
                hidden_any = true;
            }
            Err(e) => warn!(layer_id, error = %e, "Cannot hide layer"),
        }
    }
    // La vue ne couvre que les couches restées actives
    if hidden_any {
        bounds = session.fit_to_loaded();
    }

    for (layer_id, element_id) in &options.hidden_elements {
        if session.set_element_visible(layer_id, element_id, false) {
            report.record_element_hidden();
        } else {
            warn!(layer_id, element_id, "Element not rendered, nothing to hide");
        }
    }

    for layer in session.layers() {
        if let Some(icon) = session.registry().cluster_icon(&layer.id) {
            report.set_cluster_icon(&layer.id, icon);
        }
    }

    report.set_bounds(bounds);
    report.set_duration(start.elapsed());
    report.finalize();

    Ok((session, report))
}
