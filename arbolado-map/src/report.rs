//! Rapport de rendu avec dégradation gracieuse
//!
//! Une couche en échec n'empêche pas le rendu des autres ; le rapport
//! collecte le bilan de chaque couche et le statut global.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use geolayers::{ClusterIcon, Layer, LoadOutcome};
use serde::Serialize;

/// Statut global du rendu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RenderStatus {
    /// Toutes les couches actives ont été chargées
    Success,
    /// Au moins une couche en échec, au moins une chargée
    PartialSuccess,
    /// Aucune couche chargée et au moins un échec
    Failed,
}

/// Bilan d'une couche
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    Loaded,
    /// Chargée sans aucun élément rendable
    LoadedEmpty,
    Failed,
    Stale,
    Disabled,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerReport {
    pub layer_id: String,
    pub layer_name: String,
    pub kind: String,
    pub status: LayerStatus,
    pub elements: usize,
    /// Enregistrements sans géométrie exploitable
    pub skipped: usize,
    pub clustered: bool,
    /// Icône couvrant tous les marqueurs visibles d'une couche clusterisée
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_icon: Option<ClusterIcon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Rapport complet d'un rendu de projet
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub project_id: String,
    pub project_name: String,
    pub duration_secs: f64,
    pub status: RenderStatus,

    pub layers_loaded: usize,
    pub layers_failed: usize,
    pub elements_rendered: usize,
    pub records_skipped: usize,
    /// Éléments masqués après chargement
    pub elements_hidden: usize,
    /// Features écrites à l'export
    pub features_written: usize,

    /// Emprise `[min_x, min_y, max_x, max_y]` sur laquelle la vue a été ajustée
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[f64; 4]>,

    pub layers: Vec<LayerReport>,
}

impl RenderReport {
    pub fn new(project_id: &str, project_name: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            project_name: project_name.to_string(),
            duration_secs: 0.0,
            status: RenderStatus::Success,
            layers_loaded: 0,
            layers_failed: 0,
            elements_rendered: 0,
            records_skipped: 0,
            elements_hidden: 0,
            features_written: 0,
            bounds: None,
            layers: Vec::new(),
        }
    }

    /// Enregistre l'issue du chargement d'une couche
    pub fn record_outcome(&mut self, layer: &Layer, outcome: &LoadOutcome) {
        let mut entry = LayerReport {
            layer_id: layer.id.clone(),
            layer_name: layer.name.clone(),
            kind: layer.kind.tag().to_string(),
            status: LayerStatus::Stale,
            elements: 0,
            skipped: 0,
            clustered: false,
            cluster_icon: None,
            error: None,
        };

        match outcome {
            LoadOutcome::Loaded(stats) => {
                self.layers_loaded += 1;
                self.elements_rendered += stats.added;
                self.records_skipped += stats.skipped;
                entry.status = if stats.added == 0 {
                    LayerStatus::LoadedEmpty
                } else {
                    LayerStatus::Loaded
                };
                entry.elements = stats.added;
                entry.skipped = stats.skipped;
                entry.clustered = stats.clustered;
            }
            LoadOutcome::Failed(e) => {
                self.layers_failed += 1;
                entry.status = LayerStatus::Failed;
                entry.error = Some(e.to_string());
            }
            LoadOutcome::Stale => entry.status = LayerStatus::Stale,
            LoadOutcome::Disabled => entry.status = LayerStatus::Disabled,
        }

        self.layers.push(entry);
    }

    /// Une couche masquée après chargement ne compte plus dans le rendu
    pub fn record_layer_hidden(&mut self, layer_id: &str) {
        if let Some(entry) = self.layers.iter_mut().find(|l| l.layer_id == layer_id) {
            if matches!(entry.status, LayerStatus::Loaded | LayerStatus::LoadedEmpty) {
                self.elements_rendered -= entry.elements;
            }
            entry.status = LayerStatus::Disabled;
        }
    }

    pub fn set_cluster_icon(&mut self, layer_id: &str, icon: ClusterIcon) {
        if let Some(entry) = self.layers.iter_mut().find(|l| l.layer_id == layer_id) {
            entry.cluster_icon = Some(icon);
        }
    }

    pub fn record_element_hidden(&mut self) {
        self.elements_hidden += 1;
    }

    pub fn set_bounds(&mut self, bounds: Option<geo::Rect>) {
        self.bounds = bounds.map(|r| [r.min().x, r.min().y, r.max().x, r.max().y]);
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final à partir des couches
    pub fn finalize(&mut self) {
        self.status = if self.layers_failed == 0 {
            RenderStatus::Success
        } else if self.layers_loaded > 0 {
            RenderStatus::PartialSuccess
        } else {
            RenderStatus::Failed
        };
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("RENDER REPORT - {} ({})", self.project_name, self.project_id);
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!(
            "Layers: {} loaded, {} failed",
            self.layers_loaded, self.layers_failed
        );
        println!(
            "Elements: {} rendered, {} skipped, {} hidden, {} exported",
            self.elements_rendered, self.records_skipped, self.elements_hidden, self.features_written
        );
        if let Some([min_x, min_y, max_x, max_y]) = self.bounds {
            println!("Bounds: [{:.6}, {:.6}] - [{:.6}, {:.6}]", min_x, min_y, max_x, max_y);
        }

        if !self.layers.is_empty() {
            println!("\n--- BY LAYER ---");
            for l in &self.layers {
                let cluster = match &l.cluster_icon {
                    Some(icon) => format!(" (cluster {} {:?})", icon.count, icon.status),
                    None => String::new(),
                };
                match &l.error {
                    Some(error) => println!("  {} [{}]: {:?} {}", l.layer_name, l.kind, l.status, error),
                    None => println!(
                        "  {} [{}]: {:?}, {} elements, {} skipped{}",
                        l.layer_name, l.kind, l.status, l.elements, l.skipped, cluster
                    ),
                }
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} layers loaded, {} failed, {} elements, {} skipped",
            self.project_name,
            self.layers_loaded,
            self.layers_failed,
            self.elements_rendered,
            self.records_skipped
        )
    }
}
