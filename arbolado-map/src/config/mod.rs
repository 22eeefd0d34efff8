//! Configuration du moteur de couches

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{Context, Result};
use geolayers::{
    AxisStrategy, ClusterAggregator, ClusterOptions, ElementBuilder, FieldCatalog, FitOptions,
    GeometryExtractor, LayerRegistry, Palette, StatusKeywords, StyleResolver,
};

/// Configuration principale
///
/// Chaque section absente du JSON prend la valeur par défaut du schéma
/// d'origine (champs en espagnol, palette et options de clustering d'origine).
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Noms de champs reconnus par rôle, en ordre de priorité
    pub fields: FieldCatalog,

    /// Stratégie d'ordre des axes pour les couples extraits
    pub axis: AxisStrategy,

    /// Mots-clés de condition
    pub keywords: StatusKeywords,

    pub palette: Palette,

    pub cluster: ClusterOptions,

    /// Ajustement de la vue après chargement
    pub fit: FitOptions,
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            "english" => Self::load_embedded(include_str!("presets/english.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: default, english", preset),
        }
    }

    /// Nom de preset ou chemin vers un fichier JSON
    pub fn resolve(spec: &str) -> Result<Self> {
        let path = Path::new(spec);
        if path.extension().is_some_and(|ext| ext == "json") || path.exists() {
            Self::load(path)
        } else {
            Self::from_preset(spec)
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    pub fn element_builder(&self) -> ElementBuilder {
        ElementBuilder::new(
            GeometryExtractor::new(self.fields.clone(), self.axis),
            StyleResolver::new(self.keywords.clone(), self.palette.clone()),
        )
    }

    /// Registre vide, prêt pour une session
    pub fn registry(&self) -> LayerRegistry {
        LayerRegistry::new(
            self.element_builder(),
            ClusterAggregator::new(self.palette.clone(), self.cluster.clone()),
        )
    }
}
