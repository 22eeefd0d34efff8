//! Résolution du style : classe d'état sanitaire, couleur et style structurel

use serde::{Deserialize, Serialize};

use crate::types::LayerKind;

/// Classe d'état dérivée du texte de condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusClass {
    Healthy,
    NeedsPruning,
    AtRisk,
}

/// Couleurs par classe d'état
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub healthy: String,
    pub needs_pruning: String,
    pub at_risk: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            healthy: "#2e7d32".into(),
            needs_pruning: "#fbc02d".into(),
            at_risk: "#d32f2f".into(),
        }
    }
}

impl Palette {
    pub fn color(&self, class: StatusClass) -> &str {
        match class {
            StatusClass::Healthy => &self.healthy,
            StatusClass::NeedsPruning => &self.needs_pruning,
            StatusClass::AtRisk => &self.at_risk,
        }
    }

    /// Classe correspondant à une couleur de remplissage, si elle en est une
    pub fn class_of(&self, color: &str) -> Option<StatusClass> {
        [
            StatusClass::AtRisk,
            StatusClass::NeedsPruning,
            StatusClass::Healthy,
        ]
        .into_iter()
        .find(|class| self.color(*class).eq_ignore_ascii_case(color))
    }
}

/// Mots-clés de condition, recherchés en sous-chaîne dans le texte en minuscules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusKeywords {
    pub pruning: Vec<String>,
    pub at_risk: Vec<String>,
}

impl Default for StatusKeywords {
    fn default() -> Self {
        Self {
            pruning: vec!["poda".into(), "regul".into(), "medio".into()],
            at_risk: vec!["riesgo".into(), "mal".into(), "critico".into()],
        }
    }
}

/// Style d'un tracé (ligne ou polygone)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    /// Présent uniquement pour les styles remplis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
}

/// Marqueur circulaire coloré selon l'état
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerStyle {
    pub radius: f64,
    pub fill_color: String,
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
    pub fill_opacity: f64,
}

const LINE_COLOR: &str = "#1976d2";
const AREA_COLOR: &str = "#f57c00";
const MARKER_OUTLINE: &str = "#ffffff";
const MARKER_RADIUS: f64 = 6.0;

/// Associe une condition à une classe et une couleur, et un type de couche à un style
#[derive(Debug, Clone, Default)]
pub struct StyleResolver {
    keywords: StatusKeywords,
    palette: Palette,
}

impl StyleResolver {
    pub fn new(keywords: StatusKeywords, palette: Palette) -> Self {
        Self { keywords, palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// L'élagage est testé avant le risque : si les deux matchent, l'élagage gagne
    pub fn classify(&self, status: Option<&str>) -> StatusClass {
        let Some(status) = status else {
            return StatusClass::Healthy;
        };
        let lower = status.to_lowercase();
        let matches = |keywords: &[String]| keywords.iter().any(|k| lower.contains(k.as_str()));

        if matches(self.keywords.pruning.as_slice()) {
            StatusClass::NeedsPruning
        } else if matches(self.keywords.at_risk.as_slice()) {
            StatusClass::AtRisk
        } else {
            StatusClass::Healthy
        }
    }

    pub fn color(&self, class: StatusClass) -> &str {
        self.palette.color(class)
    }

    /// Style des lignes et polygones selon le type de couche
    pub fn path_style(&self, kind: &LayerKind) -> PathStyle {
        if kind.is_line_like() {
            PathStyle {
                color: LINE_COLOR.into(),
                weight: 3.0,
                opacity: 0.9,
                fill_opacity: None,
            }
        } else {
            PathStyle {
                color: AREA_COLOR.into(),
                weight: 4.0,
                opacity: 0.8,
                fill_opacity: Some(0.4),
            }
        }
    }

    /// Marqueur à rayon fixe, rempli de la couleur d'état, contour blanc
    pub fn marker_style(&self, class: StatusClass) -> MarkerStyle {
        MarkerStyle {
            radius: MARKER_RADIUS,
            fill_color: self.color(class).to_string(),
            color: MARKER_OUTLINE.into(),
            weight: 2.0,
            opacity: 1.0,
            fill_opacity: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_defaults_to_healthy() {
        let resolver = StyleResolver::default();
        assert_eq!(resolver.classify(None), StatusClass::Healthy);
        assert_eq!(resolver.classify(Some("Bueno")), StatusClass::Healthy);
    }

    #[test]
    fn test_classify_keywords() {
        let resolver = StyleResolver::default();
        assert_eq!(resolver.classify(Some("Necesita PODA")), StatusClass::NeedsPruning);
        assert_eq!(resolver.classify(Some("regular")), StatusClass::NeedsPruning);
        assert_eq!(resolver.classify(Some("Riesgo alto")), StatusClass::AtRisk);
        assert_eq!(resolver.classify(Some("critico")), StatusClass::AtRisk);
    }

    #[test]
    fn test_pruning_wins_over_risk() {
        let resolver = StyleResolver::default();
        assert_eq!(
            resolver.classify(Some("riesgo, requiere poda")),
            StatusClass::NeedsPruning
        );
    }

    #[test]
    fn test_substring_matching_is_literal() {
        // "normal" contient "mal"
        let resolver = StyleResolver::default();
        assert_eq!(resolver.classify(Some("normal")), StatusClass::AtRisk);
    }

    #[test]
    fn test_colors() {
        let resolver = StyleResolver::default();
        assert_eq!(resolver.color(StatusClass::AtRisk), "#d32f2f");
        assert_eq!(resolver.color(StatusClass::NeedsPruning), "#fbc02d");
        assert_eq!(resolver.color(StatusClass::Healthy), "#2e7d32");
        assert_eq!(
            resolver.palette().class_of("#D32F2F"),
            Some(StatusClass::AtRisk)
        );
        assert_eq!(resolver.palette().class_of("#ffffff"), None);
    }

    #[test]
    fn test_path_styles_by_kind() {
        let resolver = StyleResolver::default();
        let line = resolver.path_style(&LayerKind::new("Segmentos"));
        assert_eq!(line.color, "#1976d2");
        assert_eq!(line.weight, 3.0);
        assert!(line.fill_opacity.is_none());

        let area = resolver.path_style(&LayerKind::new("poligonos"));
        assert_eq!(area.color, "#f57c00");
        assert_eq!(area.fill_opacity, Some(0.4));
    }

    #[test]
    fn test_marker_style() {
        let resolver = StyleResolver::default();
        let marker = resolver.marker_style(StatusClass::NeedsPruning);
        assert_eq!(marker.radius, 6.0);
        assert_eq!(marker.fill_color, "#fbc02d");
        assert_eq!(marker.color, "#ffffff");
    }
}
