//! Agrégation des marqueurs ponctuels en clusters
//!
//! Le partitionnement spatial appartient à la surface de carte ; ce module
//! décide quand une couche est clusterisée et calcule l'icône d'un cluster à
//! partir de ses membres.

use serde::{Deserialize, Serialize};

use crate::element::Primitive;
use crate::style::{Palette, StatusClass};
use crate::types::LayerKind;

/// Options transmises au groupe de clustering de la surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    pub show_coverage_on_hover: bool,
    pub spiderfy_on_max_zoom: bool,
    /// Zoom à partir duquel les marqueurs sont affichés individuellement
    pub disable_clustering_at_zoom: Option<u8>,
    pub chunked_loading: bool,
    /// Côté de l'icône carrée, en pixels
    pub icon_size: u32,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            show_coverage_on_hover: false,
            spiderfy_on_max_zoom: true,
            disable_clustering_at_zoom: Some(18),
            chunked_loading: true,
            icon_size: 40,
        }
    }
}

/// Icône d'un cluster : effectif et classe d'état la plus grave
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterIcon {
    pub count: usize,
    pub status: StatusClass,
    pub html: String,
    pub class_name: String,
    pub size: u32,
}

/// Classe CSS attendue par la feuille de style des clusters
pub fn css_class(status: StatusClass) -> &'static str {
    match status {
        StatusClass::Healthy => "cluster-saludable",
        StatusClass::NeedsPruning => "cluster-poda",
        StatusClass::AtRisk => "cluster-riesgo",
    }
}

/// Calcule les icônes de cluster à partir des couleurs des marqueurs membres
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterAggregator {
    palette: Palette,
    options: ClusterOptions,
}

impl ClusterAggregator {
    pub fn new(palette: Palette, options: ClusterOptions) -> Self {
        Self { palette, options }
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Au niveau cluster, le risque prime sur l'élagage, qui prime sur le sain
    pub fn status_of<'a>(&self, members: impl IntoIterator<Item = &'a Primitive>) -> StatusClass {
        let mut at_risk = 0usize;
        let mut pruning = 0usize;
        for fill in members.into_iter().filter_map(Primitive::marker_fill) {
            match self.palette.class_of(fill) {
                Some(StatusClass::AtRisk) => at_risk += 1,
                Some(StatusClass::NeedsPruning) => pruning += 1,
                _ => {}
            }
        }

        if at_risk > 0 {
            StatusClass::AtRisk
        } else if pruning > 0 {
            StatusClass::NeedsPruning
        } else {
            StatusClass::Healthy
        }
    }

    pub fn icon(&self, members: &[&Primitive]) -> ClusterIcon {
        let count = members.len();
        let status = self.status_of(members.iter().copied());
        ClusterIcon {
            count,
            status,
            html: format!("<div><span>{}</span></div>", count),
            class_name: format!("marker-cluster {}", css_class(status)),
            size: self.options.icon_size,
        }
    }
}

/// Nature du groupe visuel d'une couche
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKind {
    /// Groupe simple, sans agrégation
    Plain,
    /// Groupe de clustering, avec sa fabrique d'icônes
    Clustered(ClusterAggregator),
}

impl GroupKind {
    /// Choisit une fois par chargement : clustering seulement pour les couches
    /// ponctuelles et si la surface en est capable
    pub fn select(kind: &LayerKind, clustering_available: bool, aggregator: &ClusterAggregator) -> Self {
        if kind.is_point_like() && clustering_available {
            Self::Clustered(aggregator.clone())
        } else {
            Self::Plain
        }
    }

    pub fn is_clustered(&self) -> bool {
        matches!(self, Self::Clustered(_))
    }

    pub fn aggregator(&self) -> Option<&ClusterAggregator> {
        match self {
            Self::Clustered(aggregator) => Some(aggregator),
            Self::Plain => None,
        }
    }
}
