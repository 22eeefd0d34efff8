//! Interface de la surface de carte hôte
//!
//! Le rendu bas niveau (tuiles, pan/zoom, partitionnement des clusters)
//! appartient à l'hôte. Le cœur ne fait que piloter l'appartenance des
//! primitives aux groupes visuels.

use geo::Rect;
use serde::{Deserialize, Serialize};

use crate::cluster::GroupKind;
use crate::element::Primitive;

/// Options d'ajustement de la vue sur l'emprise des couches chargées
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Marge en pixels (horizontale, verticale)
    pub padding: [u32; 2],
    pub max_zoom: u8,
    pub animate: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding: [20, 20],
            max_zoom: 18,
            animate: true,
        }
    }
}

/// Surface de carte pilotée par le registre de couches
///
/// Un groupe par couche, identifié par l'id de couche ; chaque primitive est
/// identifiée dans son groupe par l'id de son élément.
pub trait MapSurface {
    /// Capacité de clustering, détectée à l'exécution
    fn supports_clustering(&self) -> bool {
        false
    }

    /// Pose un groupe et ses primitives initiales sur la carte
    fn add_group(&mut self, layer_id: &str, kind: &GroupKind, members: &[(&str, &Primitive)]);

    fn remove_group(&mut self, layer_id: &str);

    fn add_primitive(&mut self, layer_id: &str, element_id: &str, primitive: &Primitive);

    fn remove_primitive(&mut self, layer_id: &str, element_id: &str);

    fn fit_bounds(&mut self, bounds: Rect, options: &FitOptions);
}
