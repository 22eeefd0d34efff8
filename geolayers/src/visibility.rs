//! Visibilité des couches et des éléments, indépendante du rechargement des données

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::registry::LayerRegistry;
use crate::surface::MapSurface;

/// Couche → (élément → visible) ; absent signifie visible
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityState {
    elements: HashMap<String, HashMap<String, bool>>,
}

impl VisibilityState {
    pub fn is_visible(&self, layer_id: &str, element_id: &str) -> bool {
        self.elements
            .get(layer_id)
            .and_then(|layer| layer.get(element_id))
            .copied()
            .unwrap_or(true)
    }

    pub fn set(&mut self, layer_id: &str, element_id: &str, visible: bool) {
        self.elements
            .entry(layer_id.to_string())
            .or_default()
            .insert(element_id.to_string(), visible);
    }

    /// Éléments explicitement masqués d'une couche
    pub fn hidden(&self, layer_id: &str) -> Vec<&str> {
        let mut hidden: Vec<&str> = self
            .elements
            .get(layer_id)
            .into_iter()
            .flatten()
            .filter(|(_, visible)| !**visible)
            .map(|(id, _)| id.as_str())
            .collect();
        hidden.sort_unstable();
        hidden
    }

    pub fn clear_layer(&mut self, layer_id: &str) {
        self.elements.remove(layer_id);
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Effet d'une bascule de couche
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerToggle {
    /// Groupe et éléments retirés
    Hidden,
    /// La couche doit être re-téléchargée et reconstruite par l'appelant
    ReloadRequired,
}

/// Bascule la visibilité au niveau couche et au niveau élément
#[derive(Debug, Default)]
pub struct VisibilityController {
    state: VisibilityState,
    disabled_layers: HashSet<String>,
}

impl VisibilityController {
    pub fn state(&self) -> &VisibilityState {
        &self.state
    }

    /// Une couche est active tant qu'elle n'a pas été désactivée
    pub fn is_layer_enabled(&self, layer_id: &str) -> bool {
        !self.disabled_layers.contains(layer_id)
    }

    /// Changement de projet : tout redevient visible
    pub fn reset(&mut self) {
        self.state.clear();
        self.disabled_layers.clear();
    }

    /// Les éléments d'une couche rechargée sont neufs et visibles par défaut ;
    /// les choix précédents par élément sont oubliés.
    pub fn layer_reloaded(&mut self, layer_id: &str) {
        self.state.clear_layer(layer_id);
    }

    /// Désactiver retire le groupe (sans cache) ; réactiver demande un rechargement
    pub fn set_layer_visible<M: MapSurface + ?Sized>(
        &mut self,
        registry: &mut LayerRegistry,
        surface: &mut M,
        layer_id: &str,
        visible: bool,
    ) -> LayerToggle {
        if visible {
            self.disabled_layers.remove(layer_id);
            LayerToggle::ReloadRequired
        } else {
            self.disabled_layers.insert(layer_id.to_string());
            registry.unload_layer(surface, layer_id);
            LayerToggle::Hidden
        }
    }

    /// No-op silencieux si l'élément ou sa couche n'est pas (encore) enregistré
    ///
    /// Retourne `true` si la bascule a été appliquée.
    pub fn set_element_visible<M: MapSurface + ?Sized>(
        &mut self,
        registry: &mut LayerRegistry,
        surface: &mut M,
        layer_id: &str,
        element_id: &str,
        visible: bool,
    ) -> bool {
        match registry.set_member(surface, layer_id, element_id, visible) {
            Some(changed) => {
                self.state.set(layer_id, element_id, visible);
                debug!(layer_id, element_id, visible, changed, "Element visibility set");
                true
            }
            None => {
                debug!(layer_id, element_id, "Element not registered, toggle ignored");
                false
            }
        }
    }
}
