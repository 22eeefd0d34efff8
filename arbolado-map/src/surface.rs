//! Surface de carte en mémoire : garde l'état posé pour l'export

use std::collections::BTreeMap;

use geo::Rect;
use geolayers::{FitOptions, GroupKind, MapSurface, Primitive};
use tracing::trace;

/// Groupe visuel tel que posé sur la surface
#[derive(Debug, Clone, Default)]
pub struct SnapshotGroup {
    pub clustered: bool,
    pub members: BTreeMap<String, Primitive>,
}

/// Surface sans affichage ; les primitives posées constituent le rendu
#[derive(Debug, Clone, Default)]
pub struct SnapshotSurface {
    clustering: bool,
    groups: BTreeMap<String, SnapshotGroup>,
    fitted: Option<(Rect, FitOptions)>,
}

impl SnapshotSurface {
    pub fn new(clustering: bool) -> Self {
        Self {
            clustering,
            ..Default::default()
        }
    }

    pub fn group(&self, layer_id: &str) -> Option<&SnapshotGroup> {
        self.groups.get(layer_id)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &SnapshotGroup)> {
        self.groups.iter().map(|(id, group)| (id.as_str(), group))
    }

    pub fn is_shown(&self, layer_id: &str, element_id: &str) -> bool {
        self.groups
            .get(layer_id)
            .is_some_and(|g| g.members.contains_key(element_id))
    }

    /// Nombre total de primitives posées
    pub fn primitive_count(&self) -> usize {
        self.groups.values().map(|g| g.members.len()).sum()
    }

    /// Dernier ajustement de vue demandé
    pub fn fitted(&self) -> Option<&(Rect, FitOptions)> {
        self.fitted.as_ref()
    }
}

impl MapSurface for SnapshotSurface {
    fn supports_clustering(&self) -> bool {
        self.clustering
    }

    fn add_group(&mut self, layer_id: &str, kind: &GroupKind, members: &[(&str, &Primitive)]) {
        let group = SnapshotGroup {
            clustered: kind.is_clustered(),
            members: members
                .iter()
                .map(|(id, primitive)| (id.to_string(), (*primitive).clone()))
                .collect(),
        };
        trace!(layer_id, members = group.members.len(), clustered = group.clustered, "Group added");
        self.groups.insert(layer_id.to_string(), group);
    }

    fn remove_group(&mut self, layer_id: &str) {
        self.groups.remove(layer_id);
    }

    fn add_primitive(&mut self, layer_id: &str, element_id: &str, primitive: &Primitive) {
        if let Some(group) = self.groups.get_mut(layer_id) {
            group
                .members
                .insert(element_id.to_string(), primitive.clone());
        }
    }

    fn remove_primitive(&mut self, layer_id: &str, element_id: &str) {
        if let Some(group) = self.groups.get_mut(layer_id) {
            group.members.remove(element_id);
        }
    }

    fn fit_bounds(&mut self, bounds: Rect, options: &FitOptions) {
        self.fitted = Some((bounds, options.clone()));
    }
}
