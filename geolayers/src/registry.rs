//! Registre des couches chargées et de leurs groupes visuels
//!
//! Le registre possède les éléments construits ; la surface ne reçoit que des
//! références vers leurs primitives. Une couche peut être :
//! - absente (jamais chargée ou déchargée) ;
//! - chargée vide (enregistrée, sans groupe posé sur la carte) ;
//! - chargée (enregistrée, avec un groupe visuel sur la carte).

use std::collections::{BTreeMap, BTreeSet, HashMap};

use geo::{Coord, Rect};
use tracing::{debug, info, warn};

use crate::cluster::{ClusterAggregator, ClusterIcon, GroupKind};
use crate::element::{BuildOutcome, Element, ElementBuilder, Primitive};
use crate::surface::MapSurface;
use crate::types::{Layer, RawRecord};

/// Groupe visuel vivant d'une couche : ids des éléments actuellement affichés
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualGroup {
    kind: GroupKind,
    members: BTreeSet<String>,
}

impl VisualGroup {
    pub fn kind(&self) -> &GroupKind {
        &self.kind
    }

    pub fn contains(&self, element_id: &str) -> bool {
        self.members.contains(element_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }
}

#[derive(Debug)]
struct LayerEntry {
    layer: Layer,
    elements: Vec<Element>,
    by_id: HashMap<String, usize>,
    group: Option<VisualGroup>,
}

impl LayerEntry {
    fn element(&self, element_id: &str) -> Option<&Element> {
        self.by_id.get(element_id).map(|&i| &self.elements[i])
    }
}

/// Bilan d'un chargement de couche
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Éléments effectivement ajoutés au groupe
    pub added: usize,
    /// Enregistrements sans élément (pas de géométrie, géométrie dégénérée)
    pub skipped: usize,
    pub clustered: bool,
}

/// Projet actif → couche → éléments, et couche → groupe visuel
#[derive(Debug)]
pub struct LayerRegistry {
    builder: ElementBuilder,
    aggregator: ClusterAggregator,
    project: Option<String>,
    layers: BTreeMap<String, LayerEntry>,
}

impl LayerRegistry {
    pub fn new(builder: ElementBuilder, aggregator: ClusterAggregator) -> Self {
        Self {
            builder,
            aggregator,
            project: None,
            layers: BTreeMap::new(),
        }
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn aggregator(&self) -> &ClusterAggregator {
        &self.aggregator
    }

    /// Vide tout puis change de projet
    pub fn reset<M: MapSurface + ?Sized>(&mut self, surface: &mut M, project: Option<String>) {
        self.unload_all(surface);
        self.project = project;
    }

    /// Reconstruit la couche à partir de ses enregistrements
    ///
    /// Retourne le nombre d'éléments ajoutés ; un groupe vide n'est pas posé
    /// sur la surface mais la couche reste enregistrée (chargée vide).
    pub fn load_layer<M: MapSurface + ?Sized>(
        &mut self,
        surface: &mut M,
        layer: &Layer,
        records: Vec<RawRecord>,
    ) -> LoadStats {
        self.unload_layer(surface, &layer.id);

        let total = records.len();
        let mut elements = Vec::with_capacity(total);
        for (index, record) in records.into_iter().enumerate() {
            match self.builder.build(layer, index, record) {
                BuildOutcome::Built(element) => elements.push(*element),
                BuildOutcome::Skipped(reason) => {
                    warn!(
                        layer_id = %layer.id,
                        element_id = %ElementBuilder::element_id(&layer.id, index),
                        reason = %reason,
                        "Record skipped"
                    );
                }
            }
        }

        let stats = LoadStats {
            added: elements.len(),
            skipped: total - elements.len(),
            clustered: false,
        };

        let by_id = elements
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();

        let mut entry = LayerEntry {
            layer: layer.clone(),
            elements,
            by_id,
            group: None,
        };

        let stats = if stats.added > 0 {
            let kind = GroupKind::select(
                &layer.kind,
                surface.supports_clustering(),
                &self.aggregator,
            );
            let members: Vec<(&str, &Primitive)> = entry
                .elements
                .iter()
                .map(|e| (e.id.as_str(), &e.primitive))
                .collect();
            surface.add_group(&layer.id, &kind, &members);

            let clustered = kind.is_clustered();
            entry.group = Some(VisualGroup {
                kind,
                members: entry.elements.iter().map(|e| e.id.clone()).collect(),
            });
            LoadStats { clustered, ..stats }
        } else {
            stats
        };

        info!(
            layer_id = %layer.id,
            table = %layer.kind.table(),
            added = stats.added,
            skipped = stats.skipped,
            clustered = stats.clustered,
            "Layer loaded"
        );

        self.layers.insert(layer.id.clone(), entry);
        stats
    }

    /// Retire le groupe de la surface et oublie les éléments de la couche
    pub fn unload_layer<M: MapSurface + ?Sized>(&mut self, surface: &mut M, layer_id: &str) -> bool {
        let Some(entry) = self.layers.remove(layer_id) else {
            return false;
        };
        if entry.group.is_some() {
            surface.remove_group(layer_id);
        }
        debug!(layer_id, elements = entry.elements.len(), "Layer unloaded");
        true
    }

    /// Idempotent : un second appel ne fait rien
    pub fn unload_all<M: MapSurface + ?Sized>(&mut self, surface: &mut M) {
        let ids: Vec<String> = self.layers.keys().cloned().collect();
        for id in ids {
            self.unload_layer(surface, &id);
        }
    }

    pub fn is_loaded(&self, layer_id: &str) -> bool {
        self.layers.contains_key(layer_id)
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn layer(&self, layer_id: &str) -> Option<&Layer> {
        self.layers.get(layer_id).map(|e| &e.layer)
    }

    /// Éléments d'une couche, dans l'ordre de la source
    pub fn get_elements(&self, layer_id: &str) -> Option<&[Element]> {
        self.layers.get(layer_id).map(|e| e.elements.as_slice())
    }

    pub fn element(&self, layer_id: &str, element_id: &str) -> Option<&Element> {
        self.layers.get(layer_id)?.element(element_id)
    }

    pub fn group(&self, layer_id: &str) -> Option<&VisualGroup> {
        self.layers.get(layer_id)?.group.as_ref()
    }

    /// Ajoute ou retire la primitive d'un élément de son groupe
    ///
    /// `None` si l'élément ou son groupe n'est pas enregistré, sinon
    /// `Some(changed)` ; les opérations sont idempotentes.
    pub fn set_member<M: MapSurface + ?Sized>(
        &mut self,
        surface: &mut M,
        layer_id: &str,
        element_id: &str,
        visible: bool,
    ) -> Option<bool> {
        let entry = self.layers.get_mut(layer_id)?;
        let index = *entry.by_id.get(element_id)?;
        let group = entry.group.as_mut()?;

        let changed = if visible {
            group.members.insert(element_id.to_string())
        } else {
            group.members.remove(element_id)
        };

        if changed {
            if visible {
                surface.add_primitive(layer_id, element_id, &entry.elements[index].primitive);
            } else {
                surface.remove_primitive(layer_id, element_id);
            }
        }
        Some(changed)
    }

    /// Nombre d'éléments du groupe agrégé (toutes couches posées sur la carte)
    pub fn aggregate_len(&self) -> usize {
        self.layers
            .values()
            .filter(|e| e.group.is_some())
            .map(|e| e.elements.len())
            .sum()
    }

    /// Emprise du groupe agrégé ; `None` s'il est vide ou non fini
    pub fn aggregate_bounds(&self) -> Option<Rect> {
        self.layers
            .values()
            .filter(|e| e.group.is_some())
            .flat_map(|e| e.elements.iter())
            .filter_map(|e| e.primitive.bounding_rect())
            .reduce(union)
            .filter(is_finite)
    }

    /// Icône d'un cluster couvrant tous les marqueurs visibles d'une couche clusterisée
    pub fn cluster_icon(&self, layer_id: &str) -> Option<ClusterIcon> {
        let entry = self.layers.get(layer_id)?;
        let group = entry.group.as_ref()?;
        let aggregator = group.kind.aggregator()?;
        let members: Vec<&Primitive> = group
            .members()
            .filter_map(|id| entry.element(id))
            .map(|e| &e.primitive)
            .collect();
        Some(aggregator.icon(&members))
    }
}

fn union(a: Rect, b: Rect) -> Rect {
    Rect::new(
        Coord {
            x: a.min().x.min(b.min().x),
            y: a.min().y.min(b.min().y),
        },
        Coord {
            x: a.max().x.max(b.max().x),
            y: a.max().y.max(b.max().y),
        },
    )
}

fn is_finite(rect: &Rect) -> bool {
    [rect.min(), rect.max()]
        .iter()
        .all(|c| c.x.is_finite() && c.y.is_finite())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::surface::FitOptions;
    use serde_json::{json, Value};

    /// Surface qui enregistre l'état posé sur la carte
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub clustering: bool,
        pub groups: BTreeMap<String, BTreeMap<String, Primitive>>,
        pub clustered: BTreeSet<String>,
        pub fitted: Vec<Rect>,
    }

    impl MapSurface for RecordingSurface {
        fn supports_clustering(&self) -> bool {
            self.clustering
        }

        fn add_group(&mut self, layer_id: &str, kind: &GroupKind, members: &[(&str, &Primitive)]) {
            if kind.is_clustered() {
                self.clustered.insert(layer_id.to_string());
            }
            self.groups.insert(
                layer_id.to_string(),
                members
                    .iter()
                    .map(|(id, p)| (id.to_string(), (*p).clone()))
                    .collect(),
            );
        }

        fn remove_group(&mut self, layer_id: &str) {
            self.groups.remove(layer_id);
            self.clustered.remove(layer_id);
        }

        fn add_primitive(&mut self, layer_id: &str, element_id: &str, primitive: &Primitive) {
            if let Some(group) = self.groups.get_mut(layer_id) {
                group.insert(element_id.to_string(), primitive.clone());
            }
        }

        fn remove_primitive(&mut self, layer_id: &str, element_id: &str) {
            if let Some(group) = self.groups.get_mut(layer_id) {
                group.remove(element_id);
            }
        }

        fn fit_bounds(&mut self, bounds: Rect, _options: &FitOptions) {
            self.fitted.push(bounds);
        }
    }

    pub(crate) fn records(values: Vec<Value>) -> Vec<RawRecord> {
        values
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect()
    }

    fn registry() -> LayerRegistry {
        LayerRegistry::new(ElementBuilder::default(), ClusterAggregator::default())
    }

    fn trees() -> Vec<RawRecord> {
        records(vec![
            json!({"id": 1, "condicion": "bueno", "latitud": -34.6, "longitud": -58.4}),
            json!({"id": 2, "condicion": "riesgo", "latitud": -34.7, "longitud": -58.5}),
            json!({"id": 3, "nombre": "sin ubicación"}),
        ])
    }

    #[test]
    fn test_load_layer_counts_and_group() {
        let mut surface = RecordingSurface::default();
        let mut registry = registry();
        let layer = Layer::new("10", "Arbolado", "trees");

        let stats = registry.load_layer(&mut surface, &layer, trees());

        assert_eq!(stats.added, 2);
        assert_eq!(stats.skipped, 1);
        assert!(!stats.clustered);
        assert_eq!(registry.get_elements("10").unwrap().len(), 2);
        assert_eq!(registry.group("10").unwrap().len(), 2);
        assert_eq!(surface.groups["10"].len(), 2);
        assert!(surface.groups["10"].contains_key("10-0"));
        assert!(surface.groups["10"].contains_key("10-1"));
    }

    #[test]
    fn test_clustered_when_capability_present() {
        let mut surface = RecordingSurface {
            clustering: true,
            ..Default::default()
        };
        let mut registry = registry();
        let layer = Layer::new("10", "Arbolado", "trees");

        let stats = registry.load_layer(&mut surface, &layer, trees());
        assert!(stats.clustered);
        assert!(surface.clustered.contains("10"));

        let icon = registry.cluster_icon("10").unwrap();
        assert_eq!(icon.count, 2);
        assert_eq!(icon.class_name, "marker-cluster cluster-riesgo");
    }

    #[test]
    fn test_empty_load_is_registered_without_group() {
        let mut surface = RecordingSurface::default();
        let mut registry = registry();
        let layer = Layer::new("11", "Vacía", "segments");

        let stats = registry.load_layer(&mut surface, &layer, Vec::new());

        assert_eq!(stats.added, 0);
        assert!(registry.is_loaded("11"));
        assert!(registry.get_elements("11").unwrap().is_empty());
        assert!(registry.group("11").is_none());
        assert!(surface.groups.is_empty());
        assert!(!registry.is_loaded("12"));
    }

    #[test]
    fn test_reload_replaces_previous_group() {
        let mut surface = RecordingSurface::default();
        let mut registry = registry();
        let layer = Layer::new("10", "Arbolado", "trees");

        registry.load_layer(&mut surface, &layer, trees());
        let stats = registry.load_layer(&mut surface, &layer, trees()[..1].to_vec());

        assert_eq!(stats.added, 1);
        assert_eq!(surface.groups["10"].len(), 1);
        assert_eq!(registry.aggregate_len(), 1);
    }

    #[test]
    fn test_unload_all_is_idempotent() {
        let mut surface = RecordingSurface::default();
        let mut registry = registry();
        registry.load_layer(&mut surface, &Layer::new("10", "A", "trees"), trees());
        registry.load_layer(&mut surface, &Layer::new("20", "B", "trees"), trees());

        registry.unload_all(&mut surface);
        registry.unload_all(&mut surface);

        assert!(surface.groups.is_empty());
        assert_eq!(registry.layer_ids().count(), 0);
        assert!(registry.aggregate_bounds().is_none());
    }

    #[test]
    fn test_set_member_is_idempotent() {
        let mut surface = RecordingSurface::default();
        let mut registry = registry();
        registry.load_layer(&mut surface, &Layer::new("10", "A", "trees"), trees());

        assert_eq!(registry.set_member(&mut surface, "10", "10-0", true), Some(false));
        assert_eq!(registry.set_member(&mut surface, "10", "10-0", false), Some(true));
        assert_eq!(registry.set_member(&mut surface, "10", "10-0", false), Some(false));
        assert!(!surface.groups["10"].contains_key("10-0"));
        assert_eq!(registry.set_member(&mut surface, "10", "10-9", false), None);
        assert_eq!(registry.set_member(&mut surface, "99", "99-0", false), None);
    }

    #[test]
    fn test_aggregate_bounds() {
        let mut surface = RecordingSurface::default();
        let mut registry = registry();
        registry.load_layer(&mut surface, &Layer::new("10", "A", "trees"), trees());

        let bounds = registry.aggregate_bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: -58.5, y: -34.7 });
        assert_eq!(bounds.max(), Coord { x: -58.4, y: -34.6 });
    }
}
