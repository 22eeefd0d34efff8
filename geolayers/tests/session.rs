//! Tests d'intégration du cycle de vie d'une session

use std::collections::{BTreeMap, HashSet};

use futures::executor::block_on;
use geo::Rect;
use geolayers::{
    ClusterAggregator, DataSource, ElementBuilder, FitOptions, GroupKind, LayerError,
    LayerRegistry, LoadOutcome, MapSurface, Primitive, Project, RawRecord, Session, StatusClass,
};
use serde_json::{json, Value};

#[derive(Default)]
struct MemorySource {
    tables: BTreeMap<String, Vec<RawRecord>>,
    failing: HashSet<String>,
}

impl MemorySource {
    fn with(mut self, table: &str, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect::<Vec<_>>();
        self.tables.entry(table.to_string()).or_default().extend(rows);
        self
    }

    fn failing(mut self, table: &str) -> Self {
        self.failing.insert(table.to_string());
        self
    }
}

impl DataSource for MemorySource {
    async fn query(
        &self,
        table: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<RawRecord>, LayerError> {
        if self.failing.contains(table) {
            return Err(LayerError::data_access(table, "relation does not exist"));
        }
        let rows = self.tables.get(table).cloned().unwrap_or_default();
        Ok(rows
            .into_iter()
            .filter(|row| match filter {
                None => true,
                Some((field, value)) => row.get(field).map_or(false, |v| match v {
                    Value::String(s) => s == value,
                    other => other.to_string() == value,
                }),
            })
            .collect())
    }
}

#[derive(Debug, Default)]
struct Surface {
    clustering: bool,
    groups: BTreeMap<String, BTreeMap<String, Primitive>>,
    clustered: HashSet<String>,
    fitted: Vec<Rect>,
}

impl MapSurface for Surface {
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
    }

    fn add_primitive(&mut self, layer_id: &str, element_id: &str, primitive: &Primitive) {
        self.groups
            .get_mut(layer_id)
            .unwrap()
            .insert(element_id.to_string(), primitive.clone());
    }

    fn remove_primitive(&mut self, layer_id: &str, element_id: &str) {
        self.groups.get_mut(layer_id).unwrap().remove(element_id);
    }

    fn fit_bounds(&mut self, bounds: Rect, _options: &FitOptions) {
        self.fitted.push(bounds);
    }
}

fn source() -> MemorySource {
    MemorySource::default()
        .with(
            "capas",
            vec![
                json!({"id": 1, "nombre": "Arbolado", "tipo": "Trees", "id_proyecto": 100}),
                json!({"id": 2, "nombre": "Veredas", "tipo": "segmentos", "id_proyecto": 100}),
                json!({"id": 3, "nombre": "Plazas", "tipo": "poligonos", "id_proyecto": 100}),
                json!({"id": 4, "nombre": "Arbolado sur", "tipo": "arboles", "id_proyecto": 200}),
            ],
        )
        .with(
            "arboles",
            vec![
                json!({"id": 10, "id_capa": 1, "condicion": "Bueno", "latitud": -34.60, "longitud": -58.40}),
                json!({"id": 11, "id_capa": 1, "condicion": "riesgo alto", "latitud": -34.61, "longitud": -58.41}),
                json!({"id": 12, "id_capa": 1, "condicion": "poda"}),
                json!({"id": 40, "id_capa": 4, "latitud": -36.0, "longitud": -60.0}),
            ],
        )
        .with(
            "segmentos",
            vec![json!({"id": 20, "id_capa": 2, "caminos": "LINESTRING(-58.45 -34.65, -58.46 -34.66)"})],
        )
}

fn session(clustering: bool) -> Session<Surface> {
    let registry = LayerRegistry::new(ElementBuilder::default(), ClusterAggregator::default());
    let surface = Surface {
        clustering,
        ..Default::default()
    };
    Session::new(surface, registry, FitOptions::default())
}

fn project(id: &str) -> Option<Project> {
    Some(Project::new(id, format!("Proyecto {}", id)))
}

#[test]
fn test_open_project_loads_every_layer() {
    let source = source();
    let mut session = session(true);

    let load = block_on(session.open_project(&source, project("100"))).unwrap();

    let ids: Vec<&str> = load.outcomes.iter().map(|(l, _)| l.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    match &load.outcomes[0].1 {
        LoadOutcome::Loaded(stats) => {
            assert_eq!(stats.added, 2);
            assert_eq!(stats.skipped, 1);
            assert!(stats.clustered);
        }
        other => panic!("Unexpected outcome: {:?}", other),
    }
    match &load.outcomes[2].1 {
        LoadOutcome::Loaded(stats) => assert_eq!(stats.added, 0),
        other => panic!("Unexpected outcome: {:?}", other),
    }

    let surface = session.surface();
    assert_eq!(surface.groups.len(), 2);
    assert!(surface.clustered.contains("1"));
    assert!(!surface.clustered.contains("2"));

    // chargée vide : enregistrée, mais sans groupe sur la carte
    assert!(session.registry().is_loaded("3"));
    assert!(session.registry().group("3").is_none());

    // un seul ajustement, après tous les chargements
    assert_eq!(surface.fitted.len(), 1);
    let bounds = load.bounds.unwrap();
    assert_eq!(bounds.min().x, -58.46);
    assert_eq!(bounds.max().y, -34.60);

    let icon = session.registry().cluster_icon("1").unwrap();
    assert_eq!(icon.status, StatusClass::AtRisk);
}

#[test]
fn test_failed_layer_does_not_affect_siblings() {
    let source = source().failing("segmentos");
    let mut session = session(false);

    let load = block_on(session.open_project(&source, project("100"))).unwrap();

    assert!(matches!(load.outcomes[1].1, LoadOutcome::Failed(LayerError::DataAccess { .. })));
    assert!(matches!(load.outcomes[0].1, LoadOutcome::Loaded(_)));
    assert!(!session.registry().is_loaded("2"));
    assert!(session.surface().groups.contains_key("1"));
}

#[test]
fn test_failed_layer_list_is_reported() {
    let source = source().failing("capas");
    let mut session = session(false);

    let result = block_on(session.open_project(&source, project("100")));
    assert!(result.is_err());
    assert!(session.surface().groups.is_empty());
}

#[test]
fn test_switching_project_clears_everything() {
    let source = source();
    let mut session = session(false);
    block_on(session.open_project(&source, project("100"))).unwrap();
    assert!(session.set_element_visible("1", "1-0", false));
    assert!(!session.visibility().state().is_empty());

    block_on(session.open_project(&source, project("200"))).unwrap();

    let groups: Vec<&String> = session.surface().groups.keys().collect();
    assert_eq!(groups, vec!["4"]);
    assert!(session.visibility().state().is_empty());
    assert!(!session.registry().is_loaded("1"));

    session.select_project(None);
    assert!(session.surface().groups.is_empty());
    assert!(session.layers().is_empty());
}

#[test]
fn test_stale_completion_is_dropped() {
    let source = source();
    let mut session = session(false);

    let generation = session.select_project(project("100"));
    let layers = block_on(source.layers("100")).unwrap();
    assert!(session.set_layers(generation, layers));
    let ticket = session.begin_load("1").unwrap();
    let records = block_on(source.layer_records(ticket.layer()));

    // l'utilisateur change de projet avant l'arrivée de la réponse
    let next = session.select_project(project("200"));
    assert!(next > generation);

    assert_eq!(session.complete_load(ticket, records), LoadOutcome::Stale);
    assert!(session.surface().groups.is_empty());
    assert!(!session.registry().is_loaded("1"));

    let stale_layers = block_on(source.layers("100")).unwrap();
    assert!(!session.set_layers(generation, stale_layers));
}

#[test]
fn test_layer_disabled_during_load() {
    let source = source();
    let mut session = session(false);
    block_on(session.open_project(&source, project("100"))).unwrap();

    let ticket = session.begin_load("2").unwrap();
    let records = block_on(source.layer_records(ticket.layer()));
    block_on(session.set_layer_visible(&source, "2", false)).unwrap();

    assert_eq!(session.complete_load(ticket, records), LoadOutcome::Disabled);
    assert!(!session.surface().groups.contains_key("2"));
}

#[test]
fn test_layer_toggle_rebuilds_with_default_visibility() {
    let source = source();
    let mut session = session(false);
    block_on(session.open_project(&source, project("100"))).unwrap();
    session.set_element_visible("1", "1-1", false);
    assert!(!session.surface().groups["1"].contains_key("1-1"));

    let hidden = block_on(session.set_layer_visible(&source, "1", false)).unwrap();
    assert!(hidden.is_none());
    assert!(!session.surface().groups.contains_key("1"));
    assert!(!session.registry().is_loaded("1"));

    let reloaded = block_on(session.set_layer_visible(&source, "1", true)).unwrap();
    assert!(matches!(reloaded, Some(LoadOutcome::Loaded(_))));
    assert!(session.surface().groups["1"].contains_key("1-1"));
    assert!(session.visibility().state().is_visible("1", "1-1"));
}

#[test]
fn test_element_toggle_before_load_is_ignored() {
    let mut session = session(false);
    session.select_project(project("100"));
    assert!(!session.set_element_visible("1", "1-0", false));
    assert!(session.visibility().state().is_empty());
}

#[test]
fn test_unknown_layer_reload() {
    let source = source();
    let mut session = session(false);
    block_on(session.open_project(&source, project("100"))).unwrap();

    let result = block_on(session.set_layer_visible(&source, "99", true));
    assert_eq!(result, Err(LayerError::UnknownLayer("99".to_string())));
}
