//! Recherche de champs dans des enregistrements sans schéma
//!
//! Chaque rôle sémantique (géométrie, nom, condition, coordonnées) dispose
//! d'une liste ordonnée de noms candidats ; le premier candidat présent gagne.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::RawRecord;

const GEOMETRY_FIELDS: &[&str] = &[
    "caminos",
    "anillos",
    "geom",
    "geometry",
    "geojson",
    "the_geom",
    "poligono",
];
const POLYGON_HINT_FIELDS: &[&str] = &["anillos"];
const NAME_FIELDS: &[&str] = &["nombre", "name", "label"];
const STATUS_FIELDS: &[&str] = &["condicion"];
const SOURCE_ID_FIELDS: &[&str] = &["id"];
const LATITUDE_FIELDS: &[&str] = &["latitud"];
const LONGITUDE_FIELDS: &[&str] = &["longitud"];

/// Table des noms de champs reconnus, par rôle, en ordre de priorité
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldCatalog {
    /// Champs porteurs de géométrie
    pub geometry: Vec<String>,

    /// Champs dont la présence force l'interprétation polygonale
    pub polygon_hint: Vec<String>,

    /// Nom affiché de l'élément
    pub name: Vec<String>,

    /// Texte libre de condition (état sanitaire)
    pub status: Vec<String>,

    /// Identifiant source affiché tel quel dans le panneau d'info
    pub source_id: Vec<String>,

    pub latitude: Vec<String>,
    pub longitude: Vec<String>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self {
            geometry: owned(GEOMETRY_FIELDS),
            polygon_hint: owned(POLYGON_HINT_FIELDS),
            name: owned(NAME_FIELDS),
            status: owned(STATUS_FIELDS),
            source_id: owned(SOURCE_ID_FIELDS),
            latitude: owned(LATITUDE_FIELDS),
            longitude: owned(LONGITUDE_FIELDS),
        }
    }
}

impl FieldCatalog {
    /// Premier champ géométrique présent
    pub fn geometry<'a>(&self, record: &'a RawRecord) -> Option<(&'a str, &'a Value)> {
        first_truthy(record, &self.geometry)
    }

    /// Vrai si un champ d'anneaux est présent
    pub fn has_polygon_hint(&self, record: &RawRecord) -> bool {
        first_truthy(record, &self.polygon_hint).is_some()
    }

    pub fn name(&self, record: &RawRecord) -> Option<String> {
        first_text(record, &self.name)
    }

    pub fn status(&self, record: &RawRecord) -> Option<String> {
        first_text(record, &self.status)
    }

    /// Identifiant source, rendu tel quel
    pub fn source_id(&self, record: &RawRecord) -> Option<String> {
        self.source_id
            .iter()
            .filter_map(|name| record.get(name))
            .find(|value| !value.is_null())
            .map(display_value)
    }

    /// Couple (latitude, longitude) explicite ; les deux sont requis
    pub fn lat_lon(&self, record: &RawRecord) -> Option<(f64, f64)> {
        let lat = first_number(record, &self.latitude)?;
        let lon = first_number(record, &self.longitude)?;
        Some((lat, lon))
    }
}

/// Valeur considérée comme présente : ni null, ni `false`, ni 0, ni chaîne vide
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Premier candidat présent, avec son nom
pub fn first_truthy<'a>(record: &'a RawRecord, names: &[String]) -> Option<(&'a str, &'a Value)> {
    names.iter().find_map(|name| {
        record
            .get_key_value(name.as_str())
            .filter(|(_, value)| is_truthy(value))
            .map(|(key, value)| (key.as_str(), value))
    })
}

fn first_text(record: &RawRecord, names: &[String]) -> Option<String> {
    first_truthy(record, names).and_then(|(_, value)| scalar_text(value))
}

fn first_number(record: &RawRecord, names: &[String]) -> Option<f64> {
    names
        .iter()
        .filter_map(|name| record.get(name))
        .find_map(scalar_f64)
}

/// Texte d'une valeur scalaire non vide
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Nombre depuis une valeur numérique ou une chaîne numérique
pub fn scalar_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => fast_float::parse(s.trim()).ok(),
        _ => None,
    };
    number.filter(|f| f.is_finite())
}

/// Rendu textuel brut d'une valeur (chaînes sans guillemets)
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_first_truthy_respects_priority() {
        let catalog = FieldCatalog::default();
        let r = record(json!({"geometry": "1 2", "caminos": "3 4"}));
        let (name, _) = catalog.geometry(&r).unwrap();
        assert_eq!(name, "caminos");
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let catalog = FieldCatalog::default();
        let r = record(json!({"caminos": "", "anillos": null, "geom": "1 2"}));
        let (name, _) = catalog.geometry(&r).unwrap();
        assert_eq!(name, "geom");
        assert!(!catalog.has_polygon_hint(&r));
    }

    #[test]
    fn test_name_fallback_chain() {
        let catalog = FieldCatalog::default();
        assert_eq!(
            catalog.name(&record(json!({"name": "Ceibo", "label": "x"}))),
            Some("Ceibo".to_string())
        );
        assert_eq!(catalog.name(&record(json!({"nombre": ""}))), None);
    }

    #[test]
    fn test_lat_lon_requires_both() {
        let catalog = FieldCatalog::default();
        assert_eq!(
            catalog.lat_lon(&record(json!({"latitud": -34.6, "longitud": "-58.4"}))),
            Some((-34.6, -58.4))
        );
        assert_eq!(catalog.lat_lon(&record(json!({"latitud": -34.6}))), None);
        assert_eq!(
            catalog.lat_lon(&record(json!({"latitud": 0, "longitud": 0}))),
            Some((0.0, 0.0))
        );
    }

    #[test]
    fn test_source_id_verbatim() {
        let catalog = FieldCatalog::default();
        assert_eq!(
            catalog.source_id(&record(json!({"id": 42}))),
            Some("42".to_string())
        );
        assert_eq!(
            catalog.source_id(&record(json!({"id": "A-7"}))),
            Some("A-7".to_string())
        );
        assert_eq!(catalog.source_id(&record(json!({}))), None);
    }
}
