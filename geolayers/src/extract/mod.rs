//! Extraction de géométrie depuis un enregistrement brut
//!
//! Ordre de résolution :
//! 1. premier champ géométrique présent (voir [`FieldCatalog`]) ;
//! 2. extraction de tous les nombres du champ, appariés en coordonnées ;
//! 3. si rien d'exploitable et que le champ est un objet GeoJSON typé, usage direct ;
//! 4. sinon repli sur les champs latitude/longitude explicites.

pub mod axis;
pub mod tokens;

use geo::{Coord, LineString, Point, Polygon};
use serde_json::Value;
use tracing::{debug, trace};

pub use axis::AxisStrategy;

use crate::fields::FieldCatalog;
use crate::types::{Geometry, LayerKind, RawRecord};

/// Extracteur de géométrie canonique (lon, lat)
#[derive(Debug, Clone, Default)]
pub struct GeometryExtractor {
    catalog: FieldCatalog,
    axis: AxisStrategy,
}

impl GeometryExtractor {
    pub fn new(catalog: FieldCatalog, axis: AxisStrategy) -> Self {
        Self { catalog, axis }
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Retourne `None` si l'enregistrement n'a aucune géométrie exploitable
    pub fn extract(&self, record: &RawRecord, kind: &LayerKind) -> Option<Geometry> {
        if let Some((field, raw)) = self.catalog.geometry(record) {
            let polygon_hint = kind.is_polygon_like() || self.catalog.has_polygon_hint(record);
            match self.from_field(raw, kind, polygon_hint) {
                Some(geometry) => return Some(geometry),
                None => debug!(field, "Geometry field yielded no usable coordinates"),
            }
        }

        self.from_lat_lon(record)
    }

    fn from_field(&self, raw: &Value, kind: &LayerKind, polygon_hint: bool) -> Option<Geometry> {
        let text = flatten(raw);
        let numbers = tokens::numeric_tokens(&text);
        let coords = tokens::pair_tokens(&numbers, self.axis);
        trace!(tokens = numbers.len(), pairs = coords.len(), "Numeric extraction");

        if let Some(geometry) = shape_from_coords(coords, kind, polygon_hint) {
            return Some(geometry);
        }

        // Objet GeoJSON formel sans coordonnées numériques lisibles
        if raw.get("type").is_some() {
            return from_geojson(raw);
        }

        None
    }

    /// Point depuis latitude/longitude explicites, sans heuristique d'axes
    fn from_lat_lon(&self, record: &RawRecord) -> Option<Geometry> {
        let (lat, lon) = self.catalog.lat_lon(record)?;
        Some(Geometry::Point(Point::new(lon, lat)))
    }
}

/// Texte du champ : les données structurées sont sérialisées
fn flatten(raw: &Value) -> String {
    match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Choix du type de géométrie selon le nombre de couples et les indices de type
fn shape_from_coords(coords: Vec<Coord>, kind: &LayerKind, polygon_hint: bool) -> Option<Geometry> {
    match coords.len() {
        0 => None,
        n if polygon_hint && n >= 3 => Some(Geometry::Polygon(Polygon::new(
            LineString::new(coords),
            vec![],
        ))),
        1 if !polygon_hint && !kind.is_line_like() => Some(Geometry::Point(Point(coords[0]))),
        _ => Some(Geometry::LineString(LineString::new(coords))),
    }
}

fn from_geojson(raw: &Value) -> Option<Geometry> {
    let parsed = geojson::Geometry::from_json_value(raw.clone()).ok()?;
    let geometry: geo::Geometry<f64> = parsed.try_into().ok()?;
    match geometry {
        geo::Geometry::Point(p) => Some(Geometry::Point(p)),
        geo::Geometry::LineString(ls) if !ls.0.is_empty() => Some(Geometry::LineString(ls)),
        geo::Geometry::Polygon(poly) if !poly.exterior().0.is_empty() => {
            Some(Geometry::Polygon(poly))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn extractor() -> GeometryExtractor {
        GeometryExtractor::default()
    }

    #[test]
    fn test_lat_lon_fallback_point() {
        let r = record(json!({"condicion": "riesgo alto", "latitud": -34.6, "longitud": -58.4}));
        let geometry = extractor().extract(&r, &LayerKind::new("trees")).unwrap();
        assert_eq!(geometry, Geometry::Point(Point::new(-58.4, -34.6)));
    }

    #[test]
    fn test_polygon_with_hint() {
        let r = record(json!({"poligono": "-60.1 -36.2 -60.3 -36.4 -60.5 -36.1"}));
        let geometry = extractor().extract(&r, &LayerKind::new("polygons")).unwrap();
        let Geometry::Polygon(_) = &geometry else {
            panic!("Expected polygon, got {:?}", geometry);
        };
        let vertices = geometry.vertices();
        assert_eq!(vertices.len(), 3);
        assert_eq!((vertices[0].x, vertices[0].y), (-60.1, -36.2));
        assert_eq!((vertices[1].x, vertices[1].y), (-60.3, -36.4));
        assert_eq!((vertices[2].x, vertices[2].y), (-60.5, -36.1));
    }

    #[test]
    fn test_accented_polygon_kind() {
        let r = record(json!({"poligono": "-60.1 -36.2 -60.3 -36.4 -60.5 -36.1"}));
        let kind = LayerKind::new("Polígonos");
        assert_eq!(kind.table(), "poligonos");
        let geometry = extractor().extract(&r, &kind).unwrap();
        assert!(matches!(geometry, Geometry::Polygon(_)));
        assert_eq!(geometry.vertices().len(), 3);
    }

    #[test]
    fn test_rings_field_is_polygon_hint() {
        let r = record(json!({"anillos": [[[-34.1, -58.1], [-34.2, -58.2], [-34.3, -58.1]]]}));
        let geometry = extractor().extract(&r, &LayerKind::new("otros")).unwrap();
        assert!(matches!(geometry, Geometry::Polygon(_)));
        // couples (lat, lon) inversés par l'heuristique
        assert_eq!(geometry.vertices()[0], Coord { x: -58.1, y: -34.1 });
    }

    #[test]
    fn test_polygon_hint_with_two_pairs_is_line() {
        let r = record(json!({"geom": "-60.1 -36.2 -60.3 -36.4"}));
        let geometry = extractor().extract(&r, &LayerKind::new("poligonos")).unwrap();
        assert!(matches!(geometry, Geometry::LineString(_)));
    }

    #[test]
    fn test_single_pair_is_point() {
        let r = record(json!({"geom": "POINT(-58.38 -34.60)"}));
        let geometry = extractor().extract(&r, &LayerKind::new("trees")).unwrap();
        assert_eq!(geometry, Geometry::Point(Point::new(-58.38, -34.60)));
    }

    #[test]
    fn test_single_pair_on_line_layer_stays_line() {
        let r = record(json!({"caminos": "-58.38 -34.60"}));
        let geometry = extractor().extract(&r, &LayerKind::new("segments")).unwrap();
        assert!(matches!(geometry, Geometry::LineString(ref ls) if ls.0.len() == 1));
    }

    #[test]
    fn test_paths_structure_is_line() {
        let r = record(json!({"caminos": {"paths": [[[-58.4, -34.6], [-58.5, -34.7]]]}}));
        let geometry = extractor().extract(&r, &LayerKind::new("segmentos")).unwrap();
        let Geometry::LineString(ls) = geometry else {
            panic!("Expected linestring");
        };
        assert_eq!(ls.0.len(), 2);
    }

    #[test]
    fn test_unparseable_geometry_falls_back_to_lat_lon() {
        let r = record(json!({"geom": "sin datos", "latitud": "-34.6", "longitud": "-58.4"}));
        let geometry = extractor().extract(&r, &LayerKind::new("trees")).unwrap();
        assert_eq!(geometry, Geometry::Point(Point::new(-58.4, -34.6)));
    }

    #[test]
    fn test_no_geometry() {
        let r = record(json!({"nombre": "Sin ubicación"}));
        assert!(extractor().extract(&r, &LayerKind::new("trees")).is_none());

        let r = record(json!({"geom": "sin datos"}));
        assert!(extractor().extract(&r, &LayerKind::new("trees")).is_none());
    }

    #[test]
    fn test_typed_object_without_numbers() {
        let r = record(json!({"geometry": {"type": "LineString", "coordinates": []}}));
        assert!(extractor().extract(&r, &LayerKind::new("segments")).is_none());
    }

    #[test]
    fn test_fixed_axis_strategy() {
        let extractor = GeometryExtractor::new(FieldCatalog::default(), AxisStrategy::LonLat);
        let r = record(json!({"geom": "-34.6 -58.4"}));
        let geometry = extractor.extract(&r, &LayerKind::new("trees")).unwrap();
        assert_eq!(geometry, Geometry::Point(Point::new(-34.6, -58.4)));
    }
}
