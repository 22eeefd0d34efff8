//! Types de données pour le crate geolayers

use geo::{Area, BoundingRect, Coord, EuclideanLength, LineString, Point, Polygon, Rect};
use serde::Serialize;

use crate::fields;

/// Enregistrement brut renvoyé par la source, sans schéma fixe
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Table des arbres (couches ponctuelles, clusterisables)
pub const TREE_TABLE: &str = "arboles";
/// Table des segments (couches linéaires)
pub const SEGMENT_TABLE: &str = "segmentos";
/// Table des polygones
pub const POLYGON_TABLE: &str = "poligonos";

/// Synonymes acceptés pour chaque table (tag normalisé par [`fold_tag`])
const TABLE_SYNONYMS: &[(&str, &str)] = &[
    ("trees", TREE_TABLE),
    ("arboles", TREE_TABLE),
    ("segments", SEGMENT_TABLE),
    ("segmentos", SEGMENT_TABLE),
    ("polygons", POLYGON_TABLE),
    ("poligonos", POLYGON_TABLE),
];

/// Minuscules sans accents : `Polígonos` → `poligonos`
fn fold_tag(tag: &str) -> String {
    tag.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

/// Un projet : sélectionner un projet réinitialise tout l'état des couches
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Construit un projet depuis une ligne `proyectos (id, nombre)`
    pub fn from_record(record: &RawRecord) -> Option<Self> {
        let id = fields::scalar_text(record.get("id")?)?;
        let name = ["nombre", "name"]
            .iter()
            .find_map(|key| record.get(*key).and_then(fields::scalar_text))
            .unwrap_or_else(|| id.clone());
        Some(Self { id, name })
    }
}

/// Une couche d'un projet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layer {
    /// Identifiant physique (valeur du filtre `id_capa`)
    pub id: String,

    /// Nom affiché
    pub name: String,

    /// Tag de type tel que saisi par l'utilisateur
    pub kind: LayerKind,
}

impl Layer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: LayerKind::new(kind),
        }
    }

    /// Construit une couche depuis une ligne `capas (id, nombre, tipo)`
    pub fn from_record(record: &RawRecord) -> Option<Self> {
        let id = fields::scalar_text(record.get("id")?)?;
        let name = ["nombre", "name"]
            .iter()
            .find_map(|key| record.get(*key).and_then(fields::scalar_text))
            .unwrap_or_else(|| id.clone());
        let kind = ["tipo", "kind", "type"]
            .iter()
            .find_map(|key| record.get(*key).and_then(fields::scalar_text))
            .unwrap_or_default();
        Some(Self::new(id, name, kind))
    }
}

/// Tag de type d'une couche (`tree`, `segment`, `polygon`, ou autre)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LayerKind(String);

impl LayerKind {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Tag brut
    pub fn tag(&self) -> &str {
        &self.0
    }

    /// Nom de table normalisé (insensible à la casse et aux accents, synonymes locaux acceptés)
    pub fn table(&self) -> String {
        let folded = fold_tag(&self.0);
        TABLE_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == folded)
            .map(|(_, table)| (*table).to_string())
            .unwrap_or(folded)
    }

    /// Couche d'arbres : ponctuelle, éligible au clustering
    pub fn is_point_like(&self) -> bool {
        self.table() == TREE_TABLE
    }

    pub fn is_line_like(&self) -> bool {
        let folded = fold_tag(&self.0);
        ["segment", "line", "camino"]
            .iter()
            .any(|needle| folded.contains(needle))
    }

    pub fn is_polygon_like(&self) -> bool {
        let folded = fold_tag(&self.0);
        folded.contains("poly") || folded.contains("poligono")
    }
}

impl std::fmt::Display for LayerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Géométrie canonique, toujours en ordre (longitude, latitude)
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    /// Anneau unique, fermé implicitement
    Polygon(Polygon),
}

impl Geometry {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::LineString(_) => "LineString",
            Self::Polygon(_) => "Polygon",
        }
    }

    /// Sommets distincts, sans le point de fermeture des polygones
    pub fn vertices(&self) -> Vec<Coord> {
        match self {
            Self::Point(p) => vec![p.0],
            Self::LineString(ls) => ls.0.clone(),
            Self::Polygon(poly) => {
                let ring = &poly.exterior().0;
                let open = if ring.len() > 1 && ring.first() == ring.last() {
                    ring.len() - 1
                } else {
                    ring.len()
                };
                ring[..open].to_vec()
            }
        }
    }

    /// Géométrie de longueur nulle après canonicalisation
    pub fn is_degenerate(&self) -> bool {
        let finite = self
            .vertices()
            .iter()
            .all(|c| c.x.is_finite() && c.y.is_finite());
        if !finite {
            return true;
        }
        match self {
            Self::Point(_) => false,
            Self::LineString(ls) => ls.0.len() < 2 || ls.euclidean_length() == 0.0,
            Self::Polygon(poly) => self.vertices().len() < 3 || poly.unsigned_area() == 0.0,
        }
    }

    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Self::Point(p) => Some(p.bounding_rect()),
            Self::LineString(ls) => ls.bounding_rect(),
            Self::Polygon(poly) => poly.bounding_rect(),
        }
    }

    pub fn to_geo(&self) -> geo::Geometry {
        match self {
            Self::Point(p) => geo::Geometry::Point(*p),
            Self::LineString(ls) => geo::Geometry::LineString(ls.clone()),
            Self::Polygon(poly) => geo::Geometry::Polygon(poly.clone()),
        }
    }
}
