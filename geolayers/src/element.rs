//! Construction des éléments rendus : primitive visuelle + panneau d'info + identité

use geo::{BoundingRect, LineString, Point, Polygon, Rect};
use serde::Serialize;
use tracing::trace;

use crate::extract::GeometryExtractor;
use crate::style::{MarkerStyle, PathStyle, StatusClass, StyleResolver};
use crate::types::{Geometry, Layer, RawRecord};

/// Primitive visuelle posée sur la carte
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Marqueur circulaire (points)
    Marker { position: Point, style: MarkerStyle },
    /// Polyligne
    Path { line: LineString, style: PathStyle },
    /// Polygone rempli
    Area { polygon: Polygon, style: PathStyle },
}

impl Primitive {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Marker { .. } => "marker",
            Self::Path { .. } => "path",
            Self::Area { .. } => "area",
        }
    }

    pub fn geometry(&self) -> geo::Geometry {
        match self {
            Self::Marker { position, .. } => geo::Geometry::Point(*position),
            Self::Path { line, .. } => geo::Geometry::LineString(line.clone()),
            Self::Area { polygon, .. } => geo::Geometry::Polygon(polygon.clone()),
        }
    }

    pub fn bounding_rect(&self) -> Option<Rect> {
        match self {
            Self::Marker { position, .. } => Some(position.bounding_rect()),
            Self::Path { line, .. } => line.bounding_rect(),
            Self::Area { polygon, .. } => polygon.bounding_rect(),
        }
    }

    /// Couleur de remplissage d'un marqueur (lue par l'agrégation en clusters)
    pub fn marker_fill(&self) -> Option<&str> {
        match self {
            Self::Marker { style, .. } => Some(&style.fill_color),
            _ => None,
        }
    }
}

/// Contenu du popup associé à un élément
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoPanel {
    pub title: String,
    pub status: Option<String>,
    pub source_id: Option<String>,
}

impl InfoPanel {
    pub fn to_html(&self) -> String {
        let mut html = format!("<b>{}</b>", escape_html(&self.title));
        if let Some(status) = &self.status {
            html.push_str(&format!("<br><b>Condición:</b> {}", escape_html(status)));
        }
        if let Some(id) = &self.source_id {
            html.push_str(&format!("<br>ID: {}", escape_html(id)));
        }
        html
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Représentation rendue d'un enregistrement dans une couche
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// `<layer id>-<index>` : stable pour un chargement, pas entre rechargements
    pub id: String,

    /// Position de l'enregistrement dans la réponse de la source
    pub index: usize,

    pub name: String,

    pub layer_id: String,

    pub status: StatusClass,

    pub popup: InfoPanel,

    pub primitive: Primitive,

    /// Enregistrement d'origine, conservé pour le détail
    pub record: RawRecord,
}

/// Raison pour laquelle un enregistrement ne produit pas d'élément
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoGeometry,
    DegenerateGeometry,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoGeometry => f.write_str("no usable geometry"),
            Self::DegenerateGeometry => f.write_str("degenerate geometry"),
        }
    }
}

#[derive(Debug)]
pub enum BuildOutcome {
    Built(Box<Element>),
    Skipped(SkipReason),
}

/// Combine extraction de géométrie et résolution de style
#[derive(Debug, Clone, Default)]
pub struct ElementBuilder {
    extractor: GeometryExtractor,
    resolver: StyleResolver,
}

impl ElementBuilder {
    pub fn new(extractor: GeometryExtractor, resolver: StyleResolver) -> Self {
        Self {
            extractor,
            resolver,
        }
    }

    pub fn resolver(&self) -> &StyleResolver {
        &self.resolver
    }

    pub fn element_id(layer_id: &str, index: usize) -> String {
        format!("{}-{}", layer_id, index)
    }

    /// Ne panique jamais : nom, condition et id ont tous une valeur par défaut
    pub fn build(&self, layer: &Layer, index: usize, record: RawRecord) -> BuildOutcome {
        let Some(geometry) = self.extractor.extract(&record, &layer.kind) else {
            return BuildOutcome::Skipped(SkipReason::NoGeometry);
        };
        if geometry.is_degenerate() {
            return BuildOutcome::Skipped(SkipReason::DegenerateGeometry);
        }

        let catalog = self.extractor.catalog();
        let id = Self::element_id(&layer.id, index);
        let name = catalog
            .name(&record)
            .unwrap_or_else(|| format!("{} {}", layer.kind, index + 1));
        let status_text = catalog.status(&record);
        let status = self.resolver.classify(status_text.as_deref());

        let primitive = match geometry {
            Geometry::Point(position) => Primitive::Marker {
                position,
                style: self.resolver.marker_style(status),
            },
            Geometry::LineString(line) => Primitive::Path {
                line,
                style: self.resolver.path_style(&layer.kind),
            },
            Geometry::Polygon(polygon) => Primitive::Area {
                polygon,
                style: self.resolver.path_style(&layer.kind),
            },
        };

        let popup = InfoPanel {
            title: name.clone(),
            status: status_text,
            source_id: catalog.source_id(&record),
        };

        trace!(element_id = %id, status = ?status, primitive = primitive.kind_name(), "Element built");

        BuildOutcome::Built(Box::new(Element {
            id,
            index,
            name,
            layer_id: layer.id.clone(),
            status,
            popup,
            primitive,
            record,
        }))
    }
}
