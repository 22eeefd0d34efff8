//! Export des primitives visibles en GeoJSON avec geozero

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geolayers::{Element, Layer, Primitive, Session};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;
use serde_json::{json, Value};

use crate::surface::SnapshotSurface;

/// Écrit les primitives posées sur la surface dans un fichier GeoJSON
///
/// Retourne le nombre de features écrites.
pub fn export_to_geojson(session: &Session<SnapshotSurface>, output_path: &Path) -> Result<usize> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    let written = write_feature_collection(session, &mut writer)?;
    writer.flush()?;
    Ok(written)
}

/// FeatureCollection des éléments visibles, couche par couche dans l'ordre
/// de la source puis par position d'enregistrement
pub fn write_feature_collection<W: Write>(
    session: &Session<SnapshotSurface>,
    writer: &mut W,
) -> Result<usize> {
    write!(writer, r#"{{"type":"FeatureCollection","features":["#)?;

    let surface = session.surface();
    let mut written = 0;
    for layer in session.layers() {
        let Some(elements) = session.registry().get_elements(&layer.id) else {
            continue;
        };
        for element in elements {
            if !surface.is_shown(&layer.id, &element.id) {
                continue;
            }
            if written > 0 {
                write!(writer, ",")?;
            }
            write_feature(writer, layer, element)?;
            written += 1;
        }
    }

    write!(writer, "]}}")?;
    Ok(written)
}

fn write_feature<W: Write>(writer: &mut W, layer: &Layer, element: &Element) -> Result<()> {
    write!(writer, r#"{{"type":"Feature","id":{},"#, Value::from(element.id.as_str()))?;

    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    element.primitive.geometry().process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    write!(writer, r#","properties":"#)?;
    serde_json::to_writer(&mut *writer, &properties(layer, element))?;
    write!(writer, "}}")?;

    Ok(())
}

fn properties(layer: &Layer, element: &Element) -> Value {
    let style = match &element.primitive {
        Primitive::Marker { style, .. } => serde_json::to_value(style),
        Primitive::Path { style, .. } | Primitive::Area { style, .. } => {
            serde_json::to_value(style)
        }
    }
    .unwrap_or(Value::Null);

    json!({
        "layer_id": layer.id,
        "layer_name": layer.name,
        "name": element.name,
        "status": element.status,
        "condition": element.popup.status,
        "source_id": element.popup.source_id,
        "popup": element.popup.to_html(),
        "primitive": element.primitive.kind_name(),
        "style": style,
    })
}
