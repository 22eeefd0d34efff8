//! Interface de la source de données externe

use tracing::warn;

use crate::types::{Layer, Project, RawRecord};
use crate::LayerError;

/// Table des projets `(id, nombre)`
pub const PROJECT_TABLE: &str = "proyectos";
/// Table des couches `(id, nombre, tipo, id_proyecto)`
pub const LAYER_TABLE: &str = "capas";
pub const PROJECT_FILTER_FIELD: &str = "id_proyecto";
/// Champ de filtre des enregistrements d'une couche
pub const LAYER_FILTER_FIELD: &str = "id_capa";

/// Source d'enregistrements bruts, interrogée une fois par couche
///
/// Les requêtes sont asynchrones et peuvent se terminer dans n'importe quel
/// ordre ; aucun délai d'expiration n'est imposé ici.
#[allow(async_fn_in_trait)]
pub trait DataSource {
    /// `SELECT * FROM table [WHERE field = value]`
    async fn query(
        &self,
        table: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<RawRecord>, LayerError>;

    async fn projects(&self) -> Result<Vec<Project>, LayerError> {
        let rows = self.query(PROJECT_TABLE, None).await?;
        Ok(parse_rows(PROJECT_TABLE, &rows, Project::from_record))
    }

    async fn layers(&self, project_id: &str) -> Result<Vec<Layer>, LayerError> {
        let rows = self
            .query(LAYER_TABLE, Some((PROJECT_FILTER_FIELD, project_id)))
            .await?;
        Ok(parse_rows(LAYER_TABLE, &rows, Layer::from_record))
    }

    /// Enregistrements d'une couche, depuis la table déduite de son type
    async fn layer_records(&self, layer: &Layer) -> Result<Vec<RawRecord>, LayerError> {
        self.query(&layer.kind.table(), Some((LAYER_FILTER_FIELD, &layer.id)))
            .await
    }
}

fn parse_rows<T>(table: &str, rows: &[RawRecord], parse: impl Fn(&RawRecord) -> Option<T>) -> Vec<T> {
    rows.iter()
        .filter_map(|row| {
            let parsed = parse(row);
            if parsed.is_none() {
                warn!(table, "Row without id ignored");
            }
            parsed
        })
        .collect()
}
