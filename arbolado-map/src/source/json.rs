//! Source JSON : un fichier `<table>.json` (tableau d'objets) par table

use std::path::{Path, PathBuf};

use geolayers::fields::display_value;
use geolayers::{DataSource, LayerError, RawRecord};
use serde_json::Value;
use tracing::debug;

/// Répertoire de tables exportées en JSON
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_table(&self, table: &str) -> Result<Vec<RawRecord>, LayerError> {
        let path = self.dir.join(format!("{}.json", table));
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LayerError::data_access(table, format!("{}: {}", path.display(), e)))?;

        let rows: Vec<Value> = serde_json::from_str(&content)
            .map_err(|e| LayerError::invalid_record(table, e.to_string()))?;

        rows.into_iter()
            .map(|row| match row {
                Value::Object(map) => Ok(map),
                other => Err(LayerError::invalid_record(
                    table,
                    format!("expected object, got {}", other),
                )),
            })
            .collect()
    }
}

impl DataSource for JsonDirSource {
    async fn query(
        &self,
        table: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<RawRecord>, LayerError> {
        let rows = self.read_table(table).await?;
        let total = rows.len();

        let rows: Vec<RawRecord> = match filter {
            None => rows,
            Some((field, value)) => rows
                .into_iter()
                .filter(|row| {
                    row.get(field)
                        .filter(|v| !v.is_null())
                        .is_some_and(|v| display_value(v) == value)
                })
                .collect(),
        };

        debug!(table, total, matched = rows.len(), "JSON table queried");
        Ok(rows)
    }
}
