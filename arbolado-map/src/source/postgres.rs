//! Source PostgreSQL : chaque ligne est relue en objet JSON via `row_to_json`

use std::sync::LazyLock;

use deadpool_postgres::Pool;
use geolayers::{DataSource, LayerError, RawRecord};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::pool::DatabaseConfig;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex is valid"));

/// Tables lues dans un schéma PostgreSQL
pub struct PgSource {
    pool: Pool,
    schema: Option<String>,
    description: String,
}

impl PgSource {
    pub fn new(pool: Pool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            schema: None,
            description: format!(
                "postgres://{}@{}:{}/{}",
                config.user, config.host, config.port, config.dbname
            ),
        }
    }

    /// Qualifie les tables par un schéma (défaut : `search_path`)
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn description(&self) -> String {
        self.description.clone()
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

fn check_identifier(table: &str, ident: &str) -> Result<(), LayerError> {
    if IDENTIFIER.is_match(ident) {
        Ok(())
    } else {
        Err(LayerError::data_access(
            table,
            format!("invalid identifier: {:?}", ident),
        ))
    }
}

/// Requête paramétrée ; la valeur du filtre est comparée en texte
pub(crate) fn build_query(
    schema: Option<&str>,
    table: &str,
    filter_field: Option<&str>,
) -> Result<String, LayerError> {
    check_identifier(table, table)?;
    let qualified = match schema {
        Some(schema) => {
            check_identifier(table, schema)?;
            format!("\"{}\".\"{}\"", schema, table)
        }
        None => format!("\"{}\"", table),
    };

    let mut sql = format!("SELECT row_to_json(t)::text FROM {} t", qualified);
    if let Some(field) = filter_field {
        check_identifier(table, field)?;
        sql.push_str(&format!(" WHERE t.\"{}\"::text = $1", field));
    }
    Ok(sql)
}

impl DataSource for PgSource {
    async fn query(
        &self,
        table: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<RawRecord>, LayerError> {
        let sql = build_query(self.schema.as_deref(), table, filter.map(|(field, _)| field))?;

        let client = self
            .pool
            .get()
            .await
            .map_err(|e| LayerError::data_access(table, e.to_string()))?;

        let rows = match filter {
            Some((_, value)) => client.query(&sql, &[&value]).await,
            None => client.query(&sql, &[]).await,
        }
        .map_err(|e| LayerError::data_access(table, e.to_string()))?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let text: String = row
                .try_get(0)
                .map_err(|e| LayerError::data_access(table, e.to_string()))?;
            match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => records.push(map),
                Ok(other) => {
                    return Err(LayerError::invalid_record(
                        table,
                        format!("expected object, got {}", other),
                    ))
                }
                Err(e) => return Err(LayerError::invalid_record(table, e.to_string())),
            }
        }

        debug!(table, rows = records.len(), "PostgreSQL table queried");
        Ok(records)
    }
}
