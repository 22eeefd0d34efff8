//! Sources de données : PostgreSQL (défaut) ou répertoire de fichiers JSON

pub mod json;
pub mod pool;
pub mod postgres;

use geolayers::{DataSource, LayerError, RawRecord};

pub use json::JsonDirSource;
pub use postgres::PgSource;

/// Source choisie à l'exécution
pub enum AnySource {
    Postgres(PgSource),
    Json(JsonDirSource),
}

impl AnySource {
    pub fn description(&self) -> String {
        match self {
            Self::Postgres(pg) => pg.description(),
            Self::Json(json) => format!("json:{}", json.dir().display()),
        }
    }
}

impl DataSource for AnySource {
    async fn query(
        &self,
        table: &str,
        filter: Option<(&str, &str)>,
    ) -> Result<Vec<RawRecord>, LayerError> {
        match self {
            Self::Postgres(pg) => pg.query(table, filter).await,
            Self::Json(json) => json.query(table, filter).await,
        }
    }
}
