//! Types d'erreurs pour le crate geolayers

use thiserror::Error;

/// Erreurs pouvant survenir lors du chargement des couches
///
/// L'absence de géométrie exploitable n'est pas une erreur : elle est
/// représentée par [`crate::element::SkipReason`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LayerError {
    /// Échec de la source de données (requête, connexion)
    #[error("Data access error on {table}: {reason}")]
    DataAccess { table: String, reason: String },

    /// Enregistrement illisible renvoyé par la source
    #[error("Invalid record in {table}: {reason}")]
    InvalidRecord { table: String, reason: String },

    /// Couche inconnue dans le projet actif
    #[error("Unknown layer: {0}")]
    UnknownLayer(String),
}

impl LayerError {
    /// Crée une erreur d'accès aux données avec contexte
    pub fn data_access(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataAccess {
            table: table.into(),
            reason: reason.into(),
        }
    }

    /// Crée une erreur d'enregistrement invalide
    pub fn invalid_record(table: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            table: table.into(),
            reason: reason.into(),
        }
    }
}
