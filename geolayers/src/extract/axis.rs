//! Stratégies de désambiguïsation de l'ordre des axes
//!
//! L'heuristique par magnitude est régionale : elle suppose que |latitude| <
//! |longitude| dans la zone de déploiement (Cône Sud). Ce n'est pas une règle
//! SIG générale. Pour |v1| == |v2| le couple est gardé tel quel ; le résultat
//! n'est pas garanti au voisinage de l'équateur et du méridien d'origine.

use geo::Coord;
use serde::{Deserialize, Serialize};

/// Stratégie d'ordre des axes, choisie par déploiement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisStrategy {
    /// La plus petite magnitude est la latitude
    #[default]
    Magnitude,
    /// Les couples sont déjà en (longitude, latitude)
    LonLat,
    /// Les couples sont en (latitude, longitude)
    LatLon,
}

impl AxisStrategy {
    /// Convertit un couple brut en coordonnée canonique (x = lon, y = lat)
    pub fn apply(self, v1: f64, v2: f64) -> Coord {
        match self {
            Self::Magnitude => magnitude_heuristic(v1, v2),
            Self::LonLat => Coord { x: v1, y: v2 },
            Self::LatLon => Coord { x: v2, y: v1 },
        }
    }
}

/// Si |v1| < |v2|, v1 est la latitude ; sinon le couple est déjà (lon, lat)
pub fn magnitude_heuristic(v1: f64, v2: f64) -> Coord {
    if v1.abs() < v2.abs() {
        Coord { x: v2, y: v1 }
    } else {
        Coord { x: v1, y: v2 }
    }
}
