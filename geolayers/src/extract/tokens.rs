//! Extraction universelle des nombres d'un champ géométrique

use std::sync::LazyLock;

use geo::Coord;
use regex::Regex;

use super::axis::AxisStrategy;

/// Décimal ou entier, signé
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+\.\d+|-?\d+").expect("static regex is valid"));

/// Tous les nombres du texte, dans l'ordre d'apparition
pub fn numeric_tokens(text: &str) -> Vec<f64> {
    NUMBER
        .find_iter(text)
        .filter_map(|m| fast_float::parse::<f64, _>(m.as_str()).ok())
        .collect()
}

/// Apparie les nombres consécutifs ; un nombre final orphelin est ignoré
pub fn pair_tokens(tokens: &[f64], axis: AxisStrategy) -> Vec<Coord> {
    tokens
        .chunks_exact(2)
        .map(|pair| axis.apply(pair[0], pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_from_wkt() {
        let tokens = numeric_tokens("LINESTRING(-58.4 -34.6, -58 -34)");
        assert_eq!(tokens, vec![-58.4, -34.6, -58.0, -34.0]);
    }

    #[test]
    fn test_tokens_from_json() {
        let tokens = numeric_tokens(r#"{"paths":[[[-60.1,-36.2],[-60.3,-36.4]]]}"#);
        assert_eq!(tokens, vec![-60.1, -36.2, -60.3, -36.4]);
    }

    #[test]
    fn test_trailing_token_dropped() {
        let coords = pair_tokens(&[-60.1, -36.2, 5.0], AxisStrategy::Magnitude);
        assert_eq!(coords.len(), 1);
    }

    #[test]
    fn test_no_tokens() {
        assert!(numeric_tokens("POINT EMPTY").is_empty());
        assert!(pair_tokens(&[], AxisStrategy::Magnitude).is_empty());
    }
}
