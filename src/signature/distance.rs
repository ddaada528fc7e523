//! Signature distance metric with configurable term weights

use crate::io::configuration::{DEFAULT_COLOR_WEIGHT, DEFAULT_STRUCTURE_WEIGHT};
use crate::signature::extractor::Signature;

/// Weights of the color and structure terms in signature distance
///
/// The metric is documented policy, not fixed algorithmic fact: callers may
/// tune the balance between matching average color and matching coarse
/// luminance structure.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DistanceWeights {
    /// Weight of the Lab Euclidean color term
    pub color: f64,
    /// Weight of the block-luminance Euclidean structure term
    pub structure: f64,
}

impl Default for DistanceWeights {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR_WEIGHT,
            structure: DEFAULT_STRUCTURE_WEIGHT,
        }
    }
}

/// Weighted visual distance between two signatures
///
/// Zero if and only if both terms are zero; in particular
/// `distance(s, s, w) == 0` for every signature `s`.
pub fn distance(a: &Signature, b: &Signature, weights: &DistanceWeights) -> f64 {
    let color_sq: f64 = a
        .lab
        .iter()
        .zip(b.lab.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();

    let structure_sq: f64 = a
        .luma_blocks
        .iter()
        .zip(b.luma_blocks.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();

    weights.color * color_sq.sqrt() + weights.structure * structure_sq.sqrt()
}
