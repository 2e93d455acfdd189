//! Anchor resolver — top-K anchors with softmax confidence weights.

use crate::embedding::{dot, normalize};

/// Resolve the `top_k` nearest anchors for an embedding.
///
/// Cosine similarity against every centroid, stable sort descending
/// (ties fall back to anchor declaration order), then a numerically
/// stable softmax over the selected scores so the returned weights are
/// positive and sum to 1. `top_k` is clamped to the number of anchors.
pub fn resolve(
    embedding: &[f32],
    centroids: &[(String, Vec<f32>)],
    top_k: usize,
) -> Vec<(String, f32)> {
    let v = normalize(embedding);

    let mut scores: Vec<(usize, f32)> = centroids
        .iter()
        .enumerate()
        .map(|(i, (_, c))| (i, dot(&v, c)))
        .collect();
    scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let k = top_k.min(scores.len());
    let top = &scores[..k];

    let weights = softmax(&top.iter().map(|&(_, s)| s).collect::<Vec<f32>>());
    top.iter()
        .zip(weights)
        .map(|(&(i, _), w)| (centroids[i].0.clone(), w))
        .collect()
}

/// Softmax with max-subtraction for numeric stability.
fn softmax(scores: &[f32]) -> Vec<f32> {
    if scores.is_empty() {
        return Vec::new();
    }
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = scores.iter().map(|&s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    let sum = if sum > 0.0 { sum } else { 1.0 };
    exps.iter().map(|&e| e / sum).collect()
}
