//! Vector similarity helpers shared by the lexical and semantic scorers.

use std::cmp::Ordering;

/// Cosine similarity with the denominator floored to 1.
///
/// Slots missing from the shorter vector read as zero. An all-zero operand
/// scores 0 rather than NaN.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().max(b.len());
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for idx in 0..len {
        let x = a.get(idx).copied().unwrap_or(0.0);
        let y = b.get(idx).copied().unwrap_or(0.0);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    dot / if denom == 0.0 { 1.0 } else { denom }
}

pub fn l2_norm(vec: &[f32]) -> f32 {
    vec.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Divide by the L2 norm; a zero vector stays zero.
pub fn l2_normalize(vec: &mut [f32]) {
    let norm = l2_norm(vec);
    let norm = if norm == 0.0 { 1.0 } else { norm };
    for value in vec.iter_mut() {
        *value /= norm;
    }
}

/// Stable descending sort by score, then keep the first `top`.
pub fn rank_by_score<T>(results: &mut Vec<T>, top: usize, score: impl Fn(&T) -> f32) {
    results.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
    results.truncate(top);
}
