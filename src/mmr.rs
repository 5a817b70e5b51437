//! Maximal Marginal Relevance.
//!
//! Picks results that are relevant to the query but not redundant with each
//! other:
//! MMR = λ × sim(query, c) - (1 - λ) × max(sim(c, selected))
//!
//! λ = 1.0 is plain relevance ranking, λ = 0.0 is pure diversity.

pub const DEFAULT_LAMBDA: f32 = 0.5;
pub const DEFAULT_FETCH_K: usize = 20;

pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = magnitude(a) * magnitude(b);
    if denom == 0.0 {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>() / denom
}

/// Returns positions into `candidates`, in selection order.
///
/// The first pick is always the candidate most similar to the query.
pub fn maximal_marginal_relevance(
    query: &[f32],
    candidates: &[Vec<f32>],
    k: usize,
    lambda: f32,
) -> Vec<usize> {
    if candidates.is_empty() || k == 0 {
        return Vec::new();
    }
    let k = k.min(candidates.len());

    let relevance: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(query, c))
        .collect();

    let mut selected = Vec::with_capacity(k);
    selected.push(argmax(&relevance));

    // max similarity of each candidate to anything already selected
    let mut redundancy: Vec<f32> = candidates
        .iter()
        .map(|c| cosine_similarity(c, &candidates[selected[0]]))
        .collect();

    while selected.len() < k {
        let mut best_idx = None;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, rel) in relevance.iter().enumerate() {
            if selected.contains(&idx) {
                continue;
            }
            let score = lambda * rel - (1.0 - lambda) * redundancy[idx];
            if score > best_score {
                best_score = score;
                best_idx = Some(idx);
            }
        }

        let Some(best) = best_idx else {
            break;
        };
        selected.push(best);
        for (idx, c) in candidates.iter().enumerate() {
            let sim = cosine_similarity(c, &candidates[best]);
            if sim > redundancy[idx] {
                redundancy[idx] = sim;
            }
        }
    }

    selected
}

fn argmax(values: &[f32]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_candidates() {
        assert!(maximal_marginal_relevance(&[1.0, 0.0], &[], 3, 0.5).is_empty());
    }

    #[test]
    fn k_zero() {
        let c = vec![vec![1.0, 0.0]];
        assert!(maximal_marginal_relevance(&[1.0, 0.0], &c, 0, 0.5).is_empty());
    }

    #[test]
    fn k_larger_than_candidates() {
        let c = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(maximal_marginal_relevance(&[1.0, 0.0], &c, 10, 0.5).len(), 2);
    }

    #[test]
    fn pure_relevance_preserves_order() {
        let query = [1.0, 0.0];
        let c = vec![vec![0.5, 0.5], vec![0.9, 0.1], vec![0.88, 0.12]];
        let picked = maximal_marginal_relevance(&query, &c, 3, 1.0);
        assert_eq!(picked, vec![1, 2, 0]);
    }

    #[test]
    fn prefers_diverse_result_over_near_duplicate() {
        let query = [1.0, 0.0, 0.0];
        let c = vec![
            vec![0.9, 0.436, 0.0],
            vec![0.9, 0.436, 0.01],
            vec![0.8, -0.6, 0.0],
        ];
        let picked = maximal_marginal_relevance(&query, &c, 2, DEFAULT_LAMBDA);
        assert_eq!(picked, vec![0, 2]);
    }

    #[test]
    fn identical_vectors_still_fill_k() {
        let c = vec![vec![1.0, 0.0]; 3];
        let picked = maximal_marginal_relevance(&[1.0, 0.0], &c, 3, 0.5);
        assert_eq!(picked.len(), 3);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
