use hmatch_core::{Correspondence, MatchCandidate};

/// Lowe's ratio test on raw distances.
///
/// Accepts iff `best < ratio * second`. A missing or zero second distance
/// rejects, as does any non-finite distance.
#[inline]
pub fn passes_ratio_test(best: f32, second: Option<f32>, ratio: f32) -> bool {
    match second {
        Some(second) if best.is_finite() && second.is_finite() && second > 0.0 => {
            best < ratio * second
        }
        _ => false,
    }
}

/// Keep the candidates whose best neighbor is distinctive enough, in input order
pub fn nndr_filter(candidates: &[MatchCandidate], ratio: f32) -> Vec<Correspondence> {
    candidates
        .iter()
        .filter(|c| passes_ratio_test(c.best.distance, c.second.map(|s| s.distance), ratio))
        .map(|c| Correspondence {
            query_index: c.query_index,
            train_index: c.best.index,
            a: c.query,
            b: c.best.point,
        })
        .collect()
}
