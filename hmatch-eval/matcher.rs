use crate::error::{EvalError, EvalResult};
use hmatch_core::{BinaryDescriptor, DescriptorSet, DistanceMetric, Features, MatchCandidate, Neighbor};
use rayon::prelude::*;

/// Number of differing bits between two 256-bit descriptors
#[inline]
pub fn hamming_distance(a: &BinaryDescriptor, b: &BinaryDescriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(&x, &y)| (x ^ y).count_ones()).sum()
}

/// L2 norm of the difference (not squared)
#[inline]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Brute-force two nearest neighbors in `b` for every descriptor of `a`.
///
/// Candidates come back in query order. An empty `b` yields no candidates and a
/// single-descriptor `b` yields candidates without a second neighbor.
pub fn knn2(a: &Features, b: &Features, metric: DistanceMetric) -> EvalResult<Vec<MatchCandidate>> {
    match (metric, a.descriptors(), b.descriptors()) {
        (DistanceMetric::Hamming, DescriptorSet::Binary(query), DescriptorSet::Binary(train)) => {
            Ok(nearest_two(a, b, |i, j| hamming_distance(&query[i], &train[j]) as f32))
        }
        (
            DistanceMetric::Euclidean,
            DescriptorSet::Float { dim: query_dim, data: query },
            DescriptorSet::Float { dim: train_dim, data: train },
        ) => {
            if query_dim != train_dim {
                return Err(EvalError::DimensionMismatch {
                    query: *query_dim,
                    train: *train_dim,
                });
            }
            let query: Vec<&[f32]> = query.chunks_exact(*query_dim).collect();
            let train: Vec<&[f32]> = train.chunks_exact(*train_dim).collect();
            Ok(nearest_two(a, b, |i, j| euclidean_distance(query[i], train[j])))
        }
        (DistanceMetric::Hamming, _, _) => Err(EvalError::MetricMismatch {
            metric,
            descriptors: "float",
        }),
        (DistanceMetric::Euclidean, _, _) => Err(EvalError::MetricMismatch {
            metric,
            descriptors: "binary",
        }),
    }
}

fn nearest_two<F>(a: &Features, b: &Features, distance: F) -> Vec<MatchCandidate>
where
    F: Fn(usize, usize) -> f32 + Sync,
{
    if b.is_empty() {
        return Vec::new();
    }

    (0..a.len())
        .into_par_iter()
        .map(|i| {
            let mut best = (0usize, distance(i, 0));
            let mut second: Option<(usize, f32)> = None;

            for j in 1..b.len() {
                let d = distance(i, j);
                // strict comparisons keep the lower train index on ties
                if d < best.1 {
                    second = Some(best);
                    best = (j, d);
                } else if second.is_none_or(|(_, sd)| d < sd) {
                    second = Some((j, d));
                }
            }

            let neighbor = |(index, distance): (usize, f32)| Neighbor {
                index,
                point: b.point(index),
                distance,
            };
            MatchCandidate {
                query_index: i,
                query: a.point(i),
                best: neighbor(best),
                second: second.map(neighbor),
            }
        })
        .collect()
}
